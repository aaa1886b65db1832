//! Represents the gallery document and the items it lists.

use crate::services::reconcile::Keyed;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The whole `gallery.json` document.
///
/// Only `items` is interpreted. Any other top-level fields are carried
/// through untouched so a read-modify-write cycle does not lose them. They
/// keep their relative order but are always written after `items`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<GalleryItem>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Gallery {
    pub fn new(items: Vec<GalleryItem>) -> Self {
        Self {
            items,
            extra: Map::new(),
        }
    }
}

/// One visual artifact shown on the site.
///
/// `id` is the stable external identifier and must be unique within a
/// gallery. Everything else is free-form; `created` and `cdn_url` are the
/// fields rewritten in place by date sync and image migration.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GalleryItem {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,

    #[serde(default, deserialize_with = "nullable")]
    pub source: String,

    #[serde(default, deserialize_with = "nullable")]
    pub model: String,

    /// Job page URL.
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,

    /// Where the image itself is served from.
    #[serde(default, deserialize_with = "nullable")]
    pub cdn_url: String,

    #[serde(default, deserialize_with = "nullable")]
    pub prompt: String,

    #[serde(default, deserialize_with = "nullable")]
    pub parameters: String,

    /// Aspect ratio label such as "3:2".
    #[serde(default, deserialize_with = "nullable")]
    pub dimensions: String,

    /// ISO date (`YYYY-MM-DD`).
    #[serde(default, deserialize_with = "nullable")]
    pub created: String,

    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,

    /// Fields this tool does not know about, kept in their original order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for GalleryItem {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Older rebuilds wrote `null` for empty database columns; read those back
/// as the empty value instead of rejecting the whole file.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fields_read_as_empty() {
        let raw = r#"{"id": "abc", "cdn_url": null, "tags": null}"#;
        let item: GalleryItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id, "abc");
        assert_eq!(item.cdn_url, "");
        assert!(item.tags.is_empty());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = r#"{"id": "abc", "featured": true, "type": "image"}"#;
        let item: GalleryItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.kind, "image");
        assert_eq!(item.extra.get("featured"), Some(&Value::Bool(true)));

        let written = serde_json::to_value(&item).unwrap();
        assert_eq!(written["featured"], Value::Bool(true));
        assert_eq!(written["type"], Value::String("image".into()));
    }
}
