//! Keyword-based tagging of prompts.
//!
//! A fixed rule table: each label owns a keyword set and is attached when any
//! keyword occurs in the prompt (case-insensitive substring match). Rules are
//! independent of each other.

/// Label assigned when no rule matches.
pub const FALLBACK_TAG: &str = "general";

/// `(label, keywords)` in the order labels are emitted.
pub const CATEGORY_RULES: &[(&str, &[&str])] = &[
    // subject
    ("portrait", &["portrait", "face", "headshot"]),
    ("woman", &["woman", "female", "girl"]),
    ("man", &["man", "male", "boy"]),
    // style
    ("cinematic", &["cinematic", "film", "movie"]),
    ("fantasy", &["fantasy", "magic", "dragon"]),
    ("noir", &["noir", "dark", "shadow"]),
    ("comic", &["comic", "graphic novel", "illustration"]),
    ("photorealistic", &["photorealistic", "realistic", "photo"]),
];

/// Tags for a prompt; never empty.
pub fn categorize_prompt(prompt: &str) -> Vec<String> {
    let lowered = prompt.to_lowercase();
    let mut tags: Vec<String> = CATEGORY_RULES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(label, _)| label.to_string())
        .collect();

    if tags.is_empty() {
        tags.push(FALLBACK_TAG.to_string());
    }
    tags
}
