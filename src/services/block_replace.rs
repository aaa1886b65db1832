//! Structural replacement of a named data block inside a larger text file.
//!
//! The target looks like `<head><marker>{ ... }<terminator?><tail>`. The
//! block is found by locating the marker, then balancing braces from the
//! first `{` after it. Braces inside double-quoted string literals are not
//! counted. Head and tail are carried through byte-for-byte.

use thiserror::Error;

const OPEN: u8 = b'{';
const CLOSE: u8 = b'}';
const QUOTE: u8 = b'"';
const ESCAPE: u8 = b'\\';
const TERMINATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("marker `{0}` not found in document")]
    MarkerNotFound(String),
    #[error("block after marker `{marker}` never closes (depth {depth} at end of document)")]
    UnbalancedBlock { marker: String, depth: i64 },
    #[error("replacement output is missing expected identifiers: {}", .0.join(", "))]
    MissingIdentifiers(Vec<String>),
}

/// Byte offsets of a located block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Start of the marker.
    pub start: usize,
    /// Position of the opening brace.
    pub open: usize,
    /// One past the matching closing brace.
    pub close: usize,
    /// One past the optional terminator; equals `close` when there is none.
    pub end: usize,
}

impl BlockSpan {
    pub fn terminated(&self) -> bool {
        self.end > self.close
    }
}

/// Locate the block that follows the first occurrence of `marker`.
pub fn locate_block(doc: &str, marker: &str) -> Result<BlockSpan, BlockError> {
    let start = doc
        .find(marker)
        .ok_or_else(|| BlockError::MarkerNotFound(marker.to_string()))?;
    let after_marker = start + marker.len();
    let unbalanced = |depth| BlockError::UnbalancedBlock {
        marker: marker.to_string(),
        depth,
    };

    let bytes = doc.as_bytes();
    let open = bytes[after_marker..]
        .iter()
        .position(|&b| b == OPEN)
        .map(|offset| after_marker + offset)
        .ok_or_else(|| unbalanced(0))?;

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut close = None;

    for (offset, &b) in bytes[open..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == ESCAPE {
                escaped = true;
            } else if b == QUOTE {
                in_string = false;
            }
            continue;
        }
        match b {
            QUOTE => in_string = true,
            OPEN => depth += 1,
            CLOSE => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let close = close.ok_or_else(|| unbalanced(depth))?;
    let end = if doc[close..].starts_with(TERMINATOR) {
        close + TERMINATOR.len_utf8()
    } else {
        close
    };

    Ok(BlockSpan {
        start,
        open,
        close,
        end,
    })
}

/// The block text (opening through closing brace) following `marker`.
pub fn extract_block<'a>(doc: &'a str, marker: &str) -> Result<&'a str, BlockError> {
    let span = locate_block(doc, marker)?;
    Ok(&doc[span.open..span.close])
}

/// A document split into the regions around its data block.
///
/// The regions are owned separately and only joined again by [`render`].
///
/// [`render`]: EmbeddedDocument::render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDocument {
    head: String,
    marker: String,
    block: String,
    terminated: bool,
    tail: String,
}

impl EmbeddedDocument {
    pub fn parse(doc: &str, marker: &str) -> Result<Self, BlockError> {
        let span = locate_block(doc, marker)?;
        Ok(Self {
            head: doc[..span.start].to_string(),
            marker: marker.to_string(),
            block: doc[span.open..span.close].to_string(),
            terminated: span.terminated(),
            tail: doc[span.end..].to_string(),
        })
    }

    pub fn block(&self) -> &str {
        &self.block
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Swap in an already-serialized payload.
    pub fn set_block(&mut self, payload: impl Into<String>) {
        self.block = payload.into();
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.head.len() + self.marker.len() + self.block.len() + 1 + self.tail.len(),
        );
        out.push_str(&self.head);
        out.push_str(&self.marker);
        out.push_str(&self.block);
        if self.terminated {
            out.push(TERMINATOR);
        }
        out.push_str(&self.tail);
        out
    }
}

/// Replace the block after `marker` with `payload`.
///
/// On error nothing is produced and the caller's document is untouched.
pub fn replace_block(doc: &str, marker: &str, payload: &str) -> Result<String, BlockError> {
    let mut parsed = EmbeddedDocument::parse(doc, marker)?;
    parsed.set_block(payload);
    Ok(parsed.render())
}

/// Check that every identifier in `expected` still appears in `doc`.
pub fn verify_identifiers(doc: &str, expected: &[&str]) -> Result<(), BlockError> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !doc.contains(*name))
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BlockError::MissingIdentifiers(missing))
    }
}
