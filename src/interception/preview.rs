//! Bounded text previews of message bodies for logging.

use std::fmt;

/// Result of decoding a body for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedBody {
    /// UTF-8 text, truncated to the requested length.
    Text(String),
    /// Not valid UTF-8.
    Binary { reason: String },
}

/// Decode `bytes` as UTF-8 and keep at most `max_chars` characters.
pub fn decode_preview(bytes: &[u8], max_chars: usize) -> DecodedBody {
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedBody::Text(text.chars().take(max_chars).collect()),
        Err(e) => DecodedBody::Binary {
            reason: e.to_string(),
        },
    }
}

impl fmt::Display for DecodedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedBody::Text(text) => write!(f, "{text}"),
            DecodedBody::Binary { reason } => write!(f, "<binary data> ({reason})"),
        }
    }
}
