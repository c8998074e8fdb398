//! Shape errors raised while normalising raw niche values
//!
//! None of these ever leave a public parser. Each is logged where it is
//! absorbed and the parser degrades to literal text or to nothing.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    /// A string looked like JSON but did not decode
    #[error("Invalid embedded JSON ({reason}) in {preview:?}")]
    InvalidJson { reason: String, preview: String },

    /// Nested JSON-in-string decoding went deeper than allowed
    #[error("Embedded JSON nested {depth} levels deep, limit is {limit}")]
    DepthExceeded { depth: usize, limit: usize },

    /// A scalar that carries no niche text (booleans)
    #[error("Unsupported scalar {kind} where niche text was expected")]
    UnsupportedScalar { kind: &'static str },
}

impl ShapeError {
    const PREVIEW_CHARS: usize = 48;

    pub fn invalid_json(input: &str, err: &serde_json::Error) -> Self {
        let preview: String = input.chars().take(Self::PREVIEW_CHARS).collect();
        ShapeError::InvalidJson {
            reason: err.to_string(),
            preview,
        }
    }
}
