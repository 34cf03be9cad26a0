//! Error types for resource resolution, fetching and decoding
//!
//! "Not found" is never an error here: lookups return `Ok(None)` or an empty
//! collection. The variants below are reserved for malformed data and
//! failures of the external fetch/decode collaborators.

use super::resource_type::ResourceKind;

/// Errors surfaced by the resolution engine
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Redirect chain through '{path}' exceeds the depth limit ({depth})")]
    RecursionLimitExceeded { path: String, depth: usize },

    #[error("Redirect loop detected: chain returned to '{path}'")]
    RecursionLoopDetected { path: String },

    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to fetch '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: ResourceKind,
        actual: ResourceKind,
    },
}

impl ResourceError {
    /// True for the two redirect-chain failures
    pub fn is_recursion(&self) -> bool {
        matches!(
            self,
            ResourceError::RecursionLimitExceeded { .. } | ResourceError::RecursionLoopDetected { .. }
        )
    }
}

/// Errors raised while turning bytes into a typed value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("No decoder registered for extension '{0}'")]
    UnknownExtension(String),

    #[error("No decoder installed for kind {0}")]
    NoDecoder(ResourceKind),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised by a byte source
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Not present in store: {0}")]
    Missing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursion_errors_are_flagged() {
        let limit = ResourceError::RecursionLimitExceeded {
            path: "a".to_string(),
            depth: 17,
        };
        let looped = ResourceError::RecursionLoopDetected {
            path: "a".to_string(),
        };
        let mismatch = ResourceError::KindMismatch {
            expected: ResourceKind::Text,
            actual: ResourceKind::Blob,
        };

        assert!(limit.is_recursion());
        assert!(looped.is_recursion());
        assert!(!mismatch.is_recursion());
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let err = ResourceError::Decode {
            path: "ui/logo".to_string(),
            source: DecodeError::InvalidData("bad header".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("ui/logo"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
