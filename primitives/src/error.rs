//! Error taxonomy for the value codec.
//!
//! `UnsupportedType` and `DecodeFailure` are the two codec-level failure
//! classes that can surface at the boundary. Both carry enough context to
//! name the offending type or the malformed payload.

use thiserror::Error;

/// Errors produced while storing or loading boundary values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A value (or a requested kind) has no rule in the store/load tables.
    #[error("unsupported type {kind}: {context}")]
    UnsupportedType { kind: String, context: String },

    /// Bytes did not match the expected structured or object shape.
    #[error("failed to decode {expected}: {reason}")]
    DecodeFailure { expected: String, reason: String },

    /// The memory bridge could not allocate.
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// A text region did not hold valid UTF-8.
    #[error("region is not valid UTF-8")]
    Utf8,
}

impl CodecError {
    /// Build an `UnsupportedType` error.
    pub fn unsupported(kind: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnsupportedType {
            kind: kind.into(),
            context: context.into(),
        }
    }

    /// Build a `DecodeFailure` error.
    pub fn decode(expected: impl Into<String>, reason: impl ToString) -> Self {
        Self::DecodeFailure {
            expected: expected.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for `DecodeFailure`.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::DecodeFailure { .. })
    }

    /// Returns true for `UnsupportedType`.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }
}

/// Convenience result type for the codec.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display_names_kind() {
        let err = CodecError::unsupported("text", "raw passthrough");
        let s = err.to_string();
        assert!(s.contains("text"));
        assert!(s.contains("raw passthrough"));
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_decode_failure_display() {
        let err = CodecError::decode("mapping", "expected `{`");
        assert!(err.is_decode_failure());
        assert_eq!(err.to_string(), "failed to decode mapping: expected `{`");
    }
}
