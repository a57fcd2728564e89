//! Error types for dynamic values
//!
//! Everything that can go wrong while building, checking or decoding a
//! [`DynamicValue`](crate::DynamicValue) ends up as a [`ValueError`].

/// Errors raised by the dynamic value model and by coercion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Payload does not conform to the declared type
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// JSON pointer of the offending element ("" for the root)
        path: String,
        /// Declared type
        expected: String,
        /// JSON kind actually found
        found: String,
    },

    /// Object payload attributes differ from the declared attribute set
    #[error("attribute mismatch at {path}: {detail}")]
    AttributeMismatch { path: String, detail: String },

    /// Tuple payload has the wrong number of elements
    #[error("tuple length mismatch at {path}: expected {expected}, found {found}")]
    TupleLength {
        path: String,
        expected: usize,
        found: usize,
    },

    /// A typed dynamic value was given a null payload
    #[error("typed dynamic value cannot carry a null payload, use dynamic null instead")]
    NullPayload,

    /// Type descriptor JSON is malformed
    #[error("invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    /// Persisted dynamic value is malformed
    #[error("invalid persisted dynamic value: {0}")]
    InvalidEncoding(String),

    /// A legacy string could not be parsed as JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

impl ValueError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether the error came from the payload rather than from a descriptor or encoding
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. }
                | Self::AttributeMismatch { .. }
                | Self::TupleLength { .. }
                | Self::NullPayload
        )
    }
}

impl From<serde_json::Error> for ValueError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_display() {
        let err = ValueError::type_mismatch("/0", "string", "number");
        assert_eq!(
            err.to_string(),
            "type mismatch at /0: expected string, found number"
        );
    }

    #[test]
    fn structural_classification() {
        assert!(ValueError::NullPayload.is_structural());
        assert!(!ValueError::InvalidJson("eof".to_string()).is_structural());
        assert!(!ValueError::InvalidDescriptor("x".to_string()).is_structural());
    }

    #[test]
    fn from_serde_error() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ValueError = parse.unwrap_err().into();
        assert!(matches!(err, ValueError::InvalidJson(_)));
    }
}
