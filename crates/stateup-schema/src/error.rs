//! Error types for decoding and encoding records
//!
//! - [`DecodeError`]: stored bytes do not match the declared shape
//! - [`EncodeError`]: a record does not match the shape it is written under

use stateup_value::ValueError;

/// Stored bytes do not conform to a declared shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Input is not JSON
    #[error("state is not valid JSON: {0}")]
    Syntax(String),

    /// Input is JSON but not an object
    #[error("state must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// Required attribute absent or null
    #[error("missing required attribute '{0}'")]
    MissingRequired(String),

    /// Attribute not declared by the shape
    #[error("unexpected attribute '{0}'")]
    UnexpectedAttribute(String),

    /// Attribute has the wrong JSON kind
    #[error("attribute '{attribute}': expected {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    /// Dynamic attribute has a malformed envelope or payload
    #[error("attribute '{attribute}': {source}")]
    Dynamic {
        attribute: String,
        #[source]
        source: ValueError,
    },
}

impl DecodeError {
    /// Create type mismatch error for attribute
    pub fn type_mismatch(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Attribute the error is about, if any
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::MissingRequired(name) | Self::UnexpectedAttribute(name) => Some(name),
            Self::TypeMismatch { attribute, .. } | Self::Dynamic { attribute, .. } => {
                Some(attribute)
            }
            Self::Syntax(_) | Self::NotAnObject(_) => None,
        }
    }
}

/// A record cannot be written under a declared shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Declared attribute missing from the record
    #[error("record has no value for declared attribute '{0}'")]
    MissingAttribute(String),

    /// Record carries an attribute the shape does not declare
    #[error("record carries undeclared attribute '{0}'")]
    UnexpectedAttribute(String),

    /// Value variant does not match the declared kind
    #[error("attribute '{attribute}': declared {expected}, record holds {found}")]
    KindMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    /// Required attribute is null
    #[error("required attribute '{0}' is null")]
    RequiredNull(String),

    /// Opaque block is neither null nor an object
    #[error("attribute '{0}': opaque blocks must be null or an object")]
    MalformedBlock(String),

    /// Version tag differs from the shape version
    #[error("record is tagged version {record}, shape is version {shape}")]
    VersionMismatch { record: u64, shape: u64 },

    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display() {
        let err = DecodeError::MissingRequired("type".to_string());
        assert_eq!(err.to_string(), "missing required attribute 'type'");
        assert_eq!(err.attribute(), Some("type"));
    }

    #[test]
    fn decode_error_attribute_for_syntax() {
        assert_eq!(DecodeError::Syntax("eof".to_string()).attribute(), None);
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::VersionMismatch { record: 0, shape: 2 };
        assert_eq!(err.to_string(), "record is tagged version 0, shape is version 2");
    }
}
