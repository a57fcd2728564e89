//! Error types for the upgrade engine
//!
//! - [`UpgradeError`]: one step failed on one record
//! - [`TableError`]: a mapping table disagrees with its shapes
//! - [`ChainConfigurationError`]: the chain itself is misconfigured
//!
//! Upgrade errors never escape a step as `Err`; they are turned into
//! [`Diagnostic`]s through `From<&UpgradeError>`.

use stateup_schema::{DecodeError, Diagnostic, EncodeError};
use stateup_value::ValueError;

/// A single upgrade step failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpgradeError {
    /// Prior state does not match the prior shape
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// A legacy value could not become a dynamic value
    #[error("failed to migrate {field} to dynamic value: {source}")]
    Coercion {
        /// Offending field
        field: String,
        #[source]
        source: ValueError,
    },

    /// Upgraded record does not match the next shape
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
}

impl UpgradeError {
    /// Create coercion error for field
    pub fn coercion(field: impl Into<String>, source: ValueError) -> Self {
        Self::Coercion {
            field: field.into(),
            source,
        }
    }

    /// Field the error is about, if known
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Decode(err) => err.attribute(),
            Self::Coercion { field, .. } => Some(field),
            Self::Encode(_) => None,
        }
    }

    /// Whether the error points at the engine configuration rather than at
    /// the record
    #[inline]
    #[must_use]
    pub fn is_configuration_bug(&self) -> bool {
        matches!(self, Self::Encode(_))
    }
}

impl From<&UpgradeError> for Diagnostic {
    fn from(err: &UpgradeError) -> Self {
        match err {
            UpgradeError::Decode(source) => {
                Diagnostic::error("failed to decode prior state", source.to_string())
            }
            UpgradeError::Coercion { field, source } => Diagnostic::error(
                format!("failed to migrate {field} to dynamic value"),
                source.to_string(),
            ),
            UpgradeError::Encode(source) => {
                Diagnostic::error("failed to encode upgraded state", source.to_string())
            }
        }
    }
}

/// Mapping table inconsistent with the shapes it maps between
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Rule reads a field the prior shape does not declare
    #[error("rule reads undeclared prior field '{0}'")]
    UnknownSource(String),

    /// Rule writes a field the next shape does not declare
    #[error("rule writes undeclared field '{0}'")]
    UnknownTarget(String),

    /// Two rules write the same field
    #[error("field '{0}' is written by more than one rule")]
    DuplicateTarget(String),

    /// Next-shape field written by no rule
    #[error("field '{0}' is not produced by any rule")]
    Unmapped(String),

    /// Prior-shape field neither read nor explicitly removed
    #[error("prior field '{0}' is neither mapped nor removed")]
    Unaccounted(String),

    /// Rule kind incompatible with declared kinds
    #[error("field '{field}': rule needs {expected}, shape declares {found}")]
    KindMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Synthesized null written into a required field
    #[error("field '{0}' is required but synthesized as null")]
    NullIntoRequired(String),
}

/// Upgrade chain misconfiguration, detected before any record is touched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainConfigurationError {
    /// Second step registered for a source version
    #[error("a step is already registered for version {0}")]
    DuplicateStep(u64),

    /// Step registered under a version it does not start from
    #[error("step '{name}' starts at version {actual}, registered for version {registered}")]
    VersionMismatch {
        name: String,
        registered: u64,
        actual: u64,
    },

    /// Step does not move the version forward
    #[error("step '{name}' does not advance: {from} -> {to}")]
    NonAdvancing { name: String, from: u64, to: u64 },

    /// Step lands on a version that is neither current nor has a step
    #[error("no step registered for version {0}, which an earlier step produces")]
    MissingStep(u64),

    /// Step starts at or beyond the declared current version
    #[error("step '{name}' starts at version {from}, not before current version {current}")]
    BeyondCurrent { name: String, from: u64, current: u64 },

    /// Mapping table disagrees with the shapes
    #[error("step '{name}': {source}")]
    Table {
        name: String,
        #[source]
        source: TableError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use stateup_schema::Severity;

    #[test]
    fn coercion_diagnostic_names_field() {
        let err = UpgradeError::coercion("body", ValueError::InvalidJson("eof".to_string()));
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "failed to migrate body to dynamic value");
        assert_eq!(diag.detail, "invalid JSON: eof");
        assert_eq!(err.field(), Some("body"));
    }

    #[test]
    fn decode_diagnostic() {
        let err = UpgradeError::from(DecodeError::MissingRequired("type".to_string()));
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.summary, "failed to decode prior state");
        assert_eq!(diag.detail, "missing required attribute 'type'");
        assert_eq!(err.field(), Some("type"));
        assert!(!err.is_configuration_bug());
    }

    #[test]
    fn encode_is_configuration_bug() {
        let err = UpgradeError::from(EncodeError::MissingAttribute("retry".to_string()));
        assert!(err.is_configuration_bug());
    }

    #[test]
    fn chain_error_display() {
        let err = ChainConfigurationError::Table {
            name: "action".to_string(),
            source: TableError::Unmapped("headers".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "step 'action': field 'headers' is not produced by any rule"
        );
    }
}
