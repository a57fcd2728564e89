//! Field mapping tables
//!
//! A [`MappingTable`] is the declarative description of one upgrade step:
//! for each field of the next shape, which rule produces it. Rules read only
//! the decoded prior record, never each other's output, so the order of the
//! rules does not affect the result.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use stateup_schema::{AttributeKind, FieldValue, Record, Shape};
use stateup_value::{coerce, DynamicValue, LegacyKind, LegacyValue, ValueError};

use crate::error::{TableError, UpgradeError};
use crate::options::{MapSynthesis, UpgradeOptions};

/// Fixed value for a field with no legacy source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    /// Dynamic-null
    DynamicNull,
    /// Null of the target kind
    Null,
    /// Map with no legacy data; resolved through [`UpgradeOptions::unpopulated_maps`]
    UnpopulatedMap,
}

/// One mapping rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Copy unchanged
    Identity {
        /// Field name in both shapes
        field: String,
    },
    /// Copy, substituting `default` when the prior value is null
    Defaulted {
        /// Field name in both shapes
        field: String,
        /// Fallback string
        default: String,
    },
    /// Widen a legacy value into a dynamic value
    Coerced {
        /// Prior field
        from: String,
        /// Next field
        to: String,
        /// Legacy kind of the prior field
        kind: LegacyKind,
    },
    /// Copy unchanged under a new name
    Renamed {
        /// Prior field
        from: String,
        /// Next field
        to: String,
    },
    /// Produce a fixed value
    Synthesized {
        /// Next field
        field: String,
        /// Value to produce
        value: Synthesis,
    },
    /// Drop a prior field
    Removed {
        /// Prior field
        field: String,
    },
}

impl FieldRule {
    /// Identity rule
    #[inline]
    pub fn identity(field: impl Into<String>) -> Self {
        Self::Identity {
            field: field.into(),
        }
    }

    /// Defaulted identity rule
    #[inline]
    pub fn defaulted(field: impl Into<String>, default: impl Into<String>) -> Self {
        Self::Defaulted {
            field: field.into(),
            default: default.into(),
        }
    }

    /// Coercion rule keeping the field name
    #[inline]
    pub fn coerced(field: impl Into<String>, kind: LegacyKind) -> Self {
        let field = field.into();
        Self::Coerced {
            from: field.clone(),
            to: field,
            kind,
        }
    }

    /// Rename rule
    #[inline]
    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Renamed {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Synthesis rule
    #[inline]
    pub fn synthesized(field: impl Into<String>, value: Synthesis) -> Self {
        Self::Synthesized {
            field: field.into(),
            value,
        }
    }

    /// Removal rule
    #[inline]
    pub fn removed(field: impl Into<String>) -> Self {
        Self::Removed {
            field: field.into(),
        }
    }

    /// Prior field read by this rule
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Identity { field } | Self::Defaulted { field, .. } | Self::Removed { field } => {
                Some(field)
            }
            Self::Coerced { from, .. } | Self::Renamed { from, .. } => Some(from),
            Self::Synthesized { .. } => None,
        }
    }

    /// Next field written by this rule
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Identity { field } | Self::Defaulted { field, .. } => Some(field),
            Self::Coerced { to, .. } | Self::Renamed { to, .. } => Some(to),
            Self::Synthesized { field, .. } => Some(field),
            Self::Removed { .. } => None,
        }
    }

    /// Short rule name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity { .. } => "identity",
            Self::Defaulted { .. } => "defaulted",
            Self::Coerced { .. } => "coerced",
            Self::Renamed { .. } => "renamed",
            Self::Synthesized { .. } => "synthesized",
            Self::Removed { .. } => "removed",
        }
    }

    /// Evaluate against the prior record.
    ///
    /// Returns `None` for rules that write nothing.
    fn evaluate(
        &self,
        prior: &Record,
        next: &Shape,
        options: &UpgradeOptions,
    ) -> Result<Option<(String, FieldValue)>, UpgradeError> {
        let read = |name: &str| prior.get(name).cloned().unwrap_or(FieldValue::Null);
        let value = match self {
            Self::Identity { field } => (field.clone(), read(field)),
            Self::Renamed { from, to } => (to.clone(), read(from)),
            Self::Defaulted { field, default } => {
                let value = read(field);
                if value.is_null() {
                    (field.clone(), FieldValue::string(default.clone()))
                } else {
                    (field.clone(), value)
                }
            }
            Self::Coerced { from, to, kind } => {
                let legacy = legacy_view(prior.get(from), *kind)
                    .map_err(|source| UpgradeError::coercion(from.clone(), source))?;
                let dynamic = coerce(legacy, options.string_policy)
                    .map_err(|source| UpgradeError::coercion(from.clone(), source))?;
                (to.clone(), FieldValue::Dynamic(dynamic))
            }
            Self::Synthesized { field, value } => {
                let kind = next.attribute(field).map(|a| a.kind);
                (field.clone(), synthesize(value, kind, options))
            }
            Self::Removed { .. } => return Ok(None),
        };
        Ok(Some(value))
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity { field } => write!(f, "{field} = {field}"),
            Self::Defaulted { field, default } => write!(f, "{field} = {field} or {default:?}"),
            Self::Coerced { from, to, kind } => {
                let kind = match kind {
                    LegacyKind::Scalar => "scalar",
                    LegacyKind::List => "list",
                };
                write!(f, "{to} = dynamic({kind} {from})")
            }
            Self::Renamed { from, to } => write!(f, "{to} = {from}"),
            Self::Synthesized { field, value } => match value {
                Synthesis::DynamicNull => write!(f, "{field} = dynamic null"),
                Synthesis::Null => write!(f, "{field} = null"),
                Synthesis::UnpopulatedMap => write!(f, "{field} = unpopulated map"),
            },
            Self::Removed { field } => write!(f, "drop {field}"),
        }
    }
}

/// Ordered set of rules describing one step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappingTable {
    rules: Vec<FieldRule>,
}

impl MappingTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule
    #[inline]
    #[must_use]
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Rules in declaration order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rule that writes `field`
    #[must_use]
    pub fn rule_for(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.target() == Some(field))
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check the table against the shapes it maps between.
    ///
    /// Every rule must read declared prior fields and write declared next
    /// fields with compatible kinds; every next field must be written exactly
    /// once; every prior field must be read or explicitly removed.
    ///
    /// # Errors
    /// The first inconsistency found.
    pub fn validate(&self, prior: &Shape, next: &Shape) -> Result<(), TableError> {
        let mut written = HashSet::new();
        let mut read = HashSet::new();

        for rule in &self.rules {
            let source = match rule.source() {
                Some(name) => Some(
                    prior
                        .attribute(name)
                        .ok_or_else(|| TableError::UnknownSource(name.to_string()))?,
                ),
                None => None,
            };
            if let Some(name) = rule.source() {
                read.insert(name);
            }

            let Some(target_name) = rule.target() else {
                continue;
            };
            let target = next
                .attribute(target_name)
                .ok_or_else(|| TableError::UnknownTarget(target_name.to_string()))?;
            if !written.insert(target_name) {
                return Err(TableError::DuplicateTarget(target_name.to_string()));
            }

            let mismatch = |expected: String, found: AttributeKind| TableError::KindMismatch {
                field: target_name.to_string(),
                expected,
                found: found.to_string(),
            };
            match (rule, source) {
                (FieldRule::Identity { .. } | FieldRule::Renamed { .. }, Some(source)) => {
                    if source.kind != target.kind {
                        return Err(mismatch(source.kind.to_string(), target.kind));
                    }
                }
                (FieldRule::Defaulted { .. }, Some(source)) => {
                    if source.kind != AttributeKind::String {
                        return Err(mismatch("string".to_string(), source.kind));
                    }
                    if target.kind != AttributeKind::String {
                        return Err(mismatch("string".to_string(), target.kind));
                    }
                }
                (FieldRule::Coerced { kind, .. }, Some(source)) => {
                    let legacy = match kind {
                        LegacyKind::Scalar => AttributeKind::String,
                        LegacyKind::List => AttributeKind::StringList,
                    };
                    if source.kind != legacy {
                        return Err(mismatch(legacy.to_string(), source.kind));
                    }
                    if target.kind != AttributeKind::Dynamic {
                        return Err(mismatch("dynamic".to_string(), target.kind));
                    }
                }
                (FieldRule::Synthesized { value, .. }, None) => match value {
                    Synthesis::DynamicNull if target.kind != AttributeKind::Dynamic => {
                        return Err(mismatch("dynamic".to_string(), target.kind));
                    }
                    Synthesis::UnpopulatedMap
                        if !matches!(
                            target.kind,
                            AttributeKind::StringMap | AttributeKind::StringListMap
                        ) =>
                    {
                        return Err(mismatch("map".to_string(), target.kind));
                    }
                    Synthesis::Null | Synthesis::DynamicNull | Synthesis::UnpopulatedMap
                        if target.is_required() =>
                    {
                        return Err(TableError::NullIntoRequired(target_name.to_string()));
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if let Some((name, _)) = next.attributes().find(|(name, _)| !written.contains(name)) {
            return Err(TableError::Unmapped(name.to_string()));
        }
        if let Some((name, _)) = prior.attributes().find(|(name, _)| !read.contains(name)) {
            return Err(TableError::Unaccounted(name.to_string()));
        }
        Ok(())
    }

    /// Apply every rule to `prior`, producing a record at `next`'s version.
    ///
    /// All-or-nothing: the first failing rule aborts and no record is
    /// returned.
    ///
    /// # Errors
    /// [`UpgradeError::Coercion`] naming the offending field.
    pub fn apply(
        &self,
        prior: &Record,
        next: &Shape,
        options: &UpgradeOptions,
    ) -> Result<Record, UpgradeError> {
        let mut produced = IndexMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            if let Some((field, value)) = rule.evaluate(prior, next, options)? {
                tracing::debug!(
                    field = %field,
                    rule = rule.label(),
                    value = %log_value(next, &field, &value),
                    "applied mapping rule"
                );
                produced.insert(field, value);
            }
        }

        let mut record = Record::new(next.version());
        for (field, value) in produced {
            record.insert(field, value);
        }
        Ok(record)
    }
}

impl fmt::Display for MappingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{:<12} {rule}", rule.label())?;
        }
        Ok(())
    }
}

/// Loggable rendering of a produced value; sensitive attributes are masked
fn log_value(next: &Shape, field: &str, value: &FieldValue) -> String {
    match next.attribute(field) {
        Some(attribute) if attribute.is_sensitive() => "(sensitive)".to_string(),
        _ => format!("{value:?}"),
    }
}

fn legacy_view(value: Option<&FieldValue>, kind: LegacyKind) -> Result<LegacyValue<'_>, ValueError> {
    match (value, kind) {
        (None | Some(FieldValue::Null), LegacyKind::Scalar) => Ok(LegacyValue::Scalar(None)),
        (None | Some(FieldValue::Null), LegacyKind::List) => Ok(LegacyValue::List(None)),
        (Some(FieldValue::String(s)), LegacyKind::Scalar) => {
            Ok(LegacyValue::Scalar(Some(s.as_str())))
        }
        (Some(FieldValue::StringList(items)), LegacyKind::List) => {
            Ok(LegacyValue::List(Some(items.as_slice())))
        }
        (Some(other), LegacyKind::Scalar) => Err(ValueError::type_mismatch(
            "",
            "string",
            other.variant_name(),
        )),
        (Some(other), LegacyKind::List) => Err(ValueError::type_mismatch(
            "",
            "list(string)",
            other.variant_name(),
        )),
    }
}

fn synthesize(value: &Synthesis, kind: Option<AttributeKind>, options: &UpgradeOptions) -> FieldValue {
    match value {
        Synthesis::DynamicNull => FieldValue::Dynamic(DynamicValue::Null),
        Synthesis::Null => kind.map_or(FieldValue::Null, FieldValue::null_of),
        Synthesis::UnpopulatedMap => match (options.unpopulated_maps, kind) {
            (MapSynthesis::Empty, Some(AttributeKind::StringMap)) => {
                FieldValue::StringMap(IndexMap::new())
            }
            (MapSynthesis::Empty, Some(AttributeKind::StringListMap)) => {
                FieldValue::StringListMap(IndexMap::new())
            }
            _ => FieldValue::Null,
        },
    }
}
