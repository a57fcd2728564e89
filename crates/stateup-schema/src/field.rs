//! Field values and attribute kinds

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use stateup_value::DynamicValue;

/// Declared kind of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Plain string
    String,
    /// List of strings; elements may be null
    StringList,
    /// Map of string to string
    StringMap,
    /// Map of string to list of strings
    StringListMap,
    /// Dynamic value
    Dynamic,
    /// Nested block carried without interpretation
    Opaque,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::StringList => "list(string)",
            Self::StringMap => "map(string)",
            Self::StringListMap => "map(list(string))",
            Self::Dynamic => "dynamic",
            Self::Opaque => "block",
        })
    }
}

/// Value of one record field
///
/// An attribute missing from a record is "absent"; [`FieldValue::Null`] is
/// present-but-unset. Dynamic attributes use [`DynamicValue::Null`] for
/// their own null so the dynamic kind is never lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Null value of a non-dynamic kind
    Null,
    /// String value
    String(String),
    /// List of strings
    StringList(Vec<Option<String>>),
    /// Map of string to string
    StringMap(IndexMap<String, String>),
    /// Map of string to list of strings
    StringListMap(IndexMap<String, Vec<String>>),
    /// Dynamic value, possibly dynamic-null
    Dynamic(DynamicValue),
    /// Opaque nested block
    Opaque(JsonValue),
}

impl FieldValue {
    /// String value
    #[inline]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Whether the value is null, including dynamic-null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Dynamic(DynamicValue::Null))
    }

    /// Borrow as a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a string list
    #[inline]
    #[must_use]
    pub fn as_string_list(&self) -> Option<&[Option<String>]> {
        match self {
            Self::StringList(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a dynamic value
    #[inline]
    #[must_use]
    pub fn as_dynamic(&self) -> Option<&DynamicValue> {
        match self {
            Self::Dynamic(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this value may be stored in an attribute of `kind`
    #[must_use]
    pub fn fits(&self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::String(_), AttributeKind::String)
                | (Self::StringList(_), AttributeKind::StringList)
                | (Self::StringMap(_), AttributeKind::StringMap)
                | (Self::StringListMap(_), AttributeKind::StringListMap)
                | (Self::Dynamic(_), AttributeKind::Dynamic)
                | (Self::Opaque(_), AttributeKind::Opaque)
        )
    }

    /// Short name of the variant, for error messages
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::StringList(_) => "list(string)",
            Self::StringMap(_) => "map(string)",
            Self::StringListMap(_) => "map(list(string))",
            Self::Dynamic(_) => "dynamic",
            Self::Opaque(_) => "block",
        }
    }

    /// Null value appropriate for `kind`
    #[inline]
    #[must_use]
    pub fn null_of(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Dynamic => Self::Dynamic(DynamicValue::Null),
            _ => Self::Null,
        }
    }
}

impl From<DynamicValue> for FieldValue {
    fn from(value: DynamicValue) -> Self {
        Self::Dynamic(value)
    }
}
