//! Legacy value coercion
//!
//! Widens legacy scalar strings and string lists into [`DynamicValue`]s.
//!
//! Empty and unset legacy scalars both become dynamic-null. The legacy schema
//! stored an unset optional string and an explicitly empty one the same way,
//! so there is nothing to preserve; callers that need to tell them apart
//! cannot recover the difference from migrated state.

use serde::{Deserialize, Serialize};

use crate::dynamic::DynamicValue;
use crate::error::ValueError;

/// How a non-empty legacy string becomes a dynamic value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringPolicy {
    /// Wrap the string unchanged as a dynamic string
    #[default]
    Verbatim,

    /// Parse the string as JSON and keep the structure it implies.
    /// Unparseable strings fail coercion.
    JsonImplied,
}

/// Kind of a legacy field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyKind {
    /// Plain string
    Scalar,
    /// List of strings
    List,
}

/// Borrowed legacy value together with its kind
///
/// `None` stands for absent or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyValue<'a> {
    /// Legacy string field
    Scalar(Option<&'a str>),
    /// Legacy list-of-string field
    List(Option<&'a [Option<String>]>),
}

impl LegacyValue<'_> {
    /// Kind of this value
    #[inline]
    #[must_use]
    pub fn kind(&self) -> LegacyKind {
        match self {
            Self::Scalar(_) => LegacyKind::Scalar,
            Self::List(_) => LegacyKind::List,
        }
    }
}

/// Coerce a legacy value into a dynamic value.
///
/// # Errors
/// Returns the [`ValueError`] raised while building the dynamic value. With
/// [`StringPolicy::Verbatim`] this only happens for structurally invalid
/// input.
pub fn coerce(value: LegacyValue<'_>, policy: StringPolicy) -> Result<DynamicValue, ValueError> {
    match value {
        LegacyValue::Scalar(scalar) => coerce_scalar(scalar, policy),
        LegacyValue::List(list) => coerce_list(list),
    }
}

/// Scalar rule: null or `""` gives dynamic-null, anything else is wrapped
/// according to `policy`.
///
/// # Errors
/// See [`coerce`].
pub fn coerce_scalar(value: Option<&str>, policy: StringPolicy) -> Result<DynamicValue, ValueError> {
    match value {
        None | Some("") => Ok(DynamicValue::Null),
        Some(text) => match policy {
            StringPolicy::Verbatim => Ok(DynamicValue::string(text)),
            StringPolicy::JsonImplied => DynamicValue::from_json_implied(text),
        },
    }
}

/// List rule: a null list gives dynamic-null, any other list (including
/// `[]`) is wrapped whole, order and elements untouched.
///
/// # Errors
/// See [`coerce`].
pub fn coerce_list(value: Option<&[Option<String>]>) -> Result<DynamicValue, ValueError> {
    match value {
        None => Ok(DynamicValue::Null),
        Some(items) => DynamicValue::string_list(items.iter().cloned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DynamicType;
    use serde_json::json;

    #[test]
    fn scalar_null_and_empty_collapse() {
        assert_eq!(coerce_scalar(None, StringPolicy::Verbatim), Ok(DynamicValue::Null));
        assert_eq!(coerce_scalar(Some(""), StringPolicy::Verbatim), Ok(DynamicValue::Null));
        assert_eq!(coerce_scalar(Some(""), StringPolicy::JsonImplied), Ok(DynamicValue::Null));
    }

    #[test]
    fn scalar_verbatim_wraps_once() {
        let value = coerce_scalar(Some("hello"), StringPolicy::Verbatim).unwrap();
        assert_eq!(value, DynamicValue::string("hello"));
        assert_eq!(value.as_str(), Some("hello"));
    }

    #[test]
    fn scalar_verbatim_keeps_json_text_as_string() {
        let value = coerce_scalar(Some(r#"{"a":1}"#), StringPolicy::Verbatim).unwrap();
        assert_eq!(value.as_str(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn scalar_json_implied_parses_structure() {
        let value = coerce_scalar(Some(r#"{"a":1}"#), StringPolicy::JsonImplied).unwrap();
        assert_eq!(value.value(), Some(&json!({"a": 1})));
        assert!(matches!(value.ty(), Some(DynamicType::Object(_))));
    }

    #[test]
    fn scalar_json_implied_rejects_text() {
        assert!(matches!(
            coerce_scalar(Some("not json"), StringPolicy::JsonImplied),
            Err(ValueError::InvalidJson(_))
        ));
    }

    #[test]
    fn list_null_is_null() {
        assert_eq!(coerce_list(None), Ok(DynamicValue::Null));
    }

    #[test]
    fn list_empty_stays_empty() {
        let value = coerce_list(Some(&[][..])).unwrap();
        assert!(!value.is_null());
        assert_eq!(value.value(), Some(&json!([])));
    }

    #[test]
    fn dispatch_by_kind() {
        let items = vec![Some("a".to_string())];
        let list = LegacyValue::List(Some(items.as_slice()));
        assert_eq!(list.kind(), LegacyKind::List);
        assert_eq!(
            coerce(list, StringPolicy::Verbatim).unwrap().value(),
            Some(&json!(["a"]))
        );

        let scalar = LegacyValue::Scalar(Some("x"));
        assert_eq!(scalar.kind(), LegacyKind::Scalar);
        assert_eq!(
            coerce(scalar, StringPolicy::Verbatim),
            Ok(DynamicValue::string("x"))
        );
    }

    #[test]
    fn policy_serde_names() {
        assert_eq!(
            serde_json::to_value(StringPolicy::JsonImplied).unwrap(),
            json!("json_implied")
        );
        let policy: StringPolicy = serde_json::from_value(json!("verbatim")).unwrap();
        assert_eq!(policy, StringPolicy::Verbatim);
    }
}
