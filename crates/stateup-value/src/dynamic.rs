//! Dynamic values
//!
//! A [`DynamicValue`] is either dynamic-null or a payload tagged with its
//! [`DynamicType`]. Dynamic-null is not the same thing as a typed payload
//! that happens to be empty: `""`, `[]` and `{}` are all non-null.
//!
//! Persisted form:
//!
//! ```text
//! null                                   dynamic-null
//! {"type": <descriptor>, "value": <json>} typed payload
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::ValueError;
use crate::types::{json_kind, DynamicType};

/// Value that can hold any concrete payload, or nothing at all
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DynamicValue {
    /// Dynamic-null
    #[default]
    Null,
    /// Typed, non-null payload
    Known {
        /// Payload type
        ty: DynamicType,
        /// Payload; conforms to `ty` and is never JSON null
        value: JsonValue,
    },
}

impl DynamicValue {
    /// Dynamic-null
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Build a typed value, checking the payload against its type.
    ///
    /// # Errors
    /// [`ValueError::NullPayload`] for a JSON null payload, or the first
    /// mismatch reported by [`DynamicType::check`].
    pub fn new(ty: DynamicType, value: JsonValue) -> Result<Self, ValueError> {
        if value.is_null() {
            return Err(ValueError::NullPayload);
        }
        ty.check(&value)?;
        Ok(Self::Known { ty, value })
    }

    /// Dynamic string
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Known {
            ty: DynamicType::String,
            value: JsonValue::String(value.into()),
        }
    }

    /// Dynamic `list(string)`; `None` elements are kept as null elements
    ///
    /// # Errors
    /// Never fails for well-formed input; the payload is still checked.
    pub fn string_list<I>(items: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let items = items
            .into_iter()
            .map(|item| item.map_or(JsonValue::Null, JsonValue::String))
            .collect();
        Self::new(DynamicType::string_list(), JsonValue::Array(items))
    }

    /// Parse `raw` as JSON and tag it with the type it implies.
    ///
    /// A JSON `null` document yields dynamic-null.
    ///
    /// # Errors
    /// [`ValueError::InvalidJson`] if `raw` is not a JSON document.
    pub fn from_json_implied(raw: &str) -> Result<Self, ValueError> {
        let value: JsonValue = serde_json::from_str(raw)?;
        if value.is_null() {
            return Ok(Self::Null);
        }
        let ty = DynamicType::implied_by(&value);
        Self::new(ty, value)
    }

    /// Whether this is dynamic-null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Payload type, if any
    #[inline]
    #[must_use]
    pub fn ty(&self) -> Option<&DynamicType> {
        match self {
            Self::Null => None,
            Self::Known { ty, .. } => Some(ty),
        }
    }

    /// Payload, if any
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&JsonValue> {
        match self {
            Self::Null => None,
            Self::Known { value, .. } => Some(value),
        }
    }

    /// Payload as a string, if it is one
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Known {
                ty: DynamicType::String,
                value,
            } => value.as_str(),
            _ => None,
        }
    }

    /// Persisted JSON form
    #[must_use]
    pub fn to_persisted(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Known { ty, value } => {
                let mut map = Map::new();
                map.insert("type".to_string(), ty.to_descriptor());
                map.insert("value".to_string(), value.clone());
                JsonValue::Object(map)
            }
        }
    }

    /// Decode the persisted JSON form, re-checking the payload
    ///
    /// # Errors
    /// [`ValueError::InvalidEncoding`] for a malformed envelope, or any
    /// descriptor/payload error.
    pub fn from_persisted(persisted: &JsonValue) -> Result<Self, ValueError> {
        let envelope = match persisted {
            JsonValue::Null => return Ok(Self::Null),
            JsonValue::Object(map) => map,
            other => {
                return Err(ValueError::InvalidEncoding(format!(
                    "expected null or an object envelope, found {}",
                    json_kind(other)
                )))
            }
        };
        if let Some(extra) = envelope.keys().find(|k| *k != "type" && *k != "value") {
            return Err(ValueError::InvalidEncoding(format!(
                "unexpected envelope key '{extra}'"
            )));
        }
        let descriptor = envelope
            .get("type")
            .ok_or_else(|| ValueError::InvalidEncoding("missing 'type'".to_string()))?;
        let value = envelope
            .get("value")
            .ok_or_else(|| ValueError::InvalidEncoding("missing 'value'".to_string()))?;
        let ty = DynamicType::from_descriptor(descriptor)?;
        Self::new(ty, value.clone())
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_persisted().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let persisted = JsonValue::deserialize(deserializer)?;
        Self::from_persisted(&persisted).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_default() {
        assert!(DynamicValue::default().is_null());
        assert_eq!(DynamicValue::null().to_persisted(), JsonValue::Null);
    }

    #[test]
    fn empty_string_is_not_null() {
        let value = DynamicValue::string("");
        assert!(!value.is_null());
        assert_eq!(value.as_str(), Some(""));
    }

    #[test]
    fn new_rejects_null_payload() {
        assert_eq!(
            DynamicValue::new(DynamicType::String, JsonValue::Null),
            Err(ValueError::NullPayload)
        );
    }

    #[test]
    fn new_rejects_mismatched_payload() {
        let err = DynamicValue::new(DynamicType::string_list(), json!("a")).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn string_list_keeps_order_and_null_elements() {
        let value = DynamicValue::string_list(vec![
            Some("b".to_string()),
            None,
            Some("a".to_string()),
        ])
        .unwrap();
        assert_eq!(value.ty(), Some(&DynamicType::string_list()));
        assert_eq!(value.value(), Some(&json!(["b", null, "a"])));
    }

    #[test]
    fn persisted_envelope() {
        let value = DynamicValue::string("hello");
        assert_eq!(
            value.to_persisted(),
            json!({"type": "string", "value": "hello"})
        );
        assert_eq!(
            DynamicValue::from_persisted(&value.to_persisted()).unwrap(),
            value
        );
    }

    #[test]
    fn persisted_rejects_bare_payload() {
        assert!(matches!(
            DynamicValue::from_persisted(&json!("hello")),
            Err(ValueError::InvalidEncoding(_))
        ));
        assert!(matches!(
            DynamicValue::from_persisted(&json!({"type": "string"})),
            Err(ValueError::InvalidEncoding(_))
        ));
        assert!(matches!(
            DynamicValue::from_persisted(&json!({"type": "string", "value": "x", "extra": 1})),
            Err(ValueError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn persisted_rechecks_payload() {
        let err = DynamicValue::from_persisted(&json!({"type": "number", "value": "1"}))
            .unwrap_err();
        assert_eq!(err, ValueError::type_mismatch("", "number", "string"));
    }

    #[test]
    fn json_implied_object() {
        let value = DynamicValue::from_json_implied(r#"{"sku": {"name": "S1"}}"#).unwrap();
        assert_eq!(
            value.ty().unwrap().to_string(),
            "object({sku=object({name=string})})"
        );
        assert_eq!(value.value(), Some(&json!({"sku": {"name": "S1"}})));
    }

    #[test]
    fn json_implied_null_document() {
        assert!(DynamicValue::from_json_implied("null").unwrap().is_null());
    }

    #[test]
    fn json_implied_rejects_plain_text() {
        assert!(matches!(
            DynamicValue::from_json_implied("hello"),
            Err(ValueError::InvalidJson(_))
        ));
    }
}
