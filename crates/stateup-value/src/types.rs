//! Type descriptors for dynamic values
//!
//! A [`DynamicType`] travels next to every non-null dynamic payload so the
//! payload can be re-checked after a round trip through storage. The JSON
//! descriptor form is:
//!
//! ```text
//! "string" | "number" | "bool" | "dynamic"
//! ["list", T] | ["map", T] | ["object", {"name": T, ...}] | ["tuple", [T, ...]]
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::ValueError;

/// Concrete type of a dynamic payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicType {
    /// UTF-8 string
    String,
    /// JSON number
    Number,
    /// Boolean
    Bool,
    /// Any value; used for nulls nested inside implied types
    Dynamic,
    /// Homogeneous list
    List(Box<DynamicType>),
    /// Homogeneous string-keyed map
    Map(Box<DynamicType>),
    /// Fixed attribute set
    Object(IndexMap<String, DynamicType>),
    /// Fixed-length heterogeneous sequence
    Tuple(Vec<DynamicType>),
}

impl DynamicType {
    /// `list(string)`, the type legacy string lists widen to
    #[inline]
    #[must_use]
    pub fn string_list() -> Self {
        Self::List(Box::new(Self::String))
    }

    /// Infer the type a JSON document implies.
    ///
    /// Objects become objects, arrays become tuples and nulls become
    /// [`DynamicType::Dynamic`].
    #[must_use]
    pub fn implied_by(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Dynamic,
            JsonValue::Bool(_) => Self::Bool,
            JsonValue::Number(_) => Self::Number,
            JsonValue::String(_) => Self::String,
            JsonValue::Array(items) => Self::Tuple(items.iter().map(Self::implied_by).collect()),
            JsonValue::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::implied_by(v)))
                    .collect(),
            ),
        }
    }

    /// Check that `value` conforms to this type.
    ///
    /// Nested elements and attributes may be null; the root may not be
    /// checked as null here, see [`DynamicValue::new`](crate::DynamicValue::new).
    ///
    /// # Errors
    /// Returns the first mismatch found, with its JSON pointer.
    pub fn check(&self, value: &JsonValue) -> Result<(), ValueError> {
        self.check_at(value, "")
    }

    fn check_at(&self, value: &JsonValue, path: &str) -> Result<(), ValueError> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Dynamic => Ok(()),
            Self::String if value.is_string() => Ok(()),
            Self::Number if value.is_number() => Ok(()),
            Self::Bool if value.is_boolean() => Ok(()),
            Self::List(element) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(self, value, path))?;
                for (i, item) in items.iter().enumerate() {
                    element.check_at(item, &format!("{path}/{i}"))?;
                }
                Ok(())
            }
            Self::Map(element) => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| mismatch(self, value, path))?;
                for (key, item) in entries {
                    element.check_at(item, &format!("{path}/{key}"))?;
                }
                Ok(())
            }
            Self::Object(attrs) => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| mismatch(self, value, path))?;
                if let Some(extra) = entries.keys().find(|k| !attrs.contains_key(*k)) {
                    return Err(ValueError::AttributeMismatch {
                        path: path.to_string(),
                        detail: format!("unexpected attribute '{extra}'"),
                    });
                }
                for (name, ty) in attrs {
                    match entries.get(name) {
                        Some(item) => ty.check_at(item, &format!("{path}/{name}"))?,
                        None => {
                            return Err(ValueError::AttributeMismatch {
                                path: path.to_string(),
                                detail: format!("missing attribute '{name}'"),
                            })
                        }
                    }
                }
                Ok(())
            }
            Self::Tuple(types) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(self, value, path))?;
                if items.len() != types.len() {
                    return Err(ValueError::TupleLength {
                        path: path.to_string(),
                        expected: types.len(),
                        found: items.len(),
                    });
                }
                for (i, (ty, item)) in types.iter().zip(items).enumerate() {
                    ty.check_at(item, &format!("{path}/{i}"))?;
                }
                Ok(())
            }
            _ => Err(mismatch(self, value, path)),
        }
    }

    /// JSON descriptor form
    #[must_use]
    pub fn to_descriptor(&self) -> JsonValue {
        match self {
            Self::String => JsonValue::from("string"),
            Self::Number => JsonValue::from("number"),
            Self::Bool => JsonValue::from("bool"),
            Self::Dynamic => JsonValue::from("dynamic"),
            Self::List(element) => JsonValue::Array(vec!["list".into(), element.to_descriptor()]),
            Self::Map(element) => JsonValue::Array(vec!["map".into(), element.to_descriptor()]),
            Self::Object(attrs) => {
                let attrs = attrs
                    .iter()
                    .map(|(k, t)| (k.clone(), t.to_descriptor()))
                    .collect();
                JsonValue::Array(vec!["object".into(), JsonValue::Object(attrs)])
            }
            Self::Tuple(types) => JsonValue::Array(vec![
                "tuple".into(),
                JsonValue::Array(types.iter().map(Self::to_descriptor).collect()),
            ]),
        }
    }

    /// Parse the JSON descriptor form
    ///
    /// # Errors
    /// Returns [`ValueError::InvalidDescriptor`] for anything not produced by
    /// [`DynamicType::to_descriptor`].
    pub fn from_descriptor(descriptor: &JsonValue) -> Result<Self, ValueError> {
        match descriptor {
            JsonValue::String(name) => match name.as_str() {
                "string" => Ok(Self::String),
                "number" => Ok(Self::Number),
                "bool" => Ok(Self::Bool),
                "dynamic" => Ok(Self::Dynamic),
                other => Err(ValueError::InvalidDescriptor(format!(
                    "unknown primitive type '{other}'"
                ))),
            },
            JsonValue::Array(parts) if parts.len() == 2 => {
                let kind = parts[0].as_str().ok_or_else(|| {
                    ValueError::InvalidDescriptor("collection kind must be a string".to_string())
                })?;
                let inner = &parts[1];
                match kind {
                    "list" => Ok(Self::List(Box::new(Self::from_descriptor(inner)?))),
                    "map" => Ok(Self::Map(Box::new(Self::from_descriptor(inner)?))),
                    "object" => {
                        let attrs = inner.as_object().ok_or_else(|| {
                            ValueError::InvalidDescriptor(
                                "object attributes must be a JSON object".to_string(),
                            )
                        })?;
                        let attrs = attrs
                            .iter()
                            .map(|(k, t)| Ok((k.clone(), Self::from_descriptor(t)?)))
                            .collect::<Result<IndexMap<_, _>, ValueError>>()?;
                        Ok(Self::Object(attrs))
                    }
                    "tuple" => {
                        let types = inner.as_array().ok_or_else(|| {
                            ValueError::InvalidDescriptor(
                                "tuple element types must be a JSON array".to_string(),
                            )
                        })?;
                        let types = types
                            .iter()
                            .map(Self::from_descriptor)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Self::Tuple(types))
                    }
                    other => Err(ValueError::InvalidDescriptor(format!(
                        "unknown collection kind '{other}'"
                    ))),
                }
            }
            other => Err(ValueError::InvalidDescriptor(format!(
                "unexpected descriptor {other}"
            ))),
        }
    }
}

impl fmt::Display for DynamicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Bool => f.write_str("bool"),
            Self::Dynamic => f.write_str("dynamic"),
            Self::List(element) => write!(f, "list({element})"),
            Self::Map(element) => write!(f, "map({element})"),
            Self::Object(attrs) => {
                f.write_str("object({")?;
                for (i, (name, ty)) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={ty}")?;
                }
                f.write_str("})")
            }
            Self::Tuple(types) => {
                f.write_str("tuple([")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str("])")
            }
        }
    }
}

impl Serialize for DynamicType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_descriptor().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DynamicType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let descriptor = JsonValue::deserialize(deserializer)?;
        Self::from_descriptor(&descriptor).map_err(serde::de::Error::custom)
    }
}

/// Name of the JSON kind of `value`, for error messages
#[must_use]
pub fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn mismatch(ty: &DynamicType, value: &JsonValue, path: &str) -> ValueError {
    ValueError::type_mismatch(path, ty.to_string(), json_kind(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_of_string_list() {
        assert_eq!(
            DynamicType::string_list().to_descriptor(),
            json!(["list", "string"])
        );
    }

    #[test]
    fn descriptor_parses_nested_object() {
        let ty = DynamicType::from_descriptor(&json!([
            "object",
            {"name": "string", "tags": ["map", "string"], "pair": ["tuple", ["number", "bool"]]}
        ]))
        .unwrap();
        assert_eq!(
            ty.to_string(),
            "object({name=string, tags=map(string), pair=tuple([number, bool])})"
        );
    }

    #[test]
    fn descriptor_rejects_unknown_kind() {
        let err = DynamicType::from_descriptor(&json!(["set", "string"])).unwrap_err();
        assert!(matches!(err, ValueError::InvalidDescriptor(_)));
        assert!(DynamicType::from_descriptor(&json!("float")).is_err());
        assert!(DynamicType::from_descriptor(&json!(42)).is_err());
    }

    #[test]
    fn implied_type_of_document() {
        let ty = DynamicType::implied_by(&json!({"a": [1, "x"], "b": null, "c": true}));
        let mut attrs = IndexMap::new();
        attrs.insert(
            "a".to_string(),
            DynamicType::Tuple(vec![DynamicType::Number, DynamicType::String]),
        );
        attrs.insert("b".to_string(), DynamicType::Dynamic);
        attrs.insert("c".to_string(), DynamicType::Bool);
        assert_eq!(ty, DynamicType::Object(attrs));
    }

    #[test]
    fn check_accepts_list_with_null_elements() {
        let ty = DynamicType::string_list();
        assert!(ty.check(&json!(["a", null, "b"])).is_ok());
        assert!(ty.check(&json!([])).is_ok());
    }

    #[test]
    fn check_reports_element_path() {
        let err = DynamicType::string_list()
            .check(&json!(["a", 1]))
            .unwrap_err();
        assert_eq!(err, ValueError::type_mismatch("/1", "string", "number"));
    }

    #[test]
    fn check_object_attribute_set() {
        let ty = DynamicType::implied_by(&json!({"a": "x"}));
        assert!(ty.check(&json!({"a": "y"})).is_ok());
        assert!(matches!(
            ty.check(&json!({"a": "y", "b": 1})),
            Err(ValueError::AttributeMismatch { .. })
        ));
        assert!(matches!(
            ty.check(&json!({})),
            Err(ValueError::AttributeMismatch { .. })
        ));
    }

    #[test]
    fn check_tuple_length() {
        let ty = DynamicType::Tuple(vec![DynamicType::String]);
        assert!(matches!(
            ty.check(&json!(["a", "b"])),
            Err(ValueError::TupleLength { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn serde_uses_descriptor_form() {
        let ty = DynamicType::Map(Box::new(DynamicType::string_list()));
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json, json!(["map", ["list", "string"]]));
        let back: DynamicType = serde_json::from_value(json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn json_kind_names() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!(true)), "bool");
        assert_eq!(json_kind(&json!(1.5)), "number");
        assert_eq!(json_kind(&json!("x")), "string");
        assert_eq!(json_kind(&json!([])), "array");
        assert_eq!(json_kind(&json!({})), "object");
    }
}
