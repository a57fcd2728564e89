//! Declared shapes
//!
//! A [`Shape`] is the attribute set valid for one schema version. It is used
//! only to decode stored bytes into a [`Record`] and to encode a record back
//! into bytes; validation beyond kinds and required-ness belongs to whatever
//! declared the shape.
//!
//! Stored form is a JSON object keyed by attribute name. Attributes the
//! input leaves out are decoded as null, so every decoded record carries
//! every declared attribute.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use stateup_value::{json_kind, DynamicValue};

use crate::error::{DecodeError, EncodeError};
use crate::field::{AttributeKind, FieldValue};
use crate::record::Record;

/// How an attribute gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Must be set and non-null
    Required,
    /// May be null
    Optional,
    /// Set by the provider, may be null
    Computed,
    /// May be set by the user or filled in by the provider
    OptionalComputed,
}

/// One declared attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Value kind
    pub kind: AttributeKind,
    /// Presence rule
    pub presence: Presence,
    /// Value is sensitive; logs show a placeholder instead
    pub sensitive: bool,
}

impl Attribute {
    /// Create attribute
    #[inline]
    #[must_use]
    pub fn new(kind: AttributeKind, presence: Presence) -> Self {
        Self {
            kind,
            presence,
            sensitive: false,
        }
    }

    /// Required attribute
    #[inline]
    #[must_use]
    pub fn required(kind: AttributeKind) -> Self {
        Self::new(kind, Presence::Required)
    }

    /// Optional attribute
    #[inline]
    #[must_use]
    pub fn optional(kind: AttributeKind) -> Self {
        Self::new(kind, Presence::Optional)
    }

    /// Computed attribute
    #[inline]
    #[must_use]
    pub fn computed(kind: AttributeKind) -> Self {
        Self::new(kind, Presence::Computed)
    }

    /// Optional and computed attribute
    #[inline]
    #[must_use]
    pub fn optional_computed(kind: AttributeKind) -> Self {
        Self::new(kind, Presence::OptionalComputed)
    }

    /// Mark as sensitive
    #[inline]
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Whether null is rejected
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    /// Whether values must be kept out of logs
    #[inline]
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }
}

/// Attribute set for one schema version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    version: u64,
    attributes: IndexMap<String, Attribute>,
}

impl Shape {
    /// Create empty shape
    #[inline]
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self {
            version,
            attributes: IndexMap::new(),
        }
    }

    /// Declare an attribute; a later declaration of the same name replaces
    /// the earlier one
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Schema version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Declared attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Whether `name` is declared
    #[inline]
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Declared attributes in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared attributes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether no attribute is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Decode stored bytes strictly under this shape.
    ///
    /// # Errors
    /// Any [`DecodeError`]; no partial record is returned.
    pub fn decode(&self, bytes: &[u8]) -> Result<Record, DecodeError> {
        let document: JsonValue =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Syntax(e.to_string()))?;
        self.decode_value(&document)
    }

    /// Decode an already parsed JSON document.
    ///
    /// # Errors
    /// See [`Shape::decode`].
    pub fn decode_value(&self, document: &JsonValue) -> Result<Record, DecodeError> {
        let object = match document {
            JsonValue::Object(object) => object,
            other => return Err(DecodeError::NotAnObject(json_kind(other))),
        };

        if let Some(extra) = object.keys().find(|k| !self.attributes.contains_key(*k)) {
            return Err(DecodeError::UnexpectedAttribute(extra.clone()));
        }

        let mut record = Record::new(self.version);
        for (name, attribute) in &self.attributes {
            let raw = object.get(name).unwrap_or(&JsonValue::Null);
            let value = decode_field(name, attribute.kind, raw)?;
            if attribute.is_required() && value.is_null() {
                return Err(DecodeError::MissingRequired(name.clone()));
            }
            record.insert(name.clone(), value);
        }
        Ok(record)
    }

    /// Encode a record under this shape.
    ///
    /// # Errors
    /// Any [`EncodeError`]; a mismatch here means the producer of `record`
    /// disagrees with the shape.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, EncodeError> {
        let document = self.encode_value(record)?;
        serde_json::to_vec(&document).map_err(|e| EncodeError::Serialization(e.to_string()))
    }

    /// Encode a record into a JSON document.
    ///
    /// # Errors
    /// See [`Shape::encode`].
    pub fn encode_value(&self, record: &Record) -> Result<JsonValue, EncodeError> {
        if record.version() != self.version {
            return Err(EncodeError::VersionMismatch {
                record: record.version(),
                shape: self.version,
            });
        }
        if let Some((extra, _)) = record.iter().find(|(k, _)| !self.declares(k)) {
            return Err(EncodeError::UnexpectedAttribute(extra.to_string()));
        }

        let mut object = Map::new();
        for (name, attribute) in &self.attributes {
            let value = record
                .get(name)
                .ok_or_else(|| EncodeError::MissingAttribute(name.clone()))?;
            if !value.fits(attribute.kind) {
                return Err(EncodeError::KindMismatch {
                    attribute: name.clone(),
                    expected: attribute.kind.to_string(),
                    found: value.variant_name().to_string(),
                });
            }
            if attribute.is_required() && value.is_null() {
                return Err(EncodeError::RequiredNull(name.clone()));
            }
            object.insert(name.clone(), encode_field(name, value)?);
        }
        Ok(JsonValue::Object(object))
    }
}

fn decode_field(name: &str, kind: AttributeKind, raw: &JsonValue) -> Result<FieldValue, DecodeError> {
    if raw.is_null() {
        return Ok(FieldValue::null_of(kind));
    }
    let mismatch = || DecodeError::type_mismatch(name, kind.to_string(), json_kind(raw));
    match kind {
        AttributeKind::String => raw
            .as_str()
            .map(FieldValue::string)
            .ok_or_else(mismatch),
        AttributeKind::StringList => {
            let items = raw.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|item| match item {
                    JsonValue::Null => Ok(None),
                    JsonValue::String(s) => Ok(Some(s.clone())),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::StringList)
        }
        AttributeKind::StringMap => {
            let entries = raw.as_object().ok_or_else(mismatch)?;
            entries
                .iter()
                .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())).ok_or_else(mismatch))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(FieldValue::StringMap)
        }
        AttributeKind::StringListMap => {
            let entries = raw.as_object().ok_or_else(mismatch)?;
            entries
                .iter()
                .map(|(k, v)| -> Result<(String, Vec<String>), DecodeError> {
                    let items = v.as_array().ok_or_else(mismatch)?;
                    let items = items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok((k.clone(), items))
                })
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(FieldValue::StringListMap)
        }
        AttributeKind::Dynamic => DynamicValue::from_persisted(raw)
            .map(FieldValue::Dynamic)
            .map_err(|source| DecodeError::Dynamic {
                attribute: name.to_string(),
                source,
            }),
        AttributeKind::Opaque => {
            if raw.is_object() {
                Ok(FieldValue::Opaque(raw.clone()))
            } else {
                Err(mismatch())
            }
        }
    }
}

fn encode_field(name: &str, value: &FieldValue) -> Result<JsonValue, EncodeError> {
    Ok(match value {
        FieldValue::Null => JsonValue::Null,
        FieldValue::String(s) => JsonValue::String(s.clone()),
        FieldValue::StringList(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| item.clone().map_or(JsonValue::Null, JsonValue::String))
                .collect(),
        ),
        FieldValue::StringMap(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        ),
        FieldValue::StringListMap(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(k, v)| {
                    let items = v.iter().cloned().map(JsonValue::String).collect();
                    (k.clone(), JsonValue::Array(items))
                })
                .collect(),
        ),
        FieldValue::Dynamic(dynamic) => dynamic.to_persisted(),
        FieldValue::Opaque(block) => match block {
            JsonValue::Null | JsonValue::Object(_) => block.clone(),
            _ => return Err(EncodeError::MalformedBlock(name.to_string())),
        },
    })
}
