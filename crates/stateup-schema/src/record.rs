//! Versioned records

use indexmap::IndexMap;

use crate::field::FieldValue;

/// One resource's state under a single schema version
///
/// Equality includes the version tag, so records of different versions are
/// never equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    version: u64,
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create empty record at `version`
    #[inline]
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self {
            version,
            fields: IndexMap::new(),
        }
    }

    /// Schema version tag
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Field value, `None` when absent
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// String field, `None` when absent, null or not a string
    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Insert or replace a field, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    /// Builder form of [`Record::insert`]
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Remove a field, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    /// Whether the field is present (null counts as present)
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of present fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_part_of_equality() {
        let a = Record::new(0).with("id", FieldValue::string("x"));
        let b = Record::new(2).with("id", FieldValue::string("x"));
        assert_ne!(a, b);
    }

    #[test]
    fn absent_and_null_differ() {
        let record = Record::new(0).with("when", FieldValue::Null);
        assert!(record.contains("when"));
        assert!(!record.contains("body"));
        assert_eq!(record.get_str("when"), None);
    }

    #[test]
    fn remove_keeps_order() {
        let mut record = Record::new(1)
            .with("a", FieldValue::Null)
            .with("b", FieldValue::Null)
            .with("c", FieldValue::Null);
        record.remove("b");
        let names: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
