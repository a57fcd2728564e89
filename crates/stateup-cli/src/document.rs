//! State documents on disk

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use stateup_engine::VersionedState;

/// Stored state: schema version plus attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateDocument {
    /// Version the attributes are encoded under
    pub schema_version: u64,
    /// Encoded record
    pub attributes: JsonValue,
}

impl StateDocument {
    /// Parse a JSON document
    ///
    /// # Errors
    /// Returns error if the bytes are not a state document
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("not a state document")
    }

    /// Attributes as versioned bytes for the upgrade chain
    ///
    /// # Errors
    /// Returns error if the attributes cannot be serialized
    pub fn to_versioned(&self) -> anyhow::Result<VersionedState> {
        let bytes = serde_json::to_vec(&self.attributes).context("failed to encode attributes")?;
        Ok(VersionedState::new(self.schema_version, bytes))
    }

    /// Document for upgraded state
    ///
    /// # Errors
    /// Returns error if the state bytes are not JSON
    pub fn from_versioned(state: &VersionedState) -> anyhow::Result<Self> {
        let attributes =
            serde_json::from_slice(&state.bytes).context("upgraded state is not valid JSON")?;
        Ok(Self {
            schema_version: state.version,
            attributes,
        })
    }

    /// Pretty JSON text
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_pretty_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize state document")
    }
}
