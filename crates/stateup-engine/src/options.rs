//! Engine options

use serde::{Deserialize, Serialize};
use stateup_value::StringPolicy;

/// What to write into map fields that have no legacy source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSynthesis {
    /// Map with zero entries
    #[default]
    Empty,
    /// Null map
    Null,
}

/// Options shared by every table-driven step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeOptions {
    /// How non-empty legacy strings become dynamic values
    pub string_policy: StringPolicy,
    /// What unpopulated map fields are set to
    pub unpopulated_maps: MapSynthesis,
}

impl UpgradeOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With string policy
    #[inline]
    #[must_use]
    pub fn with_string_policy(mut self, policy: StringPolicy) -> Self {
        self.string_policy = policy;
        self
    }

    /// With unpopulated map synthesis
    #[inline]
    #[must_use]
    pub fn with_unpopulated_maps(mut self, synthesis: MapSynthesis) -> Self {
        self.unpopulated_maps = synthesis;
        self
    }
}
