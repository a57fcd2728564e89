//! Upgrade chain registry
//!
//! Maps each source version to the step that upgrades it and composes steps
//! until a record reaches a version with no registered step.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stateup_schema::Diagnostics;

use crate::error::ChainConfigurationError;
use crate::step::UpgradeStep;

/// Encoded state tagged with its schema version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedState {
    /// Schema version the bytes are encoded under
    pub version: u64,
    /// Encoded record
    pub bytes: Vec<u8>,
}

impl VersionedState {
    /// Create versioned state
    #[inline]
    pub fn new(version: u64, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            version,
            bytes: bytes.into(),
        }
    }
}

/// One applied step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    /// Step name
    pub step: String,
    /// Version read
    pub from: u64,
    /// Version produced
    pub to: u64,
}

/// Steps applied while resolving one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPath {
    from_version: u64,
    hops: Vec<Hop>,
}

impl MigrationPath {
    /// Empty path starting at `version`
    #[inline]
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self {
            from_version: version,
            hops: Vec::new(),
        }
    }

    fn push(&mut self, step: &dyn UpgradeStep) {
        self.hops.push(Hop {
            step: step.name().to_string(),
            from: step.from_version(),
            to: step.to_version(),
        });
    }

    /// Version the record started at
    #[inline]
    #[must_use]
    pub fn from_version(&self) -> u64 {
        self.from_version
    }

    /// Version the last applied step produced
    #[must_use]
    pub fn to_version(&self) -> u64 {
        self.hops.last().map_or(self.from_version, |hop| hop.to)
    }

    /// Applied steps in order
    #[inline]
    #[must_use]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Whether no step was applied
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }
}

impl fmt::Display for MigrationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.from_version)?;
        for hop in &self.hops {
            write!(f, " -[{}]-> {}", hop.step, hop.to)?;
        }
        Ok(())
    }
}

/// Outcome of [`UpgradeChain::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Upgraded state, `None` on failure
    pub state: Option<VersionedState>,
    /// Diagnostics from every applied step
    pub diagnostics: Diagnostics,
    /// Steps applied, up to and excluding a failing one
    pub path: MigrationPath,
}

impl Resolution {
    fn failure(diagnostics: Diagnostics, path: MigrationPath) -> Self {
        Self {
            state: None,
            diagnostics,
            path,
        }
    }

    /// Whether the record reached a terminal version without errors
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state.is_some() && !self.diagnostics.has_error()
    }
}

/// Registry of upgrade steps keyed by source version
#[derive(Debug, Clone, Default)]
pub struct UpgradeChain {
    steps: BTreeMap<u64, Arc<dyn UpgradeStep>>,
    current_version: Option<u64>,
}

impl UpgradeChain {
    /// Create empty chain with no declared current version
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the current version
    ///
    /// Records must end up exactly at this version.
    #[inline]
    #[must_use]
    pub fn with_current_version(mut self, version: u64) -> Self {
        self.current_version = Some(version);
        self
    }

    /// Build a chain from steps and check it
    ///
    /// # Errors
    /// Any registration or reachability error
    pub fn from_steps<I>(current_version: u64, steps: I) -> Result<Self, ChainConfigurationError>
    where
        I: IntoIterator<Item = Arc<dyn UpgradeStep>>,
    {
        let mut chain = Self::new().with_current_version(current_version);
        for step in steps {
            chain.register_step(step)?;
        }
        chain.validate()?;
        Ok(chain)
    }

    /// Register `step` for records tagged `from_version`
    ///
    /// # Errors
    /// - [`ChainConfigurationError::DuplicateStep`] if the version is taken
    /// - [`ChainConfigurationError::VersionMismatch`] if the step reads another version
    /// - [`ChainConfigurationError::NonAdvancing`] if the step does not move forward
    /// - [`ChainConfigurationError::BeyondCurrent`] if the step starts at or past current
    /// - whatever [`UpgradeStep::validate`] reports
    pub fn register(
        &mut self,
        from_version: u64,
        step: Arc<dyn UpgradeStep>,
    ) -> Result<(), ChainConfigurationError> {
        if self.steps.contains_key(&from_version) {
            return Err(ChainConfigurationError::DuplicateStep(from_version));
        }
        let name = step.name().to_string();
        if step.from_version() != from_version {
            return Err(ChainConfigurationError::VersionMismatch {
                name,
                registered: from_version,
                actual: step.from_version(),
            });
        }
        if step.to_version() <= from_version {
            return Err(ChainConfigurationError::NonAdvancing {
                name,
                from: from_version,
                to: step.to_version(),
            });
        }
        if let Some(current) = self.current_version {
            if from_version >= current {
                return Err(ChainConfigurationError::BeyondCurrent {
                    name,
                    from: from_version,
                    current,
                });
            }
        }
        step.validate()?;

        tracing::debug!(step = %name, from = from_version, to = step.to_version(), "registered upgrade step");
        self.steps.insert(from_version, step);
        Ok(())
    }

    /// Register `step` under its own source version
    ///
    /// # Errors
    /// See [`UpgradeChain::register`]
    pub fn register_step(&mut self, step: Arc<dyn UpgradeStep>) -> Result<(), ChainConfigurationError> {
        self.register(step.from_version(), step)
    }

    /// Check that every registered version reaches the current version
    ///
    /// Without a declared current version every chain is reachable.
    ///
    /// # Errors
    /// [`ChainConfigurationError::MissingStep`] for the first dead end
    pub fn validate(&self) -> Result<(), ChainConfigurationError> {
        let Some(current) = self.current_version else {
            return Ok(());
        };
        for step in self.steps.values() {
            let mut version = step.to_version();
            while let Some(next) = self.steps.get(&version) {
                version = next.to_version();
            }
            if version != current {
                return Err(ChainConfigurationError::MissingStep(version));
            }
        }
        Ok(())
    }

    /// Whether a step is registered for `version`
    #[inline]
    #[must_use]
    pub fn contains(&self, version: u64) -> bool {
        self.steps.contains_key(&version)
    }

    /// Step registered for `version`
    #[inline]
    #[must_use]
    pub fn step(&self, version: u64) -> Option<&Arc<dyn UpgradeStep>> {
        self.steps.get(&version)
    }

    /// Registered source versions, ascending
    pub fn versions(&self) -> impl Iterator<Item = u64> + '_ {
        self.steps.keys().copied()
    }

    /// Declared current version
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> Option<u64> {
        self.current_version
    }

    /// Number of registered steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Bring `state` forward until no step is registered for its version.
    ///
    /// Steps run strictly in sequence. The first step reporting an error
    /// aborts the chain and the resolution carries no state.
    #[must_use]
    pub fn resolve(&self, state: &VersionedState) -> Resolution {
        let mut diagnostics = Diagnostics::new();
        let mut path = MigrationPath::new(state.version);

        if let Some(current) = self.current_version {
            if state.version > current {
                diagnostics.add_error(
                    "unsupported schema version",
                    format!(
                        "record is version {}, newer than current version {current}",
                        state.version
                    ),
                );
                tracing::warn!(version = state.version, current, "record newer than current version");
                return Resolution::failure(diagnostics, path);
            }
        }

        let mut version = state.version;
        let mut bytes = state.bytes.clone();
        while let Some(step) = self.steps.get(&version) {
            let response = step.upgrade(&bytes);
            diagnostics.append(response.diagnostics);
            if diagnostics.has_error() {
                tracing::warn!(step = step.name(), from = version, "upgrade chain aborted");
                return Resolution::failure(diagnostics, path);
            }
            let Some(next) = response.state else {
                diagnostics.add_error(
                    format!("upgrade step {} produced no state", step.name()),
                    format!("upgrading from version {version}"),
                );
                return Resolution::failure(diagnostics, path);
            };
            path.push(step.as_ref());
            version = step.to_version();
            bytes = next;
        }

        if let Some(current) = self.current_version {
            if version != current {
                diagnostics.add_error(
                    "no upgrade path to current version",
                    format!("record stopped at version {version}, current version is {current}"),
                );
                tracing::warn!(version, current, "upgrade chain stopped short");
                return Resolution::failure(diagnostics, path);
            }
        }

        tracing::info!(from = state.version, to = version, hops = path.hops().len(), "resolved state");
        Resolution {
            state: Some(VersionedState { version, bytes }),
            diagnostics,
            path,
        }
    }
}
