//! Upgrade steps
//!
//! A step turns bytes encoded under one version into bytes encoded under a
//! later version. [`TableStep`] is the table-driven implementation used by
//! the resource catalog; [`FnStep`] wraps a hand-written function.

use std::fmt::{self, Debug};

use stateup_schema::{Diagnostic, Diagnostics, Record, Shape};

use crate::error::{ChainConfigurationError, UpgradeError};
use crate::mapping::MappingTable;
use crate::options::UpgradeOptions;

/// One version-to-version migration
pub trait UpgradeStep: Send + Sync + Debug {
    /// Version this step reads
    fn from_version(&self) -> u64;

    /// Version this step produces
    fn to_version(&self) -> u64;

    /// Step name (for diagnostics and logs)
    fn name(&self) -> &str;

    /// Upgrade one encoded record
    ///
    /// Never fails with `Err`; problems are reported in the returned
    /// diagnostics and a failed step carries no state.
    fn upgrade(&self, state: &[u8]) -> UpgradeResponse;

    /// Check the step's own configuration
    ///
    /// # Errors
    /// Returns error if the step can never succeed as configured
    fn validate(&self) -> Result<(), ChainConfigurationError> {
        Ok(())
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradeResponse {
    /// Upgraded state, `None` on failure
    pub state: Option<Vec<u8>>,
    /// Diagnostics produced by the step
    pub diagnostics: Diagnostics,
}

impl UpgradeResponse {
    /// Successful response
    #[inline]
    #[must_use]
    pub fn success(state: Vec<u8>) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Failed response carrying `diagnostics`
    #[inline]
    #[must_use]
    pub fn failure(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    /// Whether the step produced state and no error diagnostic
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state.is_some() && !self.diagnostics.has_error()
    }
}

impl From<Result<Vec<u8>, UpgradeError>> for UpgradeResponse {
    fn from(result: Result<Vec<u8>, UpgradeError>) -> Self {
        match result {
            Ok(state) => Self::success(state),
            Err(err) => Self::failure(Diagnostic::from(&err).into()),
        }
    }
}

/// Step driven by a [`MappingTable`] between two declared shapes
#[derive(Debug, Clone)]
pub struct TableStep {
    name: String,
    prior: Shape,
    next: Shape,
    table: MappingTable,
    options: UpgradeOptions,
}

impl TableStep {
    /// Create step with default options
    pub fn new(name: impl Into<String>, prior: Shape, next: Shape, table: MappingTable) -> Self {
        Self {
            name: name.into(),
            prior,
            next,
            table,
            options: UpgradeOptions::default(),
        }
    }

    /// With engine options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: UpgradeOptions) -> Self {
        self.options = options;
        self
    }

    /// Shape this step decodes with
    #[inline]
    #[must_use]
    pub fn prior_shape(&self) -> &Shape {
        &self.prior
    }

    /// Shape this step encodes with
    #[inline]
    #[must_use]
    pub fn next_shape(&self) -> &Shape {
        &self.next
    }

    /// Mapping table
    #[inline]
    #[must_use]
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> &UpgradeOptions {
        &self.options
    }

    /// Map an already decoded record
    ///
    /// # Errors
    /// Returns [`UpgradeError::Coercion`] if a coerced field fails
    pub fn upgrade_record(&self, prior: &Record) -> Result<Record, UpgradeError> {
        self.table.apply(prior, &self.next, &self.options)
    }

    /// Decode, map and encode
    ///
    /// # Errors
    /// The first decode, coercion or encode failure
    pub fn try_upgrade(&self, state: &[u8]) -> Result<Vec<u8>, UpgradeError> {
        let prior = self.prior.decode(state)?;
        let next = self.upgrade_record(&prior)?;
        Ok(self.next.encode(&next)?)
    }
}

impl UpgradeStep for TableStep {
    fn from_version(&self) -> u64 {
        self.prior.version()
    }

    fn to_version(&self) -> u64 {
        self.next.version()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn upgrade(&self, state: &[u8]) -> UpgradeResponse {
        let result = self.try_upgrade(state);
        if let Err(err) = &result {
            tracing::warn!(step = %self.name, error = %err, "upgrade step failed");
        }
        result.into()
    }

    fn validate(&self) -> Result<(), ChainConfigurationError> {
        self.table
            .validate(&self.prior, &self.next)
            .map_err(|source| ChainConfigurationError::Table {
                name: self.name.clone(),
                source,
            })
    }
}

type StepFn = dyn Fn(&[u8]) -> Result<Vec<u8>, UpgradeError> + Send + Sync;

/// Step backed by a function
pub struct FnStep {
    name: String,
    from: u64,
    to: u64,
    func: Box<StepFn>,
}

impl FnStep {
    /// Create step from `from` to `to`
    pub fn new<F>(name: impl Into<String>, from: u64, to: u64, func: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>, UpgradeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            from,
            to,
            func: Box::new(func),
        }
    }
}

impl Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

impl UpgradeStep for FnStep {
    fn from_version(&self) -> u64 {
        self.from
    }

    fn to_version(&self) -> u64 {
        self.to
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn upgrade(&self, state: &[u8]) -> UpgradeResponse {
        let result = (self.func)(state);
        if let Err(err) = &result {
            tracing::warn!(step = %self.name, error = %err, "upgrade step failed");
        }
        result.into()
    }
}
