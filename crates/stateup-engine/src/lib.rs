//! Stateup Engine
//!
//! Brings persisted records forward from the schema version they were stored
//! under to the current one.
//!
//! # Core Concepts
//!
//! - [`MappingTable`]: declarative per-field rules for one step
//! - [`UpgradeStep`]: decode, map, encode; errors become [`Diagnostics`]
//! - [`UpgradeChain`]: one step per source version, composed in order
//! - [`resources`]: shapes and tables for concrete resources
//!
//! # Example
//!
//! ```
//! use stateup_engine::resources::action;
//! use stateup_engine::{UpgradeOptions, VersionedState};
//!
//! let chain = action::upgrade_chain(UpgradeOptions::default()).unwrap();
//! let stored = VersionedState::new(
//!     0,
//!     r#"{"type": "Microsoft.Foo/bar", "resource_id": "/sub/foo", "body": "hello"}"#,
//! );
//!
//! let resolution = chain.resolve(&stored);
//! assert!(resolution.is_success());
//! assert_eq!(resolution.state.unwrap().version, action::CURRENT_VERSION);
//! ```
//!
//! [`Diagnostics`]: stateup_schema::Diagnostics

#![warn(unreachable_pub)]

mod chain;
mod error;
mod mapping;
mod options;
pub mod resources;
mod step;

pub use chain::{Hop, MigrationPath, Resolution, UpgradeChain, VersionedState};
pub use error::{ChainConfigurationError, TableError, UpgradeError};
pub use mapping::{FieldRule, MappingTable, Synthesis};
pub use options::{MapSynthesis, UpgradeOptions};
pub use step::{FnStep, TableStep, UpgradeResponse, UpgradeStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
