//! Stateup Schema Layer
//!
//! Declared shapes, versioned records and the diagnostics channel.
//!
//! # Core Concepts
//!
//! - [`Shape`]: attribute set valid for one schema version; decodes and
//!   encodes [`Record`]s
//! - [`Record`]: ordered field values tagged with a schema version
//! - [`FieldValue`]: null, string, list, map, dynamic or opaque block
//! - [`Diagnostics`]: ordered `(severity, summary, detail)` entries
//!
//! # Example
//!
//! ```
//! use stateup_schema::{Attribute, AttributeKind, Shape};
//!
//! let shape = Shape::new(0)
//!     .with_attribute("type", Attribute::required(AttributeKind::String))
//!     .with_attribute("body", Attribute::optional(AttributeKind::String));
//!
//! let record = shape.decode(br#"{"type": "Microsoft.Foo/bar"}"#).unwrap();
//! assert_eq!(record.get_str("type"), Some("Microsoft.Foo/bar"));
//! assert!(record.get("body").unwrap().is_null());
//! ```

#![warn(unreachable_pub)]

mod diagnostics;
mod error;
mod field;
mod record;
mod shape;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{DecodeError, EncodeError};
pub use field::{AttributeKind, FieldValue};
pub use record::Record;
pub use shape::{Attribute, Presence, Shape};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
