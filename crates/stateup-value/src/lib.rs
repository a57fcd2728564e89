//! Stateup Value System
//!
//! Dynamic values and the coercion rules that widen legacy state into them.
//!
//! # Core Concepts
//!
//! - [`DynamicValue`]: dynamic-null, or a payload tagged with its type
//! - [`DynamicType`]: type descriptor carried next to every payload
//! - [`coerce`]: legacy scalar/list to dynamic value
//! - [`StringPolicy`]: how non-empty legacy strings are wrapped
//!
//! # Example
//!
//! ```
//! use stateup_value::{coerce, DynamicValue, LegacyValue, StringPolicy};
//!
//! let body = coerce(LegacyValue::Scalar(Some("hello")), StringPolicy::Verbatim).unwrap();
//! assert_eq!(body, DynamicValue::string("hello"));
//!
//! let empty = coerce(LegacyValue::Scalar(Some("")), StringPolicy::Verbatim).unwrap();
//! assert!(empty.is_null());
//! ```

#![warn(unreachable_pub)]

mod coerce;
mod dynamic;
mod error;
mod types;

pub use coerce::{coerce, coerce_list, coerce_scalar, LegacyKind, LegacyValue, StringPolicy};
pub use dynamic::DynamicValue;
pub use error::ValueError;
pub use types::{json_kind, DynamicType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
