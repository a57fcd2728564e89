//! Resource catalog
//!
//! Declared shapes and mapping tables for concrete resources.

pub mod action;
