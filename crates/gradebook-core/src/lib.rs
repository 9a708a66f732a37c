//! Core types and trait definitions for the gradebook averaging engine.
//!
//! This crate has no HTTP or database dependencies. It holds
//! the typed identifiers, the reference and derived records, the pure
//! averaging / ranking / classification functions, and the
//! [`store::GradebookStore`] abstraction every other crate builds on.

pub mod average;
pub mod code;
pub mod derived;
pub mod error;
pub mod performance;
pub mod policy;
pub mod rank;
pub mod record;
pub mod store;

pub use error::{Error, ErrorClass, Result};
