//! Utility layer
//!
//! Errors and small shared helpers used by every other layer.

pub mod errors;

pub use errors::{TreelineError, TreelineResult};
