//! Service layer
//!
//! The explorer state engine consumed by rendering layers.

pub mod explorer;

pub use explorer::{ExplorerManager, ExplorerViewState, OperationResult, Subscription};
