//! Explorer state engine
//!
//! Owns the canonical view-state snapshot, serializes refreshes, debounces
//! external change notifications and wraps every mutating operation with a
//! refresh-on-success policy.

pub mod manager;
pub mod observable;
pub mod types;

pub use manager::{ExplorerManager, CHANGE_DEBOUNCE_DELAY, WINDOW_FOCUS_DEBOUNCE_DELAY};
pub use observable::{ObservableState, Subscription};
pub use types::{ExplorerViewState, OperationResult};
