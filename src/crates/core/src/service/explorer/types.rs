//! Explorer view-state types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::infrastructure::filesystem::FileEntry;
use crate::util::errors::TreelineError;

/// The single source of truth rendered by the UI.
///
/// Snapshots are immutable once installed; every transition replaces the
/// whole value, so a listener never observes a partial update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerViewState {
    /// True only while a refresh is in flight
    pub loading: bool,
    /// Last refresh failure, cleared by the next successful refresh
    pub error: Option<String>,
    /// Flattened, expansion-filtered projection in directory-service order
    pub entries: Vec<FileEntry>,
    /// Directory paths whose children are included in `entries`
    pub expanded_paths: BTreeSet<String>,
    /// At most one selected entry
    pub selected_path: Option<String>,
    /// Root-relative subtree being displayed; empty string is the vault root
    pub current_path: String,
}

impl ExplorerViewState {
    pub fn new(current_path: impl Into<String>) -> Self {
        Self {
            loading: false,
            error: None,
            entries: Vec::new(),
            expanded_paths: BTreeSet::new(),
            selected_path: None,
            current_path: current_path.into(),
        }
    }

    pub fn entry_at(&self, path: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded_paths.contains(path)
    }
}

/// Uniform outcome record for every fallible user operation.
///
/// Failures are values: no explorer operation raises, so the rendering layer
/// always gets something to display as a transient notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    /// Human-readable outcome description, present on success and failure
    pub message: String,
    /// Lower-level diagnostic, present only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: &TreelineError) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.to_string()),
        }
    }
}
