//! Directory service contract
//!
//! The capability surface the explorer engine consumes. Implementations own
//! all filesystem I/O; the engine never touches the disk directly.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::util::errors::TreelineResult;

/// One filesystem node as currently known to the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Last path segment including the extension
    pub name: String,
    /// Slash-normalized path relative to the watched root; unique per snapshot
    pub path: String,
    /// Fully resolved path for host-level operations (open/reveal)
    pub absolute_path: String,
    pub is_directory: bool,
    /// Derived: dot-prefixed name
    pub is_hidden: bool,
    /// Lower-cased suffix including the dot; empty for directories or none
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<i64>,
}

/// Filesystem read/mutate primitives consumed by the explorer engine.
///
/// Listing order is owned by the implementation and must be stable across
/// reads; the engine renders entries exactly as returned.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Recursively list `current_path`, descending only into directories
    /// present in `expanded`. The returned list is depth-first: a parent is
    /// immediately followed by its children when expanded.
    ///
    /// Fails atomically: any I/O error fails the whole read, never a partial
    /// listing.
    async fn read_directory_recursive(
        &self,
        current_path: &str,
        expanded: &BTreeSet<String>,
    ) -> TreelineResult<Vec<FileEntry>>;

    /// Create an empty file named `name` inside `dir_path`. Fails if the name
    /// collides with an existing entry.
    async fn create_file(&self, dir_path: &str, name: &str) -> TreelineResult<()>;

    /// Create a directory named `name` inside `dir_path`. Fails on collision.
    async fn create_directory(&self, dir_path: &str, name: &str) -> TreelineResult<()>;

    /// Rename `target_path` to `new_name` within its parent directory. Fails
    /// if a sibling with that name exists.
    async fn rename(&self, target_path: &str, new_name: &str) -> TreelineResult<()>;

    /// Move `target_path` to a recoverable trash location.
    async fn delete(&self, target_path: &str) -> TreelineResult<()>;

    /// Open the entry with the platform default application.
    async fn open_with_system_app(&self, path: &str) -> TreelineResult<()>;

    /// Reveal the entry in the platform file manager.
    async fn show_in_folder(&self, path: &str) -> TreelineResult<()>;
}
