//! Filesystem infrastructure
//!
//! Directory service contract, the local `tokio::fs` implementation, and
//! root-relative path management.

pub mod directory_service;
pub mod local;
pub mod path_utils;

pub use directory_service::{DirectoryService, FileEntry};
pub use local::{LocalDirectoryService, TRASH_DIR_NAME};
pub use path_utils::{join_rel, name_of, normalize_rel, parent_of, validate_entry_name};
