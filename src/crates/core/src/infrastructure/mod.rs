//! Infrastructure layer
//!
//! Directory service contract, the local filesystem implementation, and path
//! management.

pub mod filesystem;

pub use filesystem::{
    DirectoryService, FileEntry, LocalDirectoryService, TRASH_DIR_NAME,
};
