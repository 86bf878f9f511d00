// Treeline Core Library - Platform-agnostic explorer state engine
// Three-layer architecture: Util -> Infrastructure -> Service

pub mod infrastructure; // Infrastructure layer - directory service, path management
pub mod service; // Service layer - explorer state engine
pub mod util; // Utility layer - errors, shared helpers

// Export main types
pub use util::errors::{TreelineError, TreelineResult};

// Export infrastructure components
pub use infrastructure::filesystem::{DirectoryService, FileEntry, LocalDirectoryService};

// Export service layer components
pub use service::explorer::{
    ExplorerManager, ExplorerViewState, OperationResult, Subscription,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
