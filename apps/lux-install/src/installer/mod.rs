//! Release resolution and installation pipeline.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS and architecture detection
//! - [`release`] - Latest-release lookup
//! - [`matcher`] - Platform asset selection
//! - [`download`] - Streaming HTTP download
//! - [`archive`] - ZIP and tar.gz extraction
//! - [`artifact`] - Placing a downloaded asset as a runnable binary
//! - [`search_path`] - Persistent search path registration
//! - [`shell`] - Shell profile store (Unix)
//! - [`verify`] - Post-install version check

pub mod archive;
pub mod artifact;
pub mod download;
pub mod matcher;
pub mod platform;
pub mod release;
pub mod search_path;
#[cfg(not(windows))]
pub mod shell;
pub mod verify;

pub use artifact::{InstallTarget, install_artifact};
pub use matcher::{MatchStrategy, SelectionRule};
pub use platform::Platform;
pub use release::ReleaseClient;
pub use search_path::{Registration, SearchPathStore, register};
pub use verify::{Verification, verify_binary};
