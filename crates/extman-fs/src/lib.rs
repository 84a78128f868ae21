//! Filesystem layer for the extension manager
//!
//! Provides normalized paths, atomic document writes, the advisory install
//! lock, the host directory layout and asset staging.

pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod lock;
pub mod path;
pub mod staging;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use layout::HostLayout;
pub use lock::InstallLock;
pub use path::NormalizedPath;
pub use staging::{StageOutcome, copy_directory, remove_directory};
