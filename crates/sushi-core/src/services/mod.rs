//! Sushi services
//!
//! Filesystem scanning, watch folder bookkeeping and settings persistence.

pub mod registry;
pub mod scanner;
pub mod settings;

pub use registry::{WatchFolderRegistry, WatchRoots};
pub use scanner::{FolderFailure, ScanAllReport, ScanOptions, ScanOutcome, Scanner};
pub use settings::SettingsManager;
