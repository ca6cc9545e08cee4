//! Sushi data models

pub mod asset;
pub mod collection;
pub mod folder;
pub mod settings;
pub mod tag;

pub use asset::{now_timestamp, Asset};
pub use collection::{Collection, CreateCollection, UpdateCollection, DEFAULT_COLLECTION_ICON};
pub use folder::WatchFolder;
pub use settings::{AppSettings, FileServerSettings, LibrarySettings, ScanSettings};
pub use tag::{Tag, TagWithCount};
