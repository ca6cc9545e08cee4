//! Sushi Core Library
//!
//! Indexing and metadata engine for 3D model files (`.glb` / `.gltf`). It is
//! frontend-agnostic: a GUI shell or the bundled CLI drive it through
//! `SushiCore`.
//!
//! # Architecture
//!
//! - `models`: Data structures (Asset, Tag, Collection, WatchFolder, Settings)
//! - `db`: SQLite metadata store with one DAO file per entity
//! - `services`: Scanner, watch folder registry, settings persistence
//! - `server`: Loopback HTTP endpoint streaming model files to the renderer
//! - `events`: Event emission abstraction (EventSink trait)
//! - `paths`: Data directory layout (PathProvider trait)
//! - `jobs`: Scan cancellation
//! - `utils`: Errors, format detection and path containment
//!
//! # Example
//!
//! ```no_run
//! use sushi_core::{events::NoOpEventSink, paths::DataHomePathProvider, SushiCore};
//! use std::sync::Arc;
//!
//! let core = SushiCore::new(
//!     Arc::new(DataHomePathProvider::new()),
//!     Arc::new(NoOpEventSink),
//! )
//! .unwrap();
//!
//! let report = core.scanner.scan_all().unwrap();
//! println!("{} model files indexed", report.total_found());
//! ```

pub mod db;
pub mod events;
pub mod jobs;
pub mod models;
pub mod paths;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use db::{Database, DatabaseStats};
pub use events::{EventSink, LoggingEventSink, NoOpEventSink, SharedEventSink};
pub use jobs::{CancelToken, ScanJobs};
pub use models::{AppSettings, Asset, Collection, Tag, TagWithCount, WatchFolder};
pub use paths::{DataHomePathProvider, PathProvider, SharedPathProvider};
pub use server::{FileServer, FileServerConfig};
pub use services::{
    ScanAllReport, ScanOptions, ScanOutcome, Scanner, SettingsManager, WatchFolderRegistry,
    WatchRoots,
};
pub use utils::{AppError, AppResult, CommandError};

use std::sync::Arc;

/// Sushi core application context.
///
/// Owns the store handle and everything built on top of it. One per process.
pub struct SushiCore {
    pub db: Arc<Database>,
    pub path_provider: SharedPathProvider,
    pub event_sink: SharedEventSink,
    pub settings: AppSettings,
    pub jobs: Arc<ScanJobs>,
    pub roots: WatchRoots,
    pub registry: WatchFolderRegistry,
    pub scanner: Scanner,
}

impl SushiCore {
    /// Open (and migrate) the store, load settings and wire the services.
    ///
    /// Failing to open or migrate the database is fatal for the caller.
    pub fn new(path_provider: SharedPathProvider, event_sink: SharedEventSink) -> AppResult<Self> {
        path_provider.ensure_layout()?;

        let settings = SettingsManager::new(path_provider.as_ref())?.load()?;

        let db = Database::open_with_provider(path_provider.as_ref())?;
        db.init()?;

        Self::with_database(Arc::new(db), path_provider, event_sink, settings)
    }

    /// Wire services around an already initialized store
    pub fn with_database(
        db: Arc<Database>,
        path_provider: SharedPathProvider,
        event_sink: SharedEventSink,
        settings: AppSettings,
    ) -> AppResult<Self> {
        let jobs = Arc::new(ScanJobs::new());
        let roots = WatchRoots::new();

        let registry = WatchFolderRegistry::new(db.clone(), roots.clone(), jobs.clone());
        registry.refresh_roots()?;

        let scanner = Scanner::new(
            db.clone(),
            ScanOptions::from(&settings.scan),
            event_sink.clone(),
            jobs.clone(),
        );

        Ok(Self {
            db,
            path_provider,
            event_sink,
            settings,
            jobs,
            roots,
            registry,
            scanner,
        })
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn paths(&self) -> &SharedPathProvider {
        &self.path_provider
    }

    /// File server configuration derived from settings
    pub fn file_server_config(&self) -> FileServerConfig {
        FileServerConfig::from(&self.settings.file_server)
    }

    /// Start the loopback file server sharing this context's watch roots
    pub async fn start_file_server(&self) -> AppResult<FileServer> {
        FileServer::start(self.file_server_config(), self.roots.clone()).await
    }

    /// Stop every running scan
    pub fn shutdown(&self) {
        self.jobs.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sushi_core_creation() {
        let tmp = TempDir::new().unwrap();
        let path_provider = Arc::new(DataHomePathProvider::with_base_dir(tmp.path().join("sushi")));
        let event_sink: SharedEventSink = Arc::new(NoOpEventSink);

        let core = SushiCore::new(path_provider.clone(), event_sink).unwrap();

        let stats = core.db.stats().unwrap();
        assert_eq!(stats.asset_count, 0);
        assert!(path_provider.database_path().exists());
        assert!(path_provider.thumbnails_dir().is_dir());
        assert!(core.file_server_config().restrict_to_watch_folders);
    }

    #[test]
    fn test_roots_loaded_on_startup() {
        let tmp = TempDir::new().unwrap();
        let models = tmp.path().join("models");
        fs::create_dir_all(&models).unwrap();
        fs::write(models.join("tree.glb"), b"glTF").unwrap();
        let provider: SharedPathProvider =
            Arc::new(DataHomePathProvider::with_base_dir(tmp.path().join("data")));

        {
            let core = SushiCore::new(provider.clone(), Arc::new(NoOpEventSink)).unwrap();
            let folder = core.registry.add(&models).unwrap();
            let outcome = core.scanner.scan_folder(&folder).unwrap();
            assert_eq!(outcome.found, 1);
        }

        let reopened = SushiCore::new(provider, Arc::new(NoOpEventSink)).unwrap();
        let canonical = fs::canonicalize(&models).unwrap();
        assert!(reopened.roots.contains(&canonical.join("tree.glb")));
        assert_eq!(reopened.db.list_assets().unwrap().len(), 1);
    }
}
