//! Process API
//!
//! Serializable command surface for a GUI shell. Every command takes the shared
//! `AppState` and returns `Result<T, CommandError>`.

pub mod assets;
pub mod collections;
pub mod folders;
pub mod system;
pub mod tags;
pub mod thumbnails;

pub use assets::*;
pub use collections::*;
pub use folders::*;
pub use system::*;
pub use tags::*;
pub use thumbnails::*;

/// Result type shared by every command
pub type CommandResult<T> = Result<T, sushi_core::CommandError>;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use sushi_core::{
        AppSettings, Asset, DataHomePathProvider, Database, NoOpEventSink, SushiCore,
    };
    use tempfile::TempDir;

    use crate::AppState;

    /// State backed by an in-memory store; the TempDir hosts the data directory
    pub fn test_state() -> (TempDir, AppState) {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();

        let core = SushiCore::with_database(
            Arc::new(db),
            Arc::new(DataHomePathProvider::with_base_dir(tmp.path().join("data"))),
            Arc::new(NoOpEventSink),
            AppSettings::default(),
        )
        .unwrap();

        (tmp, AppState::new(core))
    }

    /// Register `dir` with the given model files already written into it
    pub fn library(state: &AppState, dir: &Path, files: &[&str]) -> Vec<Asset> {
        std::fs::create_dir_all(dir).unwrap();
        for name in files {
            std::fs::write(dir.join(name), b"glTF").unwrap();
        }
        super::add_watch_folder(state, dir.to_string_lossy().into_owned()).unwrap()
    }
}
