//! Data directory layout.
//!
//! Everything the engine persists lives under one application directory:
//! the database, settings, logs and the (reserved) thumbnail cache.

use std::path::PathBuf;
use std::sync::Arc;

use crate::utils::error::AppResult;

/// Directory name appended to the data home
pub const APP_DIR_NAME: &str = "sushi";

/// Environment variable that overrides the data home
pub const DATA_HOME_ENV: &str = "SUSHI_DATA_HOME";

/// Resolves where application data lives.
pub trait PathProvider: Send + Sync {
    /// Root application data directory.
    fn app_data_dir(&self) -> PathBuf;

    fn database_path(&self) -> PathBuf {
        self.app_data_dir().join("sushi.db")
    }

    /// Reserved for rendered thumbnails; created at startup.
    fn thumbnails_dir(&self) -> PathBuf {
        self.app_data_dir().join("thumbnails")
    }

    fn settings_path(&self) -> PathBuf {
        self.app_data_dir().join("settings.json")
    }

    fn logs_dir(&self) -> PathBuf {
        self.app_data_dir().join("logs")
    }

    /// Create the directories the engine writes into.
    fn ensure_layout(&self) -> AppResult<()> {
        std::fs::create_dir_all(self.app_data_dir())?;
        std::fs::create_dir_all(self.thumbnails_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

/// Shared reference to a PathProvider implementation.
pub type SharedPathProvider = Arc<dyn PathProvider>;

/// XDG-style provider: `<data home>/sushi/`.
///
/// The data home is `$SUSHI_DATA_HOME`, else `$XDG_DATA_HOME`, else the platform
/// data directory, else `~/.local/share`.
#[derive(Debug, Clone)]
pub struct DataHomePathProvider {
    app_data_dir: PathBuf,
}

impl DataHomePathProvider {
    pub fn new() -> Self {
        let data_home = resolve_data_home(|key| std::env::var(key).ok());
        Self {
            app_data_dir: data_home.join(APP_DIR_NAME),
        }
    }

    /// Use `base_dir` as the application directory itself.
    ///
    /// Useful for testing and for the `--data-dir` flag.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            app_data_dir: base_dir,
        }
    }
}

impl Default for DataHomePathProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PathProvider for DataHomePathProvider {
    fn app_data_dir(&self) -> PathBuf {
        self.app_data_dir.clone()
    }
}

fn resolve_data_home<F>(env: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    [DATA_HOME_ENV, "XDG_DATA_HOME"]
        .iter()
        .filter_map(|key| env(*key))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
}
