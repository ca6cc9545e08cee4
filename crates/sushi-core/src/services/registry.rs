//! Watch folder registry
//!
//! Bookkeeping for scan roots. Every change is mirrored into `WatchRoots`, the
//! snapshot the file server consults for containment.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::db::Database;
use crate::jobs::ScanJobs;
use crate::models::WatchFolder;
use crate::utils::error::{AppError, AppResult};
use crate::utils::is_within_roots;

/// Shared, read-mostly list of registered root directories
#[derive(Debug, Clone, Default)]
pub struct WatchRoots {
    inner: Arc<RwLock<Vec<PathBuf>>>,
}

impl WatchRoots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.inner.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn replace(&self, roots: Vec<PathBuf>) {
        if let Ok(mut inner) = self.inner.write() {
            *inner = roots;
        }
    }

    /// True when `path` lies lexically under one of the roots
    pub fn contains(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|roots| is_within_roots(path, &roots))
            .unwrap_or(false)
    }
}

pub struct WatchFolderRegistry {
    db: Arc<Database>,
    roots: WatchRoots,
    jobs: Arc<ScanJobs>,
}

impl WatchFolderRegistry {
    pub fn new(db: Arc<Database>, roots: WatchRoots, jobs: Arc<ScanJobs>) -> Self {
        Self { db, roots, jobs }
    }

    pub fn roots(&self) -> &WatchRoots {
        &self.roots
    }

    /// Register an existing directory as a scan root.
    ///
    /// The stored path is canonical, so assets found under it carry absolute paths.
    pub fn add(&self, path: &Path) -> AppResult<WatchFolder> {
        let canonical = match std::fs::canonicalize(path) {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "directory does not exist: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        if !canonical.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "not a directory: {}",
                path.display()
            )));
        }

        let folder_path = canonical
            .to_str()
            .ok_or_else(|| {
                AppError::InvalidPath(format!("path is not valid UTF-8: {}", canonical.display()))
            })?
            .to_string();

        let folder = self.db.insert_watch_folder(&folder_path)?;
        tracing::info!("registered watch folder {} ({})", folder.folder_path, folder.folder_id);

        self.refresh_roots()?;
        Ok(folder)
    }

    /// Unregister a root and delete its assets. A running scan of it is cancelled.
    pub fn remove(&self, folder_id: i64) -> AppResult<()> {
        self.jobs.cancel(folder_id);

        if !self.db.delete_watch_folder(folder_id)? {
            return Err(AppError::NotFound(format!("watch folder {}", folder_id)));
        }

        self.refresh_roots()
    }

    pub fn get(&self, folder_id: i64) -> AppResult<WatchFolder> {
        self.db
            .get_watch_folder(folder_id)?
            .ok_or_else(|| AppError::NotFound(format!("watch folder {}", folder_id)))
    }

    /// All roots, ordered by path
    pub fn list(&self) -> AppResult<Vec<WatchFolder>> {
        self.db.list_watch_folders()
    }

    /// Reload the shared root snapshot from the store
    pub fn refresh_roots(&self) -> AppResult<()> {
        let roots = self
            .db
            .list_watch_folders()?
            .iter()
            .map(WatchFolder::path_buf)
            .collect();
        self.roots.replace(roots);
        Ok(())
    }
}
