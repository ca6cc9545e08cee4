//! Watch folder scanner
//!
//! Walks a watch folder, upserts every model file it finds, then prunes rows
//! whose files disappeared. Scans are full passes; there is no incremental mode.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::db::Database;
use crate::events::{EventSinkExt, SharedEventSink, SCAN_COMPLETED, SCAN_FAILED, SCAN_STARTED};
use crate::jobs::{CancelToken, ScanJobs};
use crate::models::{asset::format_timestamp, now_timestamp, ScanSettings, WatchFolder};
use crate::utils::error::{AppError, AppResult};
use crate::utils::is_model_file;

/// Walk options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// Skip directories whose name starts with a dot
    pub skip_hidden: bool,
    /// Directory names never descended into (e.g. `node_modules`)
    pub exclude_dirs: Vec<String>,
    pub follow_links: bool,
}

impl From<&ScanSettings> for ScanOptions {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            skip_hidden: settings.skip_hidden,
            exclude_dirs: settings.exclude_dirs.clone(),
            follow_links: settings.follow_links,
        }
    }
}

/// Result of scanning one folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub folder_id: i64,
    /// Model files upserted in this pass
    pub found: usize,
    /// Rows removed because their file is gone
    pub pruned: usize,
    /// Unreadable entries and failed upserts
    pub skipped: usize,
    /// The walk stopped early; nothing was pruned
    pub cancelled: bool,
}

/// A folder that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFailure {
    pub folder_id: i64,
    pub folder_path: String,
    pub error: String,
}

/// Result of scanning every watch folder
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAllReport {
    pub outcomes: Vec<ScanOutcome>,
    pub failures: Vec<FolderFailure>,
}

impl ScanAllReport {
    pub fn total_found(&self) -> usize {
        self.outcomes.iter().map(|o| o.found).sum()
    }

    pub fn total_pruned(&self) -> usize {
        self.outcomes.iter().map(|o| o.pruned).sum()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanStarted<'a> {
    folder_id: i64,
    folder_path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanCompleted<'a> {
    folder_path: &'a str,
    #[serde(flatten)]
    outcome: &'a ScanOutcome,
}

/// Reconciles watch folders on disk with the store
pub struct Scanner {
    db: Arc<Database>,
    options: ScanOptions,
    events: SharedEventSink,
    jobs: Arc<ScanJobs>,
}

impl Scanner {
    pub fn new(
        db: Arc<Database>,
        options: ScanOptions,
        events: SharedEventSink,
        jobs: Arc<ScanJobs>,
    ) -> Self {
        Self {
            db,
            options,
            events,
            jobs,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan one watch folder: upsert what is on disk, then prune what is not.
    ///
    /// A missing or non-directory root is an error and prunes nothing.
    pub fn scan_folder(&self, folder: &WatchFolder) -> AppResult<ScanOutcome> {
        self.events.emit_typed(
            SCAN_STARTED,
            &ScanStarted {
                folder_id: folder.folder_id,
                folder_path: &folder.folder_path,
            },
        );

        let token = self.jobs.begin(folder.folder_id);
        let result = self.run_scan(folder, &token);
        self.jobs.finish(folder.folder_id, &token);

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    "scanned {}: {} found, {} pruned, {} skipped{}",
                    folder.folder_path,
                    outcome.found,
                    outcome.pruned,
                    outcome.skipped,
                    if outcome.cancelled { " (cancelled)" } else { "" }
                );
                self.events.emit_typed(
                    SCAN_COMPLETED,
                    &ScanCompleted {
                        folder_path: &folder.folder_path,
                        outcome,
                    },
                );
            }
            Err(e) => {
                tracing::error!("scan of {} failed: {}", folder.folder_path, e);
                self.events.emit_typed(
                    SCAN_FAILED,
                    &FolderFailure {
                        folder_id: folder.folder_id,
                        folder_path: folder.folder_path.clone(),
                        error: e.to_string(),
                    },
                );
            }
        }

        result
    }

    /// Scan every registered folder in parallel. Per-folder failures are
    /// collected in the report; only failing to list the folders is an error.
    pub fn scan_all(&self) -> AppResult<ScanAllReport> {
        let folders = self.db.list_watch_folders()?;

        let results: Vec<(&WatchFolder, AppResult<ScanOutcome>)> = folders
            .par_iter()
            .map(|folder| (folder, self.scan_folder(folder)))
            .collect();

        let mut report = ScanAllReport::default();
        for (folder, result) in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => report.failures.push(FolderFailure {
                    folder_id: folder.folder_id,
                    folder_path: folder.folder_path.clone(),
                    error: e.to_string(),
                }),
            }
        }

        Ok(report)
    }

    fn run_scan(&self, folder: &WatchFolder, token: &CancelToken) -> AppResult<ScanOutcome> {
        let root = folder.path();
        check_root(root)?;

        let mut outcome = ScanOutcome {
            folder_id: folder.folder_id,
            ..Default::default()
        };

        let walker = WalkDir::new(root)
            .follow_links(self.options.follow_links)
            .into_iter()
            .filter_entry(|e| self.should_descend(e, root));

        for entry in walker {
            if token.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    outcome.skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_model_file(entry.path()) {
                continue;
            }

            match self.index_entry(folder.folder_id, &entry) {
                Ok(()) => outcome.found += 1,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", entry.path().display(), e);
                    outcome.skipped += 1;
                }
            }
        }

        if !outcome.cancelled {
            outcome.pruned = self.db.prune_assets_for_folder(folder.folder_id)?;
        }

        Ok(outcome)
    }

    fn index_entry(&self, folder_id: i64, entry: &DirEntry) -> AppResult<()> {
        let metadata = entry
            .metadata()
            .map_err(|e| AppError::General(format!("cannot stat: {}", e)))?;

        let modified_at = metadata
            .modified()
            .map(|time| format_timestamp(DateTime::<Utc>::from(time)))
            .unwrap_or_else(|_| now_timestamp());

        let path = entry.path().to_str().ok_or_else(|| {
            AppError::InvalidPath(format!(
                "path is not valid UTF-8: {}",
                entry.path().display()
            ))
        })?;
        tracing::debug!("indexing {}", path);

        self.db
            .upsert_asset(path, folder_id, metadata.len() as i64, &modified_at)?;
        Ok(())
    }

    /// Directory filter; files always pass
    fn should_descend(&self, entry: &DirEntry, root: &Path) -> bool {
        if !entry.file_type().is_dir() || entry.path() == root {
            return true;
        }

        let name = entry.file_name().to_string_lossy();

        if self.options.skip_hidden && name.starts_with('.') {
            return false;
        }

        !self.options.exclude_dirs.iter().any(|d| d == &*name)
    }
}

fn check_root(root: &Path) -> AppResult<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AppError::InvalidPath(format!(
            "not a directory: {}",
            root.display()
        ))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound(format!(
            "watch folder missing: {}",
            root.display()
        ))),
        Err(e) => Err(AppError::Io(e)),
    }
}
