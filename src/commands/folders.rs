//! Watch folder commands

use std::path::Path;

use sushi_core::{Asset, ScanAllReport, WatchFolder};

use super::CommandResult;
use crate::AppState;

/// Register a folder, scan it, and return the full asset list.
///
/// A failed scan is logged; the folder stays registered.
pub fn add_watch_folder(state: &AppState, path: String) -> CommandResult<Vec<Asset>> {
    let folder = state.core.registry.add(Path::new(&path))?;

    if let Err(e) = state.core.scanner.scan_folder(&folder) {
        tracing::warn!("initial scan of {} failed: {}", folder.folder_path, e);
    }

    Ok(state.core.db.list_assets()?)
}

/// Unregister a folder and delete every asset indexed under it
pub fn remove_watch_folder(state: &AppState, folder_id: i64) -> CommandResult<()> {
    Ok(state.core.registry.remove(folder_id)?)
}

pub fn get_watch_folders(state: &AppState) -> CommandResult<Vec<WatchFolder>> {
    Ok(state.core.registry.list()?)
}

/// Re-scan one folder and return the full asset list
pub fn rescan_folder(state: &AppState, folder_id: i64) -> CommandResult<Vec<Asset>> {
    let folder = state.core.registry.get(folder_id)?;

    if let Err(e) = state.core.scanner.scan_folder(&folder) {
        tracing::warn!("rescan of {} failed: {}", folder.folder_path, e);
    }

    Ok(state.core.db.list_assets()?)
}

/// Re-scan every folder
pub fn rescan_all_folders(state: &AppState) -> CommandResult<ScanAllReport> {
    Ok(state.core.scanner.scan_all()?)
}
