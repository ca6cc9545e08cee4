//! Thumbnail and poly count commands
//!
//! Thumbnails are opaque strings produced by the renderer and stored as-is.

use super::CommandResult;
use crate::AppState;

pub fn save_thumbnail(state: &AppState, asset_id: i64, thumbnail: String) -> CommandResult<()> {
    Ok(state.core.db.set_thumbnail(asset_id, &thumbnail)?)
}

/// Empty string when no thumbnail has been saved
pub fn get_thumbnail(state: &AppState, asset_id: i64) -> CommandResult<String> {
    Ok(state.core.db.get_thumbnail(asset_id)?)
}

/// Reset every thumbnail and poly count; returns the number of assets touched
pub fn clear_all_thumbnails(state: &AppState) -> CommandResult<usize> {
    let cleared = state.core.db.clear_all_thumbnails()?;
    tracing::info!("cleared {} thumbnails", cleared);
    Ok(cleared)
}

pub fn save_poly_count(state: &AppState, asset_id: i64, poly_count: i64) -> CommandResult<()> {
    Ok(state.core.db.set_poly_count(asset_id, poly_count)?)
}
