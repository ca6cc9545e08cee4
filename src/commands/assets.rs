//! Asset query and mutation commands

use sushi_core::{AppError, Asset};

use super::CommandResult;
use crate::AppState;

/// All assets ordered by filename
pub fn get_assets(state: &AppState) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.list_assets()?)
}

pub fn get_assets_by_tag(state: &AppState, tag_name: String) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_assets_by_tag(&tag_name)?)
}

/// Assets carrying every listed tag
pub fn get_assets_by_tags(state: &AppState, tag_names: Vec<String>) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_assets_by_tags(&tag_names)?)
}

/// Ids of assets carrying any of the listed tags
pub fn get_asset_ids_by_tags(state: &AppState, tag_names: Vec<String>) -> CommandResult<Vec<i64>> {
    Ok(state.core.db.get_asset_ids_by_tags(&tag_names)?)
}

pub fn get_untagged_assets(state: &AppState) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_untagged_assets()?)
}

pub fn get_favorited_assets(state: &AppState) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_favorited_assets()?)
}

pub fn get_recently_used_assets(state: &AppState) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_recently_used_assets(state.recent_limit())?)
}

pub fn get_recently_added_assets(state: &AppState) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_recently_added_assets(state.recent_limit())?)
}

/// Flip the favorite flag and return the new value
pub fn toggle_favorite(state: &AppState, asset_id: i64) -> CommandResult<bool> {
    Ok(state.core.db.toggle_favorite(asset_id)?)
}

pub fn bulk_set_favorite(
    state: &AppState,
    asset_ids: Vec<i64>,
    favorited: bool,
) -> CommandResult<()> {
    let changed = state.core.db.set_assets_favorite(&asset_ids, favorited)?;
    tracing::debug!("set favorite={} on {} assets", favorited, changed);
    Ok(())
}

/// Drop an asset from the index. The file on disk is untouched.
pub fn delete_asset(state: &AppState, asset_id: i64) -> CommandResult<()> {
    if !state.core.db.delete_asset(asset_id)? {
        return Err(AppError::NotFound(format!("asset {}", asset_id)).into());
    }
    Ok(())
}

/// Returns how many assets were removed
pub fn bulk_delete_assets(state: &AppState, asset_ids: Vec<i64>) -> CommandResult<usize> {
    Ok(state.core.db.delete_assets(&asset_ids)?)
}

pub fn mark_asset_used(state: &AppState, asset_id: i64) -> CommandResult<()> {
    Ok(state.core.db.set_asset_used(asset_id)?)
}
