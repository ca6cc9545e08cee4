//! Collection commands

use sushi_core::models::CreateCollection;
use sushi_core::{AppError, Asset, Collection};

use super::CommandResult;
use crate::AppState;

/// Create a collection; the default icon is used when `icon` is absent
pub fn create_collection(
    state: &AppState,
    collection_name: String,
    icon: Option<String>,
) -> CommandResult<Collection> {
    let input = CreateCollection {
        collection_name,
        description: None,
        icon,
    };
    Ok(state.core.db.create_collection(&input)?)
}

pub fn rename_collection(
    state: &AppState,
    collection_id: i64,
    collection_name: String,
) -> CommandResult<Collection> {
    Ok(state.core.db.rename_collection(collection_id, &collection_name)?)
}

/// Delete a collection. Member assets are kept.
pub fn delete_collection(state: &AppState, collection_id: i64) -> CommandResult<()> {
    if !state.core.db.delete_collection(collection_id)? {
        return Err(AppError::NotFound(format!("collection {}", collection_id)).into());
    }
    Ok(())
}

pub fn get_collections(state: &AppState) -> CommandResult<Vec<Collection>> {
    Ok(state.core.db.get_all_collections()?)
}

pub fn add_to_collection(state: &AppState, collection_id: i64, asset_id: i64) -> CommandResult<()> {
    state.core.db.add_asset_to_collection(collection_id, asset_id)?;
    Ok(())
}

pub fn remove_from_collection(
    state: &AppState,
    collection_id: i64,
    asset_id: i64,
) -> CommandResult<()> {
    state.core.db.remove_asset_from_collection(collection_id, asset_id)?;
    Ok(())
}

pub fn get_collection_assets(state: &AppState, collection_id: i64) -> CommandResult<Vec<Asset>> {
    Ok(state.core.db.get_assets_in_collection(collection_id)?)
}

pub fn get_collections_for_asset(state: &AppState, asset_id: i64) -> CommandResult<Vec<Collection>> {
    Ok(state.core.db.get_collections_for_asset(asset_id)?)
}

/// Returns the number of newly added members
pub fn bulk_add_to_collection(
    state: &AppState,
    collection_id: i64,
    asset_ids: Vec<i64>,
) -> CommandResult<usize> {
    Ok(state.core.db.add_assets_to_collection(collection_id, &asset_ids)?)
}
