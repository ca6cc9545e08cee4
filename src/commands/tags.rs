//! Tag commands

use sushi_core::{AppError, Tag, TagWithCount};

use super::CommandResult;
use crate::AppState;

/// Returns the existing tag when the name is already taken
pub fn create_tag(state: &AppState, tag_name: String) -> CommandResult<Tag> {
    Ok(state.core.db.create_tag(&tag_name)?)
}

/// All tags ordered by name
pub fn get_all_tags(state: &AppState) -> CommandResult<Vec<Tag>> {
    Ok(state.core.db.get_all_tags()?)
}

/// Tags with usage counts, most used first
pub fn get_tags_with_counts(state: &AppState) -> CommandResult<Vec<TagWithCount>> {
    Ok(state.core.db.get_all_tags_with_count()?)
}

/// Tag an asset by name, creating the tag when needed. Returns the asset's tags.
pub fn add_tag_to_asset(
    state: &AppState,
    asset_id: i64,
    tag_name: String,
) -> CommandResult<Vec<Tag>> {
    let db = &state.core.db;
    if db.get_asset(asset_id)?.is_none() {
        return Err(AppError::NotFound(format!("asset {}", asset_id)).into());
    }

    db.tag_assets(&[asset_id], &tag_name)?;
    Ok(db.get_tags_for_asset(asset_id)?)
}

/// Returns the asset's remaining tags
pub fn remove_tag_from_asset(
    state: &AppState,
    asset_id: i64,
    tag_id: i64,
) -> CommandResult<Vec<Tag>> {
    let db = &state.core.db;
    db.untag_asset(asset_id, tag_id)?;
    Ok(db.get_tags_for_asset(asset_id)?)
}

pub fn get_tags_for_asset(state: &AppState, asset_id: i64) -> CommandResult<Vec<Tag>> {
    Ok(state.core.db.get_tags_for_asset(asset_id)?)
}

/// Apply one tag to many assets. Returns the number of new associations.
pub fn bulk_tag_assets(
    state: &AppState,
    asset_ids: Vec<i64>,
    tag_name: String,
) -> CommandResult<usize> {
    Ok(state.core.db.tag_assets(&asset_ids, &tag_name)?)
}

pub fn delete_tag(state: &AppState, tag_id: i64) -> CommandResult<()> {
    if !state.core.db.delete_tag(tag_id)? {
        return Err(AppError::NotFound(format!("tag {}", tag_id)).into());
    }
    Ok(())
}

pub fn rename_tag(state: &AppState, tag_id: i64, tag_name: String) -> CommandResult<Tag> {
    Ok(state.core.db.rename_tag(tag_id, &tag_name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[test]
    fn test_add_and_remove_tags() {
        let (tmp, state) = test_state();
        let assets = library(&state, &tmp.path().join("lib"), &["rock.glb"]);
        let id = assets[0].asset_id;

        let tags = add_tag_to_asset(&state, id, "stone".into()).unwrap();
        assert_eq!(tags.len(), 1);
        let tags = add_tag_to_asset(&state, id, "stone".into()).unwrap();
        assert_eq!(tags.len(), 1);

        let tags = add_tag_to_asset(&state, id, "grey".into()).unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.tag_name.as_str()).collect();
        assert_eq!(names, vec!["grey", "stone"]);

        let remaining = remove_tag_from_asset(&state, id, tags[0].tag_id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].tag_name, "stone");
        assert_eq!(get_tags_for_asset(&state, id).unwrap(), remaining);

        assert_eq!(
            add_tag_to_asset(&state, 777, "stone".into()).unwrap_err().code,
            "E_NOT_FOUND"
        );
    }

    #[test]
    fn test_tag_lifecycle() {
        let (tmp, state) = test_state();
        let assets = library(&state, &tmp.path().join("lib"), &["a.glb", "b.glb"]);
        let ids: Vec<i64> = assets.iter().map(|a| a.asset_id).collect();

        let lone = create_tag(&state, "unused".into()).unwrap();
        assert_eq!(create_tag(&state, "unused".into()).unwrap(), lone);
        assert_eq!(create_tag(&state, "  ".into()).unwrap_err().code, "E_VALIDATION");

        assert_eq!(bulk_tag_assets(&state, ids.clone(), "prop".into()).unwrap(), 2);
        assert_eq!(bulk_tag_assets(&state, ids, "prop".into()).unwrap(), 0);

        let counts = get_tags_with_counts(&state).unwrap();
        assert_eq!(counts[0].tag.tag_name, "prop");
        assert_eq!(counts[0].asset_count, 2);

        let renamed = rename_tag(&state, lone.tag_id, "spare".into()).unwrap();
        assert_eq!(renamed.tag_name, "spare");

        delete_tag(&state, lone.tag_id).unwrap();
        assert_eq!(delete_tag(&state, lone.tag_id).unwrap_err().code, "E_NOT_FOUND");
        assert_eq!(get_all_tags(&state).unwrap().len(), 1);
    }
}
