//! Asset data access

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, Row};

use crate::models::{now_timestamp, Asset};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;
use super::placeholders;

pub(super) fn row_to_asset(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        asset_id: row.get("asset_id")?,
        absolute_path: row.get("absolute_path")?,
        filename: row.get("filename")?,
        folder_id: row.get("folder_id")?,
        file_size: row.get("file_size")?,
        modified_at: row.get("modified_at")?,
        thumbnail: row.get("thumbnail")?,
        favorited: row.get::<_, i64>("favorited")? != 0,
        last_used_at: row.get("last_used_at")?,
        poly_count: row.get("poly_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(super) fn query_assets<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> AppResult<Vec<Asset>> {
    let mut stmt = conn.prepare(sql)?;
    let assets = stmt
        .query_map(params, row_to_asset)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(assets)
}

fn not_found(asset_id: i64) -> AppError {
    AppError::NotFound(format!("asset {}", asset_id))
}

/// Distinct tag names, preserving nothing but membership
fn distinct_names(names: &[String]) -> Vec<&str> {
    names
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl Database {
    // ==================== Upsert / lookup ====================

    /// Insert a model file or refresh its size and mtime when the path is already indexed.
    ///
    /// Id, thumbnail, favorite flag, poly count, tags and collections survive the update.
    pub fn upsert_asset(
        &self,
        absolute_path: &str,
        folder_id: i64,
        file_size: i64,
        modified_at: &str,
    ) -> AppResult<Asset> {
        let conn = self.connection()?;
        let now = now_timestamp();
        let filename = Path::new(absolute_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute_path.to_string());

        let asset = conn.query_row(
            r#"
            INSERT INTO assets (absolute_path, filename, folder_id, file_size, modified_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(absolute_path) DO UPDATE SET
                file_size = excluded.file_size,
                modified_at = excluded.modified_at,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
            params![absolute_path, filename, folder_id, file_size, modified_at, now],
            row_to_asset,
        )?;

        Ok(asset)
    }

    pub fn get_asset(&self, asset_id: i64) -> AppResult<Option<Asset>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM assets WHERE asset_id = ?1",
            params![asset_id],
            row_to_asset,
        );

        match result {
            Ok(asset) => Ok(Some(asset)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub fn get_asset_by_path(&self, absolute_path: &str) -> AppResult<Option<Asset>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM assets WHERE absolute_path = ?1",
            params![absolute_path],
            row_to_asset,
        );

        match result {
            Ok(asset) => Ok(Some(asset)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    // ==================== Listings ====================

    /// Every indexed asset, ordered by filename
    pub fn list_assets(&self) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(&conn, "SELECT * FROM assets ORDER BY filename, asset_id", [])
    }

    pub fn get_assets_by_folder(&self, folder_id: i64) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(
            &conn,
            "SELECT * FROM assets WHERE folder_id = ?1 ORDER BY filename, asset_id",
            params![folder_id],
        )
    }

    pub fn get_assets_by_tag(&self, tag_name: &str) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(
            &conn,
            r#"
            SELECT a.* FROM assets a
            JOIN asset_tags j ON j.asset_id = a.asset_id
            JOIN tags t ON t.tag_id = j.tag_id
            WHERE t.tag_name = ?1
            ORDER BY a.filename, a.asset_id
            "#,
            params![tag_name],
        )
    }

    /// Assets carrying every one of `tag_names`. An empty list matches everything.
    pub fn get_assets_by_tags(&self, tag_names: &[String]) -> AppResult<Vec<Asset>> {
        let names = distinct_names(tag_names);
        if names.is_empty() {
            return self.list_assets();
        }

        let conn = self.connection()?;
        let sql = format!(
            r#"
            SELECT a.* FROM assets a
            JOIN asset_tags j ON j.asset_id = a.asset_id
            JOIN tags t ON t.tag_id = j.tag_id
            WHERE t.tag_name IN ({})
            GROUP BY a.asset_id
            HAVING COUNT(DISTINCT t.tag_id) = {}
            ORDER BY a.filename, a.asset_id
            "#,
            placeholders(names.len()),
            names.len()
        );

        query_assets(&conn, &sql, params_from_iter(names.iter()))
    }

    /// Ids of assets carrying at least one of `tag_names`. An empty list matches nothing.
    pub fn get_asset_ids_by_tags(&self, tag_names: &[String]) -> AppResult<Vec<i64>> {
        let names = distinct_names(tag_names);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection()?;
        let sql = format!(
            r#"
            SELECT DISTINCT j.asset_id FROM asset_tags j
            JOIN tags t ON t.tag_id = j.tag_id
            WHERE t.tag_name IN ({})
            ORDER BY j.asset_id
            "#,
            placeholders(names.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(names.iter()), |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    pub fn get_untagged_assets(&self) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(
            &conn,
            r#"
            SELECT * FROM assets
            WHERE asset_id NOT IN (SELECT asset_id FROM asset_tags)
            ORDER BY filename, asset_id
            "#,
            [],
        )
    }

    pub fn get_favorited_assets(&self) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(
            &conn,
            "SELECT * FROM assets WHERE favorited = 1 ORDER BY filename, asset_id",
            [],
        )
    }

    /// Assets used at least once, most recent first
    pub fn get_recently_used_assets(&self, limit: u32) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(
            &conn,
            r#"
            SELECT * FROM assets
            WHERE last_used_at IS NOT NULL AND last_used_at != ''
            ORDER BY last_used_at DESC, asset_id DESC
            LIMIT ?1
            "#,
            params![limit],
        )
    }

    /// Newest rows first
    pub fn get_recently_added_assets(&self, limit: u32) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;
        query_assets(
            &conn,
            "SELECT * FROM assets ORDER BY created_at DESC, asset_id DESC LIMIT ?1",
            params![limit],
        )
    }

    // ==================== Point updates ====================

    /// Flip the favorite flag and return the new value.
    pub fn toggle_favorite(&self, asset_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "UPDATE assets SET favorited = 1 - favorited WHERE asset_id = ?1 RETURNING favorited",
            params![asset_id],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(value) => Ok(value != 0),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(not_found(asset_id)),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Set the favorite flag on many assets at once; returns how many rows changed.
    pub fn set_assets_favorite(&self, asset_ids: &[i64], favorited: bool) -> AppResult<usize> {
        if asset_ids.is_empty() {
            return Ok(0);
        }

        self.transaction(|conn| {
            let mut stmt = conn.prepare(
                "UPDATE assets SET favorited = ?1 WHERE asset_id = ?2 AND favorited != ?1",
            )?;

            let mut count = 0;
            for asset_id in asset_ids {
                count += stmt.execute(params![favorited as i64, asset_id])?;
            }

            Ok(count)
        })
    }

    /// Record that the asset was just used
    pub fn set_asset_used(&self, asset_id: i64) -> AppResult<()> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "UPDATE assets SET last_used_at = ?1 WHERE asset_id = ?2",
            params![now_timestamp(), asset_id],
        )?;

        if rows == 0 {
            return Err(not_found(asset_id));
        }
        Ok(())
    }

    pub fn set_thumbnail(&self, asset_id: i64, thumbnail: &str) -> AppResult<()> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "UPDATE assets SET thumbnail = ?1 WHERE asset_id = ?2",
            params![thumbnail, asset_id],
        )?;

        if rows == 0 {
            return Err(not_found(asset_id));
        }
        Ok(())
    }

    /// Stored thumbnail, empty when none has been rendered yet
    pub fn get_thumbnail(&self, asset_id: i64) -> AppResult<String> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT thumbnail FROM assets WHERE asset_id = ?1",
            params![asset_id],
            |row| row.get(0),
        );

        match result {
            Ok(thumbnail) => Ok(thumbnail),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(not_found(asset_id)),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub fn set_poly_count(&self, asset_id: i64, poly_count: i64) -> AppResult<()> {
        if poly_count < 0 {
            return Err(AppError::Validation(format!(
                "poly count must not be negative: {}",
                poly_count
            )));
        }

        let conn = self.connection()?;
        let rows = conn.execute(
            "UPDATE assets SET poly_count = ?1 WHERE asset_id = ?2",
            params![poly_count, asset_id],
        )?;

        if rows == 0 {
            return Err(not_found(asset_id));
        }
        Ok(())
    }

    /// Drop every thumbnail and poly count so the renderer regenerates them
    pub fn clear_all_thumbnails(&self) -> AppResult<usize> {
        let conn = self.connection()?;
        let rows = conn.execute("UPDATE assets SET thumbnail = '', poly_count = 0", [])?;
        Ok(rows)
    }

    // ==================== Deletes ====================

    pub fn delete_asset(&self, asset_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute("DELETE FROM assets WHERE asset_id = ?1", params![asset_id])?;
        Ok(rows > 0)
    }

    /// Delete many assets in one transaction; unknown ids are not counted.
    pub fn delete_assets(&self, asset_ids: &[i64]) -> AppResult<usize> {
        if asset_ids.is_empty() {
            return Ok(0);
        }

        self.transaction(|conn| {
            let mut stmt = conn.prepare("DELETE FROM assets WHERE asset_id = ?1")?;

            let mut count = 0;
            for asset_id in asset_ids {
                count += stmt.execute(params![asset_id])?;
            }

            Ok(count)
        })
    }

    pub fn delete_assets_by_folder(&self, folder_id: i64) -> AppResult<usize> {
        let conn = self.connection()?;
        let rows = conn.execute("DELETE FROM assets WHERE folder_id = ?1", params![folder_id])?;
        Ok(rows)
    }

    /// Remove rows of `folder_id` whose file no longer exists.
    ///
    /// Only "not found" counts as gone; permission or transient errors keep the row.
    /// The filesystem is probed without holding the store lock.
    pub fn prune_assets_for_folder(&self, folder_id: i64) -> AppResult<usize> {
        let candidates: Vec<(i64, String)> = {
            let conn = self.connection()?;
            let mut stmt =
                conn.prepare("SELECT asset_id, absolute_path FROM assets WHERE folder_id = ?1")?;
            let rows = stmt
                .query_map(params![folder_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let missing: Vec<i64> = candidates
            .into_iter()
            .filter_map(|(asset_id, path)| match std::fs::metadata(&path) {
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("pruning missing file: {}", path);
                    Some(asset_id)
                }
                Err(e) => {
                    tracing::warn!("keeping {} after stat error: {}", path, e);
                    None
                }
                Ok(_) => None,
            })
            .collect();

        self.delete_assets(&missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.filename.as_str()).collect()
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_upsert_is_idempotent_and_preserves_metadata() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");

        let first = db
            .upsert_asset("/models/tree.glb", folder.folder_id, 100, "2024-01-01T00:00:00.000Z")
            .unwrap();
        assert_eq!(first.filename, "tree.glb");
        assert!(!first.favorited);
        assert!(!first.has_thumbnail());

        db.toggle_favorite(first.asset_id).unwrap();
        db.set_thumbnail(first.asset_id, "data:image/png;base64,AAAA").unwrap();
        db.set_poly_count(first.asset_id, 5120).unwrap();
        let tag = db.create_tag("nature").unwrap();
        db.tag_asset(first.asset_id, tag.tag_id).unwrap();

        let second = db
            .upsert_asset("/models/tree.glb", folder.folder_id, 250, "2024-02-01T00:00:00.000Z")
            .unwrap();

        assert_eq!(second.asset_id, first.asset_id);
        assert_eq!(second.file_size, 250);
        assert_eq!(second.modified_at, "2024-02-01T00:00:00.000Z");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert!(second.favorited);
        assert_eq!(second.poly_count, 5120);
        assert!(second.has_thumbnail());
        assert_eq!(db.get_tags_for_asset(second.asset_id).unwrap(), vec![tag]);
        assert_eq!(db.list_assets().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_unknown_folder_is_not_found() {
        let db = setup_db();
        let result = db.upsert_asset("/nowhere/a.glb", 42, 1, "2024-01-01T00:00:00.000Z");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_get_asset_by_path() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let asset = add_asset(&db, &folder, "chair.gltf");

        let found = db.get_asset_by_path("/models/chair.gltf").unwrap().unwrap();
        assert_eq!(found, asset);
        assert!(db.get_asset_by_path("/models/missing.glb").unwrap().is_none());
        assert!(db.get_asset(asset.asset_id + 100).unwrap().is_none());
    }

    #[test]
    fn test_tag_queries_and_vs_or() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let a = add_asset(&db, &folder, "a.glb");
        let b = add_asset(&db, &folder, "b.glb");
        let c = add_asset(&db, &folder, "c.glb");

        let x = db.create_tag("x").unwrap();
        let y = db.create_tag("y").unwrap();
        db.tag_asset(a.asset_id, x.tag_id).unwrap();
        db.tag_asset(a.asset_id, y.tag_id).unwrap();
        db.tag_asset(b.asset_id, x.tag_id).unwrap();

        assert_eq!(names(&db.get_assets_by_tags(&tags(&["x", "y"])).unwrap()), vec!["a.glb"]);
        assert_eq!(
            names(&db.get_assets_by_tags(&tags(&["x"])).unwrap()),
            vec!["a.glb", "b.glb"]
        );
        // duplicates in the request do not change AND semantics
        assert_eq!(
            names(&db.get_assets_by_tags(&tags(&["y", "y"])).unwrap()),
            vec!["a.glb"]
        );
        assert!(db.get_assets_by_tags(&tags(&["x", "nope"])).unwrap().is_empty());
        assert_eq!(db.get_assets_by_tags(&[]).unwrap().len(), 3);

        assert_eq!(
            db.get_asset_ids_by_tags(&tags(&["x", "y"])).unwrap(),
            vec![a.asset_id, b.asset_id]
        );
        assert_eq!(db.get_asset_ids_by_tags(&tags(&["y"])).unwrap(), vec![a.asset_id]);
        assert!(db.get_asset_ids_by_tags(&[]).unwrap().is_empty());

        assert_eq!(names(&db.get_assets_by_tag("x").unwrap()), vec!["a.glb", "b.glb"]);
        assert_eq!(names(&db.get_untagged_assets().unwrap()), vec!["c.glb"]);
        assert_eq!(c.folder_id, folder.folder_id);
    }

    #[test]
    fn test_toggle_favorite_twice_restores_value() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let asset = add_asset(&db, &folder, "lamp.glb");

        assert!(db.toggle_favorite(asset.asset_id).unwrap());
        assert_eq!(names(&db.get_favorited_assets().unwrap()), vec!["lamp.glb"]);
        assert!(!db.toggle_favorite(asset.asset_id).unwrap());
        assert!(db.get_favorited_assets().unwrap().is_empty());

        assert!(matches!(db.toggle_favorite(9999), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_bulk_favorite_counts_changed_rows() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let a = add_asset(&db, &folder, "a.glb");
        let b = add_asset(&db, &folder, "b.glb");

        db.toggle_favorite(a.asset_id).unwrap();

        let changed = db
            .set_assets_favorite(&[a.asset_id, b.asset_id, 9999], true)
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(db.get_favorited_assets().unwrap().len(), 2);

        assert_eq!(db.set_assets_favorite(&[a.asset_id, b.asset_id], false).unwrap(), 2);
        assert_eq!(db.set_assets_favorite(&[], true).unwrap(), 0);
    }

    #[test]
    fn test_recently_used_and_added() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let a = add_asset(&db, &folder, "a.glb");
        let b = add_asset(&db, &folder, "b.glb");
        let c = add_asset(&db, &folder, "c.glb");

        assert!(db.get_recently_used_assets(200).unwrap().is_empty());

        db.set_asset_used(b.asset_id).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.set_asset_used(a.asset_id).unwrap();

        assert_eq!(
            names(&db.get_recently_used_assets(200).unwrap()),
            vec!["a.glb", "b.glb"]
        );
        assert_eq!(names(&db.get_recently_used_assets(1).unwrap()), vec!["a.glb"]);

        let added = db.get_recently_added_assets(2).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].asset_id, c.asset_id);

        assert!(matches!(db.set_asset_used(4242), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_thumbnail_and_poly_count() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let a = add_asset(&db, &folder, "a.glb");
        let b = add_asset(&db, &folder, "b.glb");

        assert_eq!(db.get_thumbnail(a.asset_id).unwrap(), "");
        db.set_thumbnail(a.asset_id, "thumb-a").unwrap();
        db.set_thumbnail(b.asset_id, "thumb-b").unwrap();
        db.set_poly_count(a.asset_id, 12).unwrap();
        assert_eq!(db.get_thumbnail(a.asset_id).unwrap(), "thumb-a");

        assert!(matches!(db.set_poly_count(a.asset_id, -1), Err(AppError::Validation(_))));
        assert!(matches!(db.set_thumbnail(777, "x"), Err(AppError::NotFound(_))));
        assert!(matches!(db.get_thumbnail(777), Err(AppError::NotFound(_))));

        assert_eq!(db.clear_all_thumbnails().unwrap(), 2);
        let cleared = db.get_asset(a.asset_id).unwrap().unwrap();
        assert_eq!(cleared.thumbnail, "");
        assert_eq!(cleared.poly_count, 0);
    }

    #[test]
    fn test_delete_assets_cascades_and_counts() {
        let db = setup_db();
        let folder = add_folder(&db, "/models");
        let a = add_asset(&db, &folder, "a.glb");
        let b = add_asset(&db, &folder, "b.glb");
        let c = add_asset(&db, &folder, "c.glb");

        let tag = db.create_tag("props").unwrap();
        db.tag_asset(a.asset_id, tag.tag_id).unwrap();
        let collection = db
            .create_collection(&crate::models::CreateCollection::named("Set"))
            .unwrap();
        db.add_asset_to_collection(collection.collection_id, a.asset_id).unwrap();

        assert_eq!(db.delete_assets(&[a.asset_id, b.asset_id, 9999]).unwrap(), 2);
        assert_eq!(db.get_all_tags_with_count().unwrap()[0].asset_count, 0);
        assert_eq!(
            db.get_collection(collection.collection_id).unwrap().unwrap().asset_count,
            0
        );

        assert!(db.delete_asset(c.asset_id).unwrap());
        assert!(!db.delete_asset(c.asset_id).unwrap());
        assert_eq!(db.delete_assets(&[]).unwrap(), 0);
    }

    #[test]
    fn test_delete_assets_by_folder() {
        let db = setup_db();
        let first = add_folder(&db, "/first");
        let second = add_folder(&db, "/second");
        add_asset(&db, &first, "a.glb");
        add_asset(&db, &first, "b.glb");
        add_asset(&db, &second, "c.glb");

        assert_eq!(db.delete_assets_by_folder(first.folder_id).unwrap(), 2);
        assert_eq!(names(&db.list_assets().unwrap()), vec!["c.glb"]);
        assert_eq!(db.get_assets_by_folder(second.folder_id).unwrap().len(), 1);
    }

    #[test]
    fn test_prune_removes_only_missing_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_string_lossy().into_owned();
        let db = setup_db();
        let folder = add_folder(&db, &root);

        let kept_path = tmp.path().join("kept.glb");
        let gone_path = tmp.path().join("gone.glb");
        fs::write(&kept_path, b"glTF").unwrap();
        fs::write(&gone_path, b"glTF").unwrap();

        for path in [&kept_path, &gone_path] {
            db.upsert_asset(&path.to_string_lossy(), folder.folder_id, 4, "2024-01-01T00:00:00.000Z")
                .unwrap();
        }

        fs::remove_file(&gone_path).unwrap();

        assert_eq!(db.prune_assets_for_folder(folder.folder_id).unwrap(), 1);
        assert_eq!(names(&db.list_assets().unwrap()), vec!["kept.glb"]);
        assert_eq!(db.prune_assets_for_folder(folder.folder_id).unwrap(), 0);
    }
}
