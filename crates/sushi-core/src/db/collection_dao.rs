//! Collection data access

use rusqlite::{params, OptionalExtension, Row};

use crate::models::{
    now_timestamp, Asset, Collection, CreateCollection, UpdateCollection, DEFAULT_COLLECTION_ICON,
};
use crate::utils::error::{AppError, AppResult};

use super::asset_dao::query_assets;
use super::connection::Database;

const SELECT_COLLECTION: &str = r#"
    SELECT c.*,
        (SELECT COUNT(*) FROM collection_assets m WHERE m.collection_id = c.collection_id) AS asset_count
    FROM collections c
"#;

fn row_to_collection(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        collection_id: row.get("collection_id")?,
        collection_name: row.get("collection_name")?,
        description: row.get("description")?,
        icon: row.get("icon")?,
        created_at: row.get("created_at")?,
        asset_count: row.get("asset_count")?,
    })
}

fn validate_collection_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "collection name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn missing_collection(collection_id: i64) -> AppError {
    AppError::NotFound(format!("collection {}", collection_id))
}

impl Database {
    // ==================== Collection CRUD ====================

    pub fn create_collection(&self, collection: &CreateCollection) -> AppResult<Collection> {
        let name = validate_collection_name(&collection.collection_name)?;
        let icon = collection
            .icon
            .as_deref()
            .filter(|icon| !icon.is_empty())
            .unwrap_or(DEFAULT_COLLECTION_ICON);
        let description = collection.description.as_deref().unwrap_or("");

        let collection_id = {
            let conn = self.connection()?;
            conn.execute(
                r#"
                INSERT INTO collections (collection_name, description, icon, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![name, description, icon, now_timestamp()],
            )?;
            conn.last_insert_rowid()
        };

        self.get_collection(collection_id)?
            .ok_or_else(|| missing_collection(collection_id))
    }

    pub fn get_collection(&self, collection_id: i64) -> AppResult<Option<Collection>> {
        let conn = self.connection()?;

        let collection = conn
            .query_row(
                &format!("{} WHERE c.collection_id = ?1", SELECT_COLLECTION),
                params![collection_id],
                row_to_collection,
            )
            .optional()?;

        Ok(collection)
    }

    /// Apply the fields present in `update`; returns `false` when nothing changed
    pub fn update_collection(&self, collection_id: i64, update: &UpdateCollection) -> AppResult<bool> {
        let conn = self.connection()?;

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = update.collection_name {
            updates.push("collection_name = ?");
            params_vec.push(Box::new(validate_collection_name(name)?.to_string()));
        }
        if let Some(ref description) = update.description {
            updates.push("description = ?");
            params_vec.push(Box::new(description.clone()));
        }
        if let Some(ref icon) = update.icon {
            updates.push("icon = ?");
            params_vec.push(Box::new(icon.clone()));
        }

        if updates.is_empty() {
            return Ok(false);
        }

        params_vec.push(Box::new(collection_id));

        let sql = format!(
            "UPDATE collections SET {} WHERE collection_id = ?",
            updates.join(", ")
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = conn.execute(&sql, params_refs.as_slice())?;

        Ok(rows > 0)
    }

    pub fn rename_collection(&self, collection_id: i64, name: &str) -> AppResult<Collection> {
        let update = UpdateCollection {
            collection_name: Some(name.to_string()),
            ..Default::default()
        };

        if !self.update_collection(collection_id, &update)? {
            return Err(missing_collection(collection_id));
        }

        self.get_collection(collection_id)?
            .ok_or_else(|| missing_collection(collection_id))
    }

    /// Delete a collection; memberships cascade, assets stay
    pub fn delete_collection(&self, collection_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "DELETE FROM collections WHERE collection_id = ?1",
            params![collection_id],
        )?;
        Ok(rows > 0)
    }

    /// All collections with member counts, ordered by name
    pub fn get_all_collections(&self) -> AppResult<Vec<Collection>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY c.collection_name", SELECT_COLLECTION))?;
        let collections = stmt
            .query_map([], row_to_collection)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(collections)
    }

    // ==================== Membership ====================

    /// Add an asset; re-adding is a no-op and returns `false`
    pub fn add_asset_to_collection(&self, collection_id: i64, asset_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            r#"
            INSERT OR IGNORE INTO collection_assets (collection_id, asset_id, added_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![collection_id, asset_id, now_timestamp()],
        )?;
        Ok(rows > 0)
    }

    /// Add many assets at once; unknown asset ids are skipped, an unknown collection is `NotFound`.
    pub fn add_assets_to_collection(&self, collection_id: i64, asset_ids: &[i64]) -> AppResult<usize> {
        self.transaction(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM collections WHERE collection_id = ?1)",
                params![collection_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(missing_collection(collection_id));
            }

            let now = now_timestamp();
            let mut stmt = conn.prepare(
                r#"
                INSERT OR IGNORE INTO collection_assets (collection_id, asset_id, added_at)
                SELECT ?1, ?2, ?3 WHERE EXISTS (SELECT 1 FROM assets WHERE asset_id = ?2)
                "#,
            )?;

            let mut count = 0;
            for asset_id in asset_ids {
                count += stmt.execute(params![collection_id, asset_id, now])?;
            }

            Ok(count)
        })
    }

    pub fn remove_asset_from_collection(&self, collection_id: i64, asset_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "DELETE FROM collection_assets WHERE collection_id = ?1 AND asset_id = ?2",
            params![collection_id, asset_id],
        )?;
        Ok(rows > 0)
    }

    /// Members of a collection, most recently added first
    pub fn get_assets_in_collection(&self, collection_id: i64) -> AppResult<Vec<Asset>> {
        let conn = self.connection()?;

        query_assets(
            &conn,
            r#"
            SELECT a.* FROM assets a
            JOIN collection_assets m ON m.asset_id = a.asset_id
            WHERE m.collection_id = ?1
            ORDER BY m.added_at DESC, a.filename
            "#,
            params![collection_id],
        )
    }

    pub fn get_collections_for_asset(&self, asset_id: i64) -> AppResult<Vec<Collection>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            {} WHERE c.collection_id IN (
                SELECT collection_id FROM collection_assets WHERE asset_id = ?1
            )
            ORDER BY c.collection_name
            "#,
            SELECT_COLLECTION
        ))?;

        let collections = stmt
            .query_map(params![asset_id], row_to_collection)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(collections)
    }
}
