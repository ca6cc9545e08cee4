//! Tag data access

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Tag, TagWithCount};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

fn row_to_tag(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        tag_id: row.get("tag_id")?,
        tag_name: row.get("tag_name")?,
    })
}

fn validate_tag_name(tag_name: &str) -> AppResult<&str> {
    let trimmed = tag_name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("tag name must not be empty".to_string()));
    }
    Ok(trimmed)
}

/// Get-or-create inside an existing connection or transaction
fn ensure_tag(conn: &Connection, tag_name: &str) -> AppResult<Tag> {
    conn.execute(
        "INSERT OR IGNORE INTO tags (tag_name) VALUES (?1)",
        params![tag_name],
    )?;

    let tag = conn.query_row(
        "SELECT * FROM tags WHERE tag_name = ?1",
        params![tag_name],
        row_to_tag,
    )?;

    Ok(tag)
}

impl Database {
    // ==================== Tag CRUD ====================

    /// Return the tag named `tag_name`, creating it when missing
    pub fn create_tag(&self, tag_name: &str) -> AppResult<Tag> {
        let tag_name = validate_tag_name(tag_name)?;
        let conn = self.connection()?;
        ensure_tag(&conn, tag_name)
    }

    pub fn get_tag(&self, tag_id: i64) -> AppResult<Option<Tag>> {
        let conn = self.connection()?;

        let tag = conn
            .query_row(
                "SELECT * FROM tags WHERE tag_id = ?1",
                params![tag_id],
                row_to_tag,
            )
            .optional()?;

        Ok(tag)
    }

    pub fn get_tag_by_name(&self, tag_name: &str) -> AppResult<Option<Tag>> {
        let conn = self.connection()?;

        let tag = conn
            .query_row(
                "SELECT * FROM tags WHERE tag_name = ?1",
                params![tag_name],
                row_to_tag,
            )
            .optional()?;

        Ok(tag)
    }

    /// Rename a tag. Taking another tag's name is a `Conflict`.
    pub fn rename_tag(&self, tag_id: i64, tag_name: &str) -> AppResult<Tag> {
        let tag_name = validate_tag_name(tag_name)?;
        let conn = self.connection()?;

        let tag = conn
            .query_row(
                "UPDATE tags SET tag_name = ?1 WHERE tag_id = ?2 RETURNING *",
                params![tag_name, tag_id],
                row_to_tag,
            )
            .optional()?;

        tag.ok_or_else(|| AppError::NotFound(format!("tag {}", tag_id)))
    }

    /// Delete a tag; memberships cascade, assets stay
    pub fn delete_tag(&self, tag_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute("DELETE FROM tags WHERE tag_id = ?1", params![tag_id])?;
        Ok(rows > 0)
    }

    pub fn get_all_tags(&self) -> AppResult<Vec<Tag>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare("SELECT * FROM tags ORDER BY tag_name")?;
        let tags = stmt
            .query_map([], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// All tags with usage counts, most used first
    pub fn get_all_tags_with_count(&self) -> AppResult<Vec<TagWithCount>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.*, COUNT(j.asset_id) AS asset_count
            FROM tags t
            LEFT JOIN asset_tags j ON t.tag_id = j.tag_id
            GROUP BY t.tag_id
            ORDER BY asset_count DESC, t.tag_name ASC
            "#,
        )?;

        let tags = stmt
            .query_map([], |row| {
                Ok(TagWithCount {
                    tag: row_to_tag(row)?,
                    asset_count: row.get("asset_count")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    // ==================== Asset/tag relation ====================

    /// Attach a tag; re-attaching is a no-op and returns `false`
    pub fn tag_asset(&self, asset_id: i64, tag_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "INSERT OR IGNORE INTO asset_tags (asset_id, tag_id) VALUES (?1, ?2)",
            params![asset_id, tag_id],
        )?;
        Ok(rows > 0)
    }

    pub fn untag_asset(&self, asset_id: i64, tag_id: i64) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "DELETE FROM asset_tags WHERE asset_id = ?1 AND tag_id = ?2",
            params![asset_id, tag_id],
        )?;
        Ok(rows > 0)
    }

    pub fn get_tags_for_asset(&self, asset_id: i64) -> AppResult<Vec<Tag>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.* FROM tags t
            JOIN asset_tags j ON t.tag_id = j.tag_id
            WHERE j.asset_id = ?1
            ORDER BY t.tag_name
            "#,
        )?;

        let tags = stmt
            .query_map(params![asset_id], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// Attach `tag_name` (created if needed) to every existing asset in `asset_ids`.
    ///
    /// Returns the number of new memberships; unknown ids are skipped.
    pub fn tag_assets(&self, asset_ids: &[i64], tag_name: &str) -> AppResult<usize> {
        let tag_name = validate_tag_name(tag_name)?;

        self.transaction(|conn| {
            let tag = ensure_tag(conn, tag_name)?;

            let mut stmt = conn.prepare(
                r#"
                INSERT OR IGNORE INTO asset_tags (asset_id, tag_id)
                SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM assets WHERE asset_id = ?1)
                "#,
            )?;

            let mut count = 0;
            for asset_id in asset_ids {
                count += stmt.execute(params![asset_id, tag.tag_id])?;
            }

            Ok(count)
        })
    }
}
