//! Watch folder data access

use rusqlite::{params, Row};

use crate::models::{now_timestamp, WatchFolder};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;

fn row_to_folder(row: &Row<'_>) -> rusqlite::Result<WatchFolder> {
    Ok(WatchFolder {
        folder_id: row.get("folder_id")?,
        folder_path: row.get("folder_path")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Register a scan root. A path that is already registered is a `Conflict`.
    pub fn insert_watch_folder(&self, folder_path: &str) -> AppResult<WatchFolder> {
        let conn = self.connection()?;

        let folder = conn
            .query_row(
                "INSERT INTO watch_folders (folder_path, created_at) VALUES (?1, ?2) RETURNING *",
                params![folder_path, now_timestamp()],
                row_to_folder,
            )
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("watch folder already registered: {}", folder_path))
                }
                other => other,
            })?;

        Ok(folder)
    }

    pub fn get_watch_folder(&self, folder_id: i64) -> AppResult<Option<WatchFolder>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM watch_folders WHERE folder_id = ?1",
            params![folder_id],
            row_to_folder,
        );

        match result {
            Ok(folder) => Ok(Some(folder)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub fn get_watch_folder_by_path(&self, folder_path: &str) -> AppResult<Option<WatchFolder>> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT * FROM watch_folders WHERE folder_path = ?1",
            params![folder_path],
            row_to_folder,
        );

        match result {
            Ok(folder) => Ok(Some(folder)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// All scan roots, ordered by path
    pub fn list_watch_folders(&self) -> AppResult<Vec<WatchFolder>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare("SELECT * FROM watch_folders ORDER BY folder_path")?;
        let folders = stmt
            .query_map([], row_to_folder)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(folders)
    }

    /// Remove a scan root together with every asset indexed under it
    pub fn delete_watch_folder(&self, folder_id: i64) -> AppResult<bool> {
        self.transaction(|conn| {
            let assets = conn.execute("DELETE FROM assets WHERE folder_id = ?1", params![folder_id])?;
            let rows = conn.execute(
                "DELETE FROM watch_folders WHERE folder_id = ?1",
                params![folder_id],
            )?;

            if rows > 0 {
                tracing::info!("removed watch folder {} and {} assets", folder_id, assets);
            }

            Ok(rows > 0)
        })
    }
}
