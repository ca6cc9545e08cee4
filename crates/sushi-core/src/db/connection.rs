//! Database connection management
//!
//! One SQLite connection behind a mutex. Every store operation locks it, which
//! serializes writers without relying on SQLite's busy handling.

use rusqlite::{params, Connection, OpenFlags};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::now_timestamp;
use crate::paths::PathProvider;
use crate::utils::error::{AppError, AppResult};

use super::schema::{INIT_SCHEMA, MIGRATIONS, SCHEMA_VERSION};

/// Shared store handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open or create the database file
    pub fn open(path: PathBuf) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };

        db.configure()?;

        Ok(db)
    }

    /// Open the database at the provider's location
    pub fn open_with_provider(provider: &dyn PathProvider) -> AppResult<Self> {
        Self::open(provider.database_path())
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        };

        db.configure()?;

        Ok(db)
    }

    fn configure(&self) -> AppResult<()> {
        let conn = self.connection()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;

        Ok(())
    }

    /// Create the schema or bring an existing one up to `SCHEMA_VERSION`
    pub fn init(&self) -> AppResult<()> {
        let mut conn = self.connection()?;

        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            tracing::info!("initializing database schema");

            let tx = conn.transaction()?;
            tx.execute_batch(INIT_SCHEMA)?;
            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![SCHEMA_VERSION, now_timestamp()],
            )?;
            tx.commit()?;

            tracing::info!("database schema initialized at version {}", SCHEMA_VERSION);
        } else {
            Self::migrate_internal(&mut conn)?;
        }

        Ok(())
    }

    fn migrate_internal(conn: &mut Connection) -> AppResult<()> {
        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

        tracing::info!("current database version: {}", current_version);

        for migration in MIGRATIONS {
            if migration.version > current_version {
                tracing::info!(
                    "applying migration v{}: {}",
                    migration.version,
                    migration.description
                );

                let tx = conn.transaction()?;
                tx.execute_batch(migration.sql)?;
                tx.execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                    params![migration.version, now_timestamp()],
                )?;
                tx.commit()?;

                tracing::info!("migration v{} done", migration.version);
            }
        }

        Ok(())
    }

    /// Current schema version recorded in the database
    pub fn schema_version(&self) -> AppResult<i32> {
        let conn = self.connection()?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    /// Lock the connection
    pub fn connection(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            AppError::Database(rusqlite::Error::InvalidParameterName(e.to_string()))
        })
    }

    /// Run `f` inside one transaction; any error rolls the whole batch back
    pub fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Row counts and file size
    pub fn stats(&self) -> AppResult<DatabaseStats> {
        let conn = self.connection()?;

        let count = |sql: &str| -> AppResult<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };

        let asset_count = count("SELECT COUNT(*) FROM assets")?;
        let folder_count = count("SELECT COUNT(*) FROM watch_folders")?;
        let tag_count = count("SELECT COUNT(*) FROM tags")?;
        let collection_count = count("SELECT COUNT(*) FROM collections")?;
        let favorite_count = count("SELECT COUNT(*) FROM assets WHERE favorited = 1")?;

        let db_size = std::fs::metadata(&self.path)
            .map(|m| m.len() as i64)
            .unwrap_or(0);

        Ok(DatabaseStats {
            asset_count,
            folder_count,
            tag_count,
            collection_count,
            favorite_count,
            db_size,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub asset_count: i64,
    pub folder_count: i64,
    pub tag_count: i64,
    pub collection_count: i64,
    pub favorite_count: i64,
    pub db_size: i64,
}
