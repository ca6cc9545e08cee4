//! Database schema
//!
//! CREATE statements for a fresh database and the migration ladder for older ones.

/// Schema version written by `INIT_SCHEMA`
pub const SCHEMA_VERSION: i32 = 3;

/// Full schema at `SCHEMA_VERSION`
pub const INIT_SCHEMA: &str = r#"
-- Watch folders (scan roots)
CREATE TABLE IF NOT EXISTS watch_folders (
    folder_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_path     TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL
);

-- Indexed model files
CREATE TABLE IF NOT EXISTS assets (
    asset_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    absolute_path   TEXT NOT NULL UNIQUE,
    filename        TEXT NOT NULL,
    folder_id       INTEGER NOT NULL REFERENCES watch_folders(folder_id) ON DELETE CASCADE,
    file_size       INTEGER NOT NULL,
    modified_at     TEXT NOT NULL,
    thumbnail       TEXT NOT NULL DEFAULT '',
    favorited       INTEGER NOT NULL DEFAULT 0 CHECK(favorited IN (0, 1)),
    last_used_at    TEXT,
    poly_count      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_name        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS asset_tags (
    asset_id        INTEGER NOT NULL REFERENCES assets(asset_id) ON DELETE CASCADE,
    tag_id          INTEGER NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
    PRIMARY KEY (asset_id, tag_id)
);

CREATE TABLE IF NOT EXISTS collections (
    collection_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_name TEXT NOT NULL UNIQUE,
    description     TEXT NOT NULL DEFAULT '',
    icon            TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS collection_assets (
    collection_id   INTEGER NOT NULL REFERENCES collections(collection_id) ON DELETE CASCADE,
    asset_id        INTEGER NOT NULL REFERENCES assets(asset_id) ON DELETE CASCADE,
    added_at        TEXT NOT NULL,
    PRIMARY KEY (collection_id, asset_id)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version         INTEGER PRIMARY KEY,
    applied_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_assets_folder ON assets(folder_id);
CREATE INDEX IF NOT EXISTS idx_assets_filename ON assets(filename);
CREATE INDEX IF NOT EXISTS idx_assets_favorited ON assets(favorited);
CREATE INDEX IF NOT EXISTS idx_assets_last_used ON assets(last_used_at);
CREATE INDEX IF NOT EXISTS idx_assets_created ON assets(created_at);
CREATE INDEX IF NOT EXISTS idx_asset_tags_tag_id ON asset_tags(tag_id);
CREATE INDEX IF NOT EXISTS idx_collection_assets_asset_id ON collection_assets(asset_id);
"#;

/// Schema migration step
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Migrations applied to databases older than `SCHEMA_VERSION`, in order.
///
/// Version 1 is the first release layout: folders, assets without usage columns, tags.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        description: "Add favorite flag and last-used timestamp to assets",
        sql: r#"
            ALTER TABLE assets ADD COLUMN favorited INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE assets ADD COLUMN last_used_at TEXT;
            CREATE INDEX IF NOT EXISTS idx_assets_favorited ON assets(favorited);
            CREATE INDEX IF NOT EXISTS idx_assets_last_used ON assets(last_used_at);
        "#,
    },
    Migration {
        version: 3,
        description: "Add poly count and collections",
        sql: r#"
            ALTER TABLE assets ADD COLUMN poly_count INTEGER NOT NULL DEFAULT 0;

            CREATE TABLE IF NOT EXISTS collections (
                collection_id   INTEGER PRIMARY KEY AUTOINCREMENT,
                collection_name TEXT NOT NULL UNIQUE,
                description     TEXT NOT NULL DEFAULT '',
                icon            TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS collection_assets (
                collection_id   INTEGER NOT NULL REFERENCES collections(collection_id) ON DELETE CASCADE,
                asset_id        INTEGER NOT NULL REFERENCES assets(asset_id) ON DELETE CASCADE,
                added_at        TEXT NOT NULL,
                PRIMARY KEY (collection_id, asset_id)
            );

            CREATE INDEX IF NOT EXISTS idx_assets_created ON assets(created_at);
            CREATE INDEX IF NOT EXISTS idx_collection_assets_asset_id ON collection_assets(asset_id);
        "#,
    },
];
