//! Sushi metadata store
//!
//! Connection management plus one data access file per entity.

pub mod schema;
pub mod connection;
pub mod asset_dao;
pub mod tag_dao;
pub mod collection_dao;
pub mod folder_dao;

pub use connection::{Database, DatabaseStats};

/// `?1, ?2, ...` placeholder list for an `IN (...)` clause
pub(crate) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
