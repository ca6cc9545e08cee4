//! Collection data model

use serde::{Deserialize, Serialize};

/// Icon used when a collection is created without one
pub const DEFAULT_COLLECTION_ICON: &str = "\u{1F4C1}";

/// User-defined grouping of assets, independent of folder structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_id: i64,
    pub collection_name: String,
    pub description: String,
    pub icon: String,
    pub created_at: String,
    /// Number of member assets
    pub asset_count: i64,
}

/// Input for creating a collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollection {
    pub collection_name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl CreateCollection {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            collection_name: name.into(),
            ..Default::default()
        }
    }
}

/// Input for updating a collection; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollection {
    pub collection_name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}
