//! Asset data model

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One indexed model file plus its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_id: i64,
    /// Absolute path on disk, the natural key
    pub absolute_path: String,
    pub filename: String,
    /// Owning watch folder
    pub folder_id: i64,
    /// Size in bytes
    pub file_size: i64,
    pub modified_at: String,
    /// Opaque encoded image stored by the renderer, empty when absent
    pub thumbnail: String,
    pub favorited: bool,
    pub last_used_at: Option<String>,
    pub poly_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Asset {
    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail.is_empty()
    }
}

/// Current UTC time in RFC 3339 with millisecond precision.
///
/// Lexical order matches chronological order, which the recent-* queries rely on.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
