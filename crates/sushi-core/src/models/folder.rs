//! Watch folder data model

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root directory recursively scanned for model files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchFolder {
    pub folder_id: i64,
    pub folder_path: String,
    pub created_at: String,
}

impl WatchFolder {
    pub fn path(&self) -> &Path {
        Path::new(&self.folder_path)
    }

    pub fn path_buf(&self) -> PathBuf {
        PathBuf::from(&self.folder_path)
    }
}
