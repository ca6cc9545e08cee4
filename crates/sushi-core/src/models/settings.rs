//! Application settings model

use serde::{Deserialize, Serialize};

/// Scanner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSettings {
    /// Skip directories whose name starts with a dot
    pub skip_hidden: bool,
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
    /// Follow symbolic links during the walk
    pub follow_links: bool,
    /// Re-scan every watch folder in the background at startup
    pub scan_on_startup: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            skip_hidden: false,
            exclude_dirs: Vec::new(),
            follow_links: false,
            scan_on_startup: true,
        }
    }
}

/// Local file server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileServerSettings {
    /// Only serve files that live under a registered watch folder.
    ///
    /// On by default: a request for a model outside every watch folder gets 403
    /// even when the file exists. Turn it off to serve any readable glb/gltf path.
    pub restrict_to_watch_folders: bool,
    /// `max-age` advertised in `Cache-Control`
    pub cache_max_age_secs: u32,
}

impl Default for FileServerSettings {
    fn default() -> Self {
        Self {
            restrict_to_watch_folders: true,
            cache_max_age_secs: 3600,
        }
    }
}

/// Library view settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibrarySettings {
    /// Row limit for the recently used / recently added views
    pub recent_limit: u32,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self { recent_limit: 200 }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub scan: ScanSettings,
    pub file_server: FileServerSettings,
    pub library: LibrarySettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"fileServer":{"cacheMaxAgeSecs":60}}"#).unwrap();
        assert_eq!(settings.file_server.cache_max_age_secs, 60);
        assert!(settings.file_server.restrict_to_watch_folders);
        assert_eq!(settings.library.recent_limit, 200);
        assert!(settings.scan.scan_on_startup);
    }
}
