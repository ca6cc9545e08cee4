//! Application settings persistence

use crate::models::AppSettings;
use crate::paths::PathProvider;
use crate::utils::error::AppError;
use std::fs;
use std::path::PathBuf;

/// Loads and saves `settings.json`
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(provider: &dyn PathProvider) -> Result<Self, AppError> {
        Self::from_path(provider.settings_path())
    }

    pub fn from_path(settings_path: PathBuf) -> Result<Self, AppError> {
        if let Some(parent) = settings_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("cannot create config directory: {}", e)))?;
        }

        Ok(Self { settings_path })
    }

    /// Read settings, falling back to defaults when the file does not exist
    pub fn load(&self) -> Result<AppSettings, AppError> {
        if !self.settings_path.exists() {
            tracing::info!("no settings file at {:?}, using defaults", self.settings_path);
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&self.settings_path)
            .map_err(|e| AppError::Config(format!("cannot read settings file: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("malformed settings file: {}", e)))?;

        tracing::info!("loaded settings from {:?}", self.settings_path);
        Ok(settings)
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Config(format!("cannot serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content)
            .map_err(|e| AppError::Config(format!("cannot write settings file: {}", e)))?;

        tracing::info!("saved settings to {:?}", self.settings_path);
        Ok(())
    }

    pub fn reset(&self) -> Result<AppSettings, AppError> {
        let default_settings = AppSettings::default();
        self.save(&default_settings)?;
        Ok(default_settings)
    }

    pub fn path(&self) -> &PathBuf {
        &self.settings_path
    }
}
