// SPDX-License-Identifier: AGPL-3.0
// Home Cinema Core - Settings persistence
//
// Settings are stored in a local JSON file next to the favorites record.

use crate::types::{AppError, Category};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Environment variable that overrides the catalog API key
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Application settings (GUI-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Catalog API root, without trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Catalog API key sent as the `api_key` query parameter
    #[serde(default)]
    pub api_key: String,
    /// Root of poster image URLs
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Poster size segment, e.g. "w500"
    #[serde(default = "default_image_size")]
    pub image_size: String,
    /// Listing shown when the app opens
    #[serde(default)]
    pub default_category: Category,
    /// Per-request timeout for catalog calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/".to_string()
}

fn default_image_size() -> String {
    "w500".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            image_base_url: default_image_base_url(),
            image_size: default_image_size(),
            default_category: Category::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppSettings {
    /// Apply environment overrides on top of the stored values
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = key.trim().to_string();
            }
        }
        self
    }

    /// Check that the settings can be used to build a catalog client
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, url) in [
            ("apiBaseUrl", &self.api_base_url),
            ("imageBaseUrl", &self.image_base_url),
        ] {
            let host = url
                .strip_prefix("https://")
                .or_else(|| url.strip_prefix("http://"))
                .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or(""));

            match host {
                Some(host) if !host.trim().is_empty() => {}
                _ => {
                    return Err(AppError::InvalidConfig(format!(
                        "{} must be an http(s) URL with a host, got {:?}",
                        name, url
                    )));
                }
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Open the settings file in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        Self::open(crate::kv::config_dir()?.join("settings.json"))
    }

    /// Open settings at an explicit path, writing defaults if it is missing
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            tracing::info!("Loading settings from disk");
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::FileIo(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                AppSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !store.file_path.exists() {
            tracing::info!("Creating initial settings file");
            store.persist()?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn persist(&self) -> Result<(), AppError> {
        let content = {
            let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*settings).map_err(|e| {
                AppError::Serialization(format!("Failed to serialize settings: {}", e))
            })?
        };

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;
        }

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Current settings as stored, without environment overrides
    pub fn get(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current settings with environment overrides applied
    pub fn effective(&self) -> AppSettings {
        self.get().with_env_overrides()
    }

    /// Validate, replace, and persist settings
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        new_settings.validate()?;
        tracing::info!(
            "Updating settings, default category: {}",
            new_settings.default_category
        );
        {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            *settings = new_settings;
        }

        let result = self.persist();
        if result.is_ok() {
            tracing::info!("Settings persisted successfully");
        } else {
            tracing::error!("Failed to persist settings: {:?}", result);
        }
        result
    }
}
