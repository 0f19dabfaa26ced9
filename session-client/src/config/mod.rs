use client_core::error::ClientError;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL of the club API, without a trailing slash
    /// (e.g. `https://api.example.com`).
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Path of the on-device session store file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "session-store.json".to_string()
}

impl Settings {
    pub fn load() -> Result<Self, ClientError> {
        client_core::config::load("APP")
    }
}
