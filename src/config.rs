use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Media server
    pub server_ip: String,
    pub server_port: u16,
    pub access_token: String,
    pub music_section: String,

    // Playlist source
    pub library_xml_path: String,
    pub playlists: Vec<String>,

    // Resolution
    pub cache_db_path: String,

    // Analysis
    pub duplicate_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_ip: "localhost".to_string(),
            server_port: 32400,
            access_token: "".to_string(),
            music_section: "1".to_string(),
            library_xml_path: dirs::audio_dir()
                .unwrap_or_default()
                .join("iTunes/Library.xml")
                .to_string_lossy()
                .to_string(),
            playlists: Vec::new(),
            cache_db_path: dirs::data_dir()
                .unwrap_or_default()
                .join("playsync/cache.db")
                .to_string_lossy()
                .to_string(),
            duplicate_threshold: 0.9,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let config_path = config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    // Backup corrupt file for debugging
                    let backup_path = config_path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&config_path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playsync")
        .join("config.json")
}
