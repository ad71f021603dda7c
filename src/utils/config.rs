use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::Settings;
use crate::storage::to_pretty_json;

const ENV_DATA_DIR: &str = "ZENITH_DATA_DIR";
const ENV_WEATHER_LAT: &str = "ZENITH_WEATHER_LAT";
const ENV_WEATHER_LON: &str = "ZENITH_WEATHER_LON";
const ENV_SIMULATE_STATS: &str = "ZENITH_SIMULATE_STATS";

pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `ZENITH_DATA_DIR`, else the platform data directory.
pub fn data_dir() -> PathBuf {
    env_var(ENV_DATA_DIR)
        .map(PathBuf::from)
        .or_else(|| dirs::data_dir().map(|d| d.join("zenith")))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config").join("settings.json")
}

pub fn data_file_path(data_dir: &Path, settings: &Settings) -> PathBuf {
    data_dir.join(&settings.storage.data_file)
}

/// Settings from disk with environment overrides. A missing or unreadable
/// file falls back to defaults.
pub fn read_settings(data_dir: &Path) -> Settings {
    let path = settings_path(data_dir);
    let mut settings = if path.exists() {
        match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<Settings>(&content)?))
        {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("[Config] Ignoring {}: {}", path.display(), e);
                Settings::default()
            }
        }
    } else {
        Settings::default()
    };
    apply_env_defaults(&mut settings);
    settings
}

pub fn write_settings(data_dir: &Path, settings: &Settings) -> Result<PathBuf> {
    let path = settings_path(data_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let content = to_pretty_json(settings)?;
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn apply_env_defaults(settings: &mut Settings) {
    apply_overrides(settings, env_var);
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(lat) = lookup(ENV_WEATHER_LAT).and_then(|v| v.parse::<f64>().ok()) {
        settings.weather.default_lat = lat;
    }
    if let Some(lon) = lookup(ENV_WEATHER_LON).and_then(|v| v.parse::<f64>().ok()) {
        settings.weather.default_lon = lon;
    }
    if let Some(flag) = lookup(ENV_SIMULATE_STATS) {
        settings.system.simulate = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }
}
