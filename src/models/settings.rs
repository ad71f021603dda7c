use serde::{Deserialize, Serialize};

pub const DEFAULT_WEATHER_LAT: f64 = -37.9038;
pub const DEFAULT_WEATHER_LON: f64 = 145.0396;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: String,
    pub general: GeneralSettings,
    pub storage: StorageSettings,
    pub weather: WeatherSettings,
    pub system: SystemSettings,
    pub music: MusicSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "2.0.0".to_string(),
            general: GeneralSettings::default(),
            storage: StorageSettings::default(),
            weather: WeatherSettings::default(),
            system: SystemSettings::default(),
            music: MusicSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub app_name: String,
    pub author: String,
    pub theme_mode: String,
    pub color_theme: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            app_name: "Zenith OS".to_string(),
            author: "Commander".to_string(),
            theme_mode: "Dark".to_string(),
            color_theme: "blue".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: "titanium_data.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub enabled: bool,
    pub default_lat: f64,
    pub default_lon: f64,
    pub update_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_lat: DEFAULT_WEATHER_LAT,
            default_lon: DEFAULT_WEATHER_LON,
            update_interval_secs: 600,
            request_timeout_secs: 10,
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    /// Use generated numbers instead of sampling the OS.
    pub simulate: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 1,
            simulate: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicSettings {
    pub enabled: bool,
    pub player: String,
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            player: "Spotify".to_string(),
            poll_interval_secs: 1,
            error_backoff_secs: 5,
        }
    }
}
