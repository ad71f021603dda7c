use serde::Serialize;

use super::{SystemStats, TrackInfo, WeatherLocation, WeatherSnapshot};

/// What the clock face shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ClockReading {
    pub time: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub app_name: String,
    pub username: String,
    pub theme: String,
    pub clock: ClockReading,
    pub weather: WeatherSnapshot,
    pub weather_location: WeatherLocation,
    pub system: SystemStats,
    pub track: TrackInfo,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub session_count: u64,
    pub last_active: Option<String>,
}
