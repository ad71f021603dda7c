use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: String,
    pub condition: String,
    pub wind_speed: String,
    pub humidity: String,
    pub last_updated: Option<String>,
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self {
            temperature: "--".to_string(),
            condition: "Loading...".to_string(),
            wind_speed: "--".to_string(),
            humidity: "--".to_string(),
            last_updated: None,
        }
    }
}

impl WeatherSnapshot {
    /// One-line summary for the top bar, e.g. `Rain • 14.2°C`.
    pub fn headline(&self) -> String {
        format!("{} \u{2022} {}", self.condition, self.temperature)
    }
}

/// Maps WMO weather interpretation codes to readable text.
pub fn condition_text(code: i64) -> String {
    let label = match code {
        0 => "Clear Sky",
        1..=3 => "Partly Cloudy",
        45 | 48 => "Foggy",
        51 | 53 | 55 => "Drizzle",
        61 | 63 | 65 => "Rain",
        71 | 73 | 75 => "Snow",
        80..=82 => "Rain Showers",
        95 | 96 | 99 => "Thunderstorm",
        other => return format!("Unknown ({})", other),
    };
    label.to_string()
}
