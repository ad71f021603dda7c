use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::settings::{DEFAULT_WEATHER_LAT, DEFAULT_WEATHER_LON};
use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub lat: f64,
    pub lon: f64,
}

impl Default for WeatherLocation {
    fn default() -> Self {
        Self {
            lat: DEFAULT_WEATHER_LAT,
            lon: DEFAULT_WEATHER_LON,
        }
    }
}

/// Everything the dashboard persists, stored as one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    pub tasks: Vec<Task>,
    pub notes: String,
    pub username: String,
    pub theme: String,
    pub weather_location: WeatherLocation,
    pub last_active: Option<String>,
    pub session_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
}

impl Default for DashboardDocument {
    fn default() -> Self {
        Self::with_location(WeatherLocation::default())
    }
}

impl DashboardDocument {
    pub fn with_location(weather_location: WeatherLocation) -> Self {
        Self {
            tasks: Vec::new(),
            notes: String::new(),
            username: "Commander".to_string(),
            theme: "dark".to_string(),
            weather_location,
            last_active: None,
            session_count: 0,
            last_saved: None,
        }
    }

    /// Overlays the known top-level keys of `value` onto `self`.
    ///
    /// Keys that are missing or hold the wrong type keep their current value,
    /// unknown keys are ignored. Malformed entries inside `tasks` are skipped
    /// one by one. Returns the names of the keys that were rejected.
    pub fn merge_from(&mut self, value: Value) -> Vec<String> {
        let mut rejected = Vec::new();
        let Value::Object(mut map) = value else {
            rejected.push("<root>".to_string());
            return rejected;
        };

        if let Some(raw_tasks) = map.remove("tasks") {
            match raw_tasks {
                Value::Array(items) => {
                    self.tasks = items
                        .into_iter()
                        .enumerate()
                        .filter_map(|(idx, item)| match serde_json::from_value::<Task>(item) {
                            Ok(task) => Some(task),
                            Err(_) => {
                                rejected.push(format!("tasks[{}]", idx));
                                None
                            }
                        })
                        .collect();
                }
                _ => {
                    self.tasks = Vec::new();
                    rejected.push("tasks".to_string());
                }
            }
        }

        take_field(&mut map, "notes", &mut self.notes, &mut rejected);
        take_field(&mut map, "username", &mut self.username, &mut rejected);
        take_field(&mut map, "theme", &mut self.theme, &mut rejected);
        take_field(&mut map, "weather_location", &mut self.weather_location, &mut rejected);
        take_field(&mut map, "last_active", &mut self.last_active, &mut rejected);
        take_field(&mut map, "session_count", &mut self.session_count, &mut rejected);
        take_field(&mut map, "last_saved", &mut self.last_saved, &mut rejected);

        rejected
    }
}

fn take_field<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &str,
    slot: &mut T,
    rejected: &mut Vec<String>,
) {
    if let Some(raw) = map.remove(key) {
        match serde_json::from_value(raw) {
            Ok(value) => *slot = value,
            Err(_) => rejected.push(key.to_string()),
        }
    }
}
