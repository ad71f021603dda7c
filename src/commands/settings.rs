use crate::models::Settings;
use crate::state::AppState;
use crate::utils::config;

pub async fn get_settings(state: &AppState) -> Result<Settings, String> {
    Ok(state.settings())
}

/// Persists `settings`. Poll intervals and adapters are read at startup, so
/// those changes apply on the next launch.
pub async fn update_settings(state: &AppState, settings: Settings) -> Result<(), String> {
    config::write_settings(&state.data_dir, &settings).map_err(|e| e.to_string())?;
    let mut current = state
        .settings
        .lock()
        .map_err(|_| "Settings state poisoned".to_string())?;
    *current = settings;
    Ok(())
}

/// Returns the stored username. Blank input leaves it unchanged.
pub async fn update_profile(state: &AppState, username: String) -> Result<String, String> {
    let name = username.trim();
    if !name.is_empty() {
        state.data.set_username(name).map_err(|e| e.to_string())?;
    }
    state.data.get_username().map_err(|e| e.to_string())
}

pub async fn set_theme(state: &AppState, theme: String) -> Result<String, String> {
    let theme = theme.trim().to_lowercase();
    if theme.is_empty() {
        return Err("Theme name is empty".to_string());
    }
    state.data.set_theme(&theme).map_err(|e| e.to_string())?;
    Ok(theme)
}

fn parse_coordinate(raw: &str, limit: f64, label: &str) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|_| "Invalid Input".to_string())?;
    if !value.is_finite() || value.abs() > limit {
        return Err(format!("{} must be between -{} and {}", label, limit, limit));
    }
    Ok(value)
}

/// Stores the new location and triggers an immediate weather fetch.
pub async fn update_weather_location(state: &AppState, lat: String, lon: String) -> Result<(), String> {
    let lat = parse_coordinate(&lat, 90.0, "Latitude")?;
    let lon = parse_coordinate(&lon, 180.0, "Longitude")?;
    state
        .data
        .set_weather_location(lat, lon)
        .map_err(|e| e.to_string())?;
    state.weather.set_location(lat, lon);
    log::info!("[Settings] Weather location set to {}, {}", lat, lon);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherLocation;
    use crate::state::testing::state_in;
    use tempfile::tempdir;

    #[tokio::test]
    async fn blank_username_is_ignored() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());

        assert_eq!(update_profile(&state, "  Ada ".to_string()).await.unwrap(), "Ada");
        assert_eq!(update_profile(&state, "   ".to_string()).await.unwrap(), "Ada");
    }

    #[tokio::test]
    async fn location_input_is_validated() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());
        let before = state.data.get_weather_location().unwrap();

        let err = update_weather_location(&state, "north".to_string(), "0".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, "Invalid Input");
        assert!(update_weather_location(&state, "91".to_string(), "0".to_string())
            .await
            .is_err());
        assert!(update_weather_location(&state, "0".to_string(), "-180.5".to_string())
            .await
            .is_err());
        assert_eq!(state.data.get_weather_location().unwrap(), before);
    }

    #[tokio::test]
    async fn valid_location_reaches_store_and_service() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());

        update_weather_location(&state, " 48.8566".to_string(), "2.3522 ".to_string())
            .await
            .unwrap();
        let expected = WeatherLocation { lat: 48.8566, lon: 2.3522 };
        assert_eq!(state.data.get_weather_location().unwrap(), expected);
        assert_eq!(state.weather.location(), expected);
    }

    #[tokio::test]
    async fn settings_are_written_to_the_config_dir() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());
        let mut settings = get_settings(&state).await.unwrap();
        settings.general.color_theme = "green".to_string();

        update_settings(&state, settings).await.unwrap();
        assert_eq!(state.settings().general.color_theme, "green");
        assert_eq!(config::read_settings(dir.path()).general.color_theme, "green");
    }
}
