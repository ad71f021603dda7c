use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Number;
use thiserror::Error;
use tokio::task::JoinHandle;

use super::callbacks::{CallbackId, Callbacks};
use super::poll::{interval_secs, PollState};
use crate::models::{condition_text, WeatherLocation, WeatherSettings, WeatherSnapshot};

const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const HOURLY_FIELDS: &str = "temperature_2m,relativehumidity_2m,windspeed_10m";
const USER_AGENT: &str = "Dashboard/2.0";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub current_weather: Option<CurrentWeather>,
    #[serde(default)]
    pub hourly: Option<HourlyForecast>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentWeather {
    /// Kept as sent so `3` prints as `3` and `3.0` as `3.0`.
    pub temperature: Option<Number>,
    pub windspeed: Option<Number>,
    pub weathercode: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyForecast {
    #[serde(default)]
    pub relativehumidity_2m: Option<Vec<Option<f64>>>,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, location: WeatherLocation) -> Result<ForecastResponse, WeatherError>;
}

/// Open-Meteo forecast endpoint; no API key needed.
pub struct OpenMeteoClient {
    client: reqwest::Client,
}

impl OpenMeteoClient {
    pub fn new(timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch(&self, location: WeatherLocation) -> Result<ForecastResponse, WeatherError> {
        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("latitude", location.lat.to_string()),
                ("longitude", location.lon.to_string()),
                ("current_weather", "true".to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let data = serde_json::from_str(&body)?;
        log::debug!("[Weather] Fetched forecast for ({}, {})", location.lat, location.lon);
        Ok(data)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeatherConfig {
    pub update_interval: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl From<&WeatherSettings> for WeatherConfig {
    fn from(settings: &WeatherSettings) -> Self {
        Self {
            update_interval: interval_secs(settings.update_interval_secs),
            max_retries: settings.max_retries,
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
        }
    }
}

/// Exponential back-off: `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Polls the forecast source and pushes snapshots to listeners.
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    config: WeatherConfig,
    location: Mutex<WeatherLocation>,
    current: Mutex<WeatherSnapshot>,
    callbacks: Callbacks<WeatherSnapshot>,
    poll: PollState,
}

impl WeatherService {
    pub fn new(source: Arc<dyn WeatherSource>, location: WeatherLocation, config: WeatherConfig) -> Self {
        Self {
            source,
            config,
            location: Mutex::new(location),
            current: Mutex::new(WeatherSnapshot::default()),
            callbacks: Callbacks::new("Weather"),
            poll: PollState::new(),
        }
    }

    pub fn add_callback<F>(&self, func: F) -> CallbackId
    where
        F: Fn(&WeatherSnapshot) + Send + Sync + 'static,
    {
        self.callbacks.add(func)
    }

    pub fn remove_callback(&self, id: CallbackId) -> bool {
        self.callbacks.remove(id)
    }

    pub fn start_polling(self: &Arc<Self>) {
        let Some(generation) = self.poll.start() else {
            return;
        };
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.fetch_data().await;
            while service.poll.is_current(generation) {
                tokio::time::sleep(service.config.update_interval).await;
                // May have been stopped or restarted while asleep.
                if service.poll.is_current(generation) {
                    service.fetch_data().await;
                }
            }
            log::info!("[Weather] Polling loop exited");
        });
        log::info!(
            "[Weather] Polling started (every {}s)",
            self.config.update_interval.as_secs()
        );
    }

    pub fn stop_polling(&self) {
        if self.poll.stop() {
            log::info!("[Weather] Polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll.is_running()
    }

    /// Fetches once on a separate task.
    pub fn fetch_now(self: &Arc<Self>) -> JoinHandle<bool> {
        let service = Arc::clone(self);
        log::debug!("[Weather] Immediate fetch triggered");
        tokio::spawn(async move { service.fetch_data().await })
    }

    pub fn set_location(self: &Arc<Self>, lat: f64, lon: f64) -> JoinHandle<bool> {
        if let Ok(mut location) = self.location.lock() {
            *location = WeatherLocation { lat, lon };
        }
        self.fetch_now()
    }

    pub fn location(&self) -> WeatherLocation {
        self.location.lock().map(|l| *l).unwrap_or_default()
    }

    pub fn current_weather(&self) -> WeatherSnapshot {
        self.current.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Runs the retry loop; returns `false` when every attempt failed and the
    /// service went offline.
    pub async fn fetch_data(&self) -> bool {
        let max = self.config.max_retries;
        for attempt in 0..max {
            let location = self.location();
            match self.source.fetch(location).await {
                Ok(data) => {
                    self.process_data(data);
                    return true;
                }
                Err(WeatherError::Decode(e)) => {
                    log::error!("[Weather] Invalid JSON response from weather API: {}", e);
                    break;
                }
                Err(e) => {
                    log::warn!(
                        "[Weather] Fetch failed (attempt {}/{}): {}",
                        attempt + 1,
                        max,
                        e
                    );
                }
            }

            if attempt + 1 < max {
                tokio::time::sleep(backoff_delay(self.config.retry_delay, attempt)).await;
            }
        }

        self.set_offline_status();
        false
    }

    fn process_data(&self, data: ForecastResponse) {
        let Some(current) = data.current_weather else {
            log::warn!("[Weather] Response missing 'current_weather' field");
            return;
        };
        let (Some(temp), Some(wind), Some(code)) =
            (current.temperature, current.windspeed, current.weathercode)
        else {
            log::warn!("[Weather] Incomplete weather data received");
            return;
        };

        let humidity = data
            .hourly
            .and_then(|h| h.relativehumidity_2m)
            .and_then(|values| values.into_iter().next().flatten())
            .map(|h| format!("{}%", h))
            .unwrap_or_else(|| "N/A".to_string());

        let condition = condition_text(code);
        let snapshot = WeatherSnapshot {
            temperature: format!("{}°C", temp),
            condition: condition.clone(),
            wind_speed: format!("{} km/h", wind),
            humidity,
            last_updated: Some(chrono::Local::now().format("%H:%M").to_string()),
        };

        if let Ok(mut current) = self.current.lock() {
            *current = snapshot;
        }
        self.notify();
        log::info!("[Weather] Updated: {}°C, {}", temp, condition);
    }

    fn set_offline_status(&self) {
        if let Ok(mut current) = self.current.lock() {
            current.condition = "Offline".to_string();
        }
        self.notify();
        log::error!("[Weather] Service is offline");
    }

    fn notify(&self) {
        let snapshot = self.current_weather();
        self.callbacks.notify(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::mpsc;

    struct FakeSource {
        replies: Mutex<VecDeque<Result<ForecastResponse, WeatherError>>>,
        seen: Mutex<Vec<WeatherLocation>>,
    }

    impl FakeSource {
        fn new(replies: Vec<Result<ForecastResponse, WeatherError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch(&self, location: WeatherLocation) -> Result<ForecastResponse, WeatherError> {
            self.seen.lock().unwrap().push(location);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(WeatherError::Status(503)))
        }
    }

    fn config() -> WeatherConfig {
        WeatherConfig {
            update_interval: Duration::from_secs(3600),
            max_retries: 3,
            retry_delay: Duration::ZERO,
        }
    }

    fn forecast(json: &str) -> ForecastResponse {
        serde_json::from_str(json).unwrap()
    }

    fn good_forecast() -> ForecastResponse {
        forecast(
            r#"{
                "current_weather": { "temperature": 14.2, "windspeed": 21.0, "weathercode": 61 },
                "hourly": { "relativehumidity_2m": [65, 70, 72] }
            }"#,
        )
    }

    fn decode_error() -> WeatherError {
        WeatherError::Decode(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
    }

    fn service(source: Arc<FakeSource>) -> Arc<WeatherService> {
        Arc::new(WeatherService::new(source, WeatherLocation::default(), config()))
    }

    #[tokio::test]
    async fn successful_fetch_formats_and_notifies() {
        let source = FakeSource::new(vec![Ok(good_forecast())]);
        let weather = service(Arc::clone(&source));
        let (tx, mut rx) = mpsc::unbounded_channel();
        weather.add_callback(move |w: &WeatherSnapshot| {
            let _ = tx.send(w.clone());
        });

        assert!(weather.fetch_data().await);

        let pushed = rx.try_recv().unwrap();
        assert_eq!(pushed.temperature, "14.2°C");
        assert_eq!(pushed.condition, "Rain");
        assert_eq!(pushed.wind_speed, "21.0 km/h");
        assert_eq!(pushed.humidity, "65%");
        assert!(pushed.last_updated.is_some());
        assert_eq!(weather.current_weather(), pushed);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn humidity_falls_back_when_hourly_missing() {
        let source = FakeSource::new(vec![Ok(forecast(
            r#"{ "current_weather": { "temperature": 3, "windspeed": 5.5, "weathercode": 0 } }"#,
        ))]);
        let weather = service(source);
        assert!(weather.fetch_data().await);

        let now = weather.current_weather();
        assert_eq!(now.humidity, "N/A");
        assert_eq!(now.temperature, "3°C");
        assert_eq!(now.wind_speed, "5.5 km/h");
        assert_eq!(now.condition, "Clear Sky");
    }

    #[tokio::test]
    async fn incomplete_payload_leaves_state_untouched() {
        let source = FakeSource::new(vec![
            Ok(forecast(r#"{ "hourly": {} }"#)),
            Ok(forecast(r#"{ "current_weather": { "temperature": 9.0 } }"#)),
        ]);
        let weather = service(Arc::clone(&source));
        let (tx, mut rx) = mpsc::unbounded_channel();
        weather.add_callback(move |w: &WeatherSnapshot| {
            let _ = tx.send(w.clone());
        });

        assert!(weather.fetch_data().await);
        assert!(weather.fetch_data().await);
        assert_eq!(weather.current_weather(), WeatherSnapshot::default());
        assert!(rx.try_recv().is_err());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn repeated_http_failures_go_offline() {
        let source = FakeSource::new(vec![
            Err(WeatherError::Status(500)),
            Err(WeatherError::Status(502)),
            Err(WeatherError::Status(503)),
        ]);
        let weather = service(Arc::clone(&source));
        let (tx, mut rx) = mpsc::unbounded_channel();
        weather.add_callback(move |w: &WeatherSnapshot| {
            let _ = tx.send(w.clone());
        });

        assert!(!weather.fetch_data().await);
        assert_eq!(source.calls(), 3);

        let pushed = rx.try_recv().unwrap();
        assert_eq!(pushed.condition, "Offline");
        assert_eq!(pushed.temperature, "--");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn decode_errors_are_not_retried() {
        let source = FakeSource::new(vec![Err(decode_error()), Ok(good_forecast())]);
        let weather = service(Arc::clone(&source));

        assert!(!weather.fetch_data().await);
        assert_eq!(source.calls(), 1);
        assert_eq!(weather.current_weather().condition, "Offline");
    }

    #[tokio::test]
    async fn transient_failure_then_success() {
        let source = FakeSource::new(vec![Err(WeatherError::Status(504)), Ok(good_forecast())]);
        let weather = service(Arc::clone(&source));

        assert!(weather.fetch_data().await);
        assert_eq!(source.calls(), 2);
        assert_eq!(weather.current_weather().condition, "Rain");
    }

    #[tokio::test]
    async fn offline_keeps_last_good_reading() {
        let source = FakeSource::new(vec![Ok(good_forecast())]);
        let weather = service(source);
        assert!(weather.fetch_data().await);
        assert!(!weather.fetch_data().await);

        let now = weather.current_weather();
        assert_eq!(now.condition, "Offline");
        assert_eq!(now.temperature, "14.2°C");
    }

    #[tokio::test]
    async fn set_location_refetches_with_new_coordinates() {
        let source = FakeSource::new(vec![Ok(good_forecast())]);
        let weather = service(Arc::clone(&source));

        assert!(weather.set_location(48.8566, 2.3522).await.unwrap());
        assert_eq!(weather.location(), WeatherLocation { lat: 48.8566, lon: 2.3522 });
        assert_eq!(
            source.seen.lock().unwrap().last().copied(),
            Some(WeatherLocation { lat: 48.8566, lon: 2.3522 })
        );
    }

    #[tokio::test]
    async fn start_polling_fetches_immediately_and_only_once() {
        let source = FakeSource::new(vec![Ok(good_forecast())]);
        let weather = service(Arc::clone(&source));
        let (tx, mut rx) = mpsc::unbounded_channel();
        weather.add_callback(move |w: &WeatherSnapshot| {
            let _ = tx.send(w.clone());
        });

        weather.start_polling();
        weather.start_polling();
        assert!(weather.is_running());

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.condition, "Rain");
        assert_eq!(source.calls(), 1);

        weather.stop_polling();
        assert!(!weather.is_running());
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        let base = Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn readings_print_as_the_api_sent_them() {
        let source = FakeSource::new(vec![Ok(forecast(
            r#"{ "current_weather": { "temperature": -3.0, "windspeed": 12, "weathercode": 3 } }"#,
        ))]);
        let weather = service(source);
        assert!(weather.fetch_data().await);

        let now = weather.current_weather();
        assert_eq!(now.temperature, "-3.0°C");
        assert_eq!(now.wind_speed, "12 km/h");
    }

    #[tokio::test]
    async fn restart_while_asleep_leaves_one_loop() {
        let source = FakeSource::new(vec![
            Ok(good_forecast()),
            Ok(good_forecast()),
            Ok(good_forecast()),
        ]);
        let weather = Arc::new(WeatherService::new(
            Arc::clone(&source) as Arc<dyn WeatherSource>,
            WeatherLocation::default(),
            WeatherConfig {
                update_interval: Duration::from_millis(200),
                ..config()
            },
        ));

        weather.start_polling();
        tokio::time::sleep(Duration::from_millis(50)).await;
        weather.stop_polling();
        weather.start_polling();
        // The new loop fetches at once and again at ~250ms; the retired loop
        // would add another fetch when it wakes at ~200ms.
        tokio::time::sleep(Duration::from_millis(320)).await;
        weather.stop_polling();

        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn zero_interval_in_settings_is_raised() {
        let mut settings = WeatherSettings::default();
        settings.update_interval_secs = 0;
        assert_eq!(WeatherConfig::from(&settings).update_interval, Duration::from_secs(1));
    }
}
