use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;

use crate::models::{DashboardDocument, MonthView, Settings, WeatherLocation};
use crate::services::poll::interval_secs;
use crate::services::{
    ClockService, MusicConfig, MusicService, OpenMeteoClient, OsaScriptBridge, ScriptBridge,
    SimulatedSampler, StatsSampler, SysinfoSampler, SystemService, WeatherService, WeatherSource,
};
use crate::storage::DataManager;
use crate::utils::config;

/// Adapters the services talk to. Swapped for fakes in tests.
pub struct Backends {
    pub weather: Arc<dyn WeatherSource>,
    pub sampler: Box<dyn StatsSampler>,
    pub player: Arc<dyn ScriptBridge>,
}

impl Backends {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let weather = OpenMeteoClient::new(Duration::from_secs(settings.weather.request_timeout_secs))
            .context("building weather client")?;
        let sampler: Box<dyn StatsSampler> = if settings.system.simulate {
            Box::new(SimulatedSampler)
        } else {
            Box::new(SysinfoSampler::new())
        };
        Ok(Self {
            weather: Arc::new(weather),
            sampler,
            player: Arc::new(OsaScriptBridge),
        })
    }
}

/// Everything the command layer needs, shared for the life of the process.
pub struct AppState {
    pub data_dir: PathBuf,
    pub settings: Mutex<Settings>,
    pub data: Arc<DataManager>,
    pub weather: Arc<WeatherService>,
    pub system: Arc<SystemService>,
    pub music: Arc<MusicService>,
    pub clock: Arc<ClockService>,
    pub calendar: Mutex<MonthView>,
}

impl AppState {
    pub fn initialize(data_dir: &Path, settings: Settings) -> Result<Self> {
        let backends = Backends::from_settings(&settings)?;
        Self::with_backends(data_dir, settings, backends)
    }

    pub fn with_backends(data_dir: &Path, settings: Settings, backends: Backends) -> Result<Self> {
        let data_path = config::data_file_path(data_dir, &settings);
        let defaults = DashboardDocument::with_location(WeatherLocation {
            lat: settings.weather.default_lat,
            lon: settings.weather.default_lon,
        });
        let data = DataManager::open(&data_path, defaults)
            .with_context(|| format!("opening {}", data_path.display()))?;
        let location = data.get_weather_location()?;

        let weather = WeatherService::new(backends.weather, location, (&settings.weather).into());
        let system = SystemService::new(
            backends.sampler,
            interval_secs(settings.system.poll_interval_secs),
        );
        let music = MusicService::new(
            backends.player,
            settings.music.player.clone(),
            MusicConfig::from(&settings.music),
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            data: Arc::new(data),
            weather: Arc::new(weather),
            system: Arc::new(system),
            music: Arc::new(music),
            clock: Arc::new(ClockService::new()),
            calendar: Mutex::new(MonthView::containing(Local::now().date_naive())),
            settings: Mutex::new(settings),
        })
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Starts every enabled poller. Must run inside a tokio runtime.
    pub fn start_services(&self) {
        let settings = self.settings();
        self.clock.start();
        if settings.weather.enabled {
            self.weather.start_polling();
        }
        if settings.system.enabled {
            self.system.start_polling();
        }
        if settings.music.enabled {
            self.music.start_polling();
        }
    }

    pub fn shutdown(&self) {
        self.clock.stop();
        self.weather.stop_polling();
        self.system.stop_polling();
        self.music.stop_polling();
        if let Err(e) = self.data.save() {
            log::error!("[App] Final save failed: {}", e);
        }
    }
}
