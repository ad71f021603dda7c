pub mod callbacks;
pub mod clock;
pub mod music_service;
pub mod poll;
pub mod system_service;
pub mod weather_service;

pub use callbacks::{CallbackId, Callbacks};
pub use clock::ClockService;
pub use music_service::{MusicConfig, MusicService, OsaScriptBridge, ScriptBridge};
pub use system_service::{SimulatedSampler, StatsSampler, SysinfoSampler, SystemService};
pub use weather_service::{OpenMeteoClient, WeatherConfig, WeatherError, WeatherService, WeatherSource};
