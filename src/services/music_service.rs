use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::callbacks::{CallbackId, Callbacks};
use super::poll::{interval_secs, PollState};
use crate::models::{MusicSettings, TrackInfo};

/// Runs a player-control script and returns its trimmed stdout.
pub trait ScriptBridge: Send + Sync {
    fn run(&self, script: &str) -> io::Result<String>;
}

/// AppleScript through `osascript -e`.
pub struct OsaScriptBridge;

impl ScriptBridge for OsaScriptBridge {
    fn run(&self, script: &str) -> io::Result<String> {
        let output = Command::new("osascript").args(["-e", script]).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MusicConfig {
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl From<&MusicSettings> for MusicConfig {
    fn from(settings: &MusicSettings) -> Self {
        Self {
            poll_interval: interval_secs(settings.poll_interval_secs),
            error_backoff: interval_secs(settings.error_backoff_secs),
        }
    }
}

/// Remote control and now-playing poller for a scriptable music player.
pub struct MusicService {
    bridge: Arc<dyn ScriptBridge>,
    player: String,
    config: MusicConfig,
    track: Mutex<TrackInfo>,
    callbacks: Callbacks<TrackInfo>,
    poll: PollState,
}

impl MusicService {
    pub fn new(bridge: Arc<dyn ScriptBridge>, player: impl Into<String>, config: MusicConfig) -> Self {
        Self {
            bridge,
            player: player.into(),
            config,
            track: Mutex::new(TrackInfo::default()),
            callbacks: Callbacks::new("Music"),
            poll: PollState::new(),
        }
    }

    pub fn add_callback<F>(&self, func: F) -> CallbackId
    where
        F: Fn(&TrackInfo) + Send + Sync + 'static,
    {
        self.callbacks.add(func)
    }

    pub fn remove_callback(&self, id: CallbackId) -> bool {
        self.callbacks.remove(id)
    }

    pub fn current_track(&self) -> TrackInfo {
        self.track.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn start_polling(self: &Arc<Self>) {
        let Some(generation) = self.poll.start() else {
            return;
        };
        let service = Arc::clone(self);
        tokio::spawn(async move {
            while service.poll.is_current(generation) {
                let worker = Arc::clone(&service);
                let delay = match tokio::task::spawn_blocking(move || worker.refresh()).await {
                    Ok(Ok(_)) => service.config.poll_interval,
                    Ok(Err(e)) => {
                        log::debug!("[Music] Poll error: {}", e);
                        service.config.error_backoff
                    }
                    Err(e) => {
                        log::error!("[Music] Poll task failed: {:?}", e);
                        service.config.error_backoff
                    }
                };
                tokio::time::sleep(delay).await;
            }
        });
        log::info!("[Music] Polling {} every {}s", self.player, self.config.poll_interval.as_secs());
    }

    pub fn stop_polling(&self) {
        if self.poll.stop() {
            log::info!("[Music] Polling stopped");
        }
    }

    fn tell(&self, command: &str) -> String {
        format!("tell application \"{}\" to {}", self.player, command)
    }

    /// Script output, or `None` if the bridge failed or printed nothing.
    fn query(&self, command: &str) -> Option<String> {
        match self.bridge.run(&self.tell(command)) {
            Ok(out) if !out.is_empty() => Some(out),
            Ok(_) => None,
            Err(e) => {
                log::debug!("[Music] Script error: {}", e);
                None
            }
        }
    }

    /// Reads the player state, stores it and notifies listeners. Blocking.
    ///
    /// Fails only when the bridge itself cannot run; the player is then
    /// reported closed.
    pub fn refresh(&self) -> io::Result<TrackInfo> {
        let is_running = match self
            .bridge
            .run(&format!("application \"{}\" is running", self.player))
        {
            Ok(out) => out,
            Err(e) => {
                self.publish(TrackInfo::closed(&self.player));
                return Err(e);
            }
        };

        let track = if is_running != "true" {
            TrackInfo::closed(&self.player)
        } else {
            let playing = self.query("player state as string").as_deref() == Some("playing");
            let title = self.query("name of current track as string");
            let artist = self.query("artist of current track as string");
            let album = self.query("album of current track as string");
            let position = self.query("player position as string");
            let duration = self.query("duration of current track as string");
            let (position, duration) = parse_progress(position.as_deref(), duration.as_deref());

            TrackInfo {
                title: title.unwrap_or_else(|| "Unknown Title".to_string()),
                artist: artist.unwrap_or_else(|| "Unknown Artist".to_string()),
                album: album.unwrap_or_else(|| "Unknown Album".to_string()),
                position,
                duration,
                playing,
            }
        };

        self.publish(track.clone());
        Ok(track)
    }

    fn publish(&self, track: TrackInfo) {
        if let Ok(mut current) = self.track.lock() {
            *current = track.clone();
        }
        self.callbacks.notify(&track);
    }

    fn act(&self, command: &str) -> io::Result<TrackInfo> {
        if let Err(e) = self.bridge.run(&self.tell(command)) {
            log::warn!("[Music] '{}' failed: {}", command, e);
        }
        self.refresh()
    }

    pub fn play_pause(&self) -> io::Result<TrackInfo> {
        self.act("playpause")
    }

    pub fn next_track(&self) -> io::Result<TrackInfo> {
        self.act("next track")
    }

    pub fn prev_track(&self) -> io::Result<TrackInfo> {
        self.act("previous track")
    }
}

/// Position arrives in seconds (possibly with a decimal comma), duration in
/// milliseconds. Unparsable input yields `(0, 1)`.
pub fn parse_progress(position: Option<&str>, duration: Option<&str>) -> (f64, f64) {
    let parsed = (|| -> Option<(f64, f64)> {
        let pos = match position {
            Some(raw) => raw.replace(',', ".").parse::<f64>().ok()?,
            None => 0.0,
        };
        let dur = match duration {
            Some(raw) => raw.trim().parse::<i64>().ok()? as f64 / 1000.0,
            None => 0.0,
        };
        Some((pos, dur))
    })();
    parsed.unwrap_or((0.0, 1.0))
}
