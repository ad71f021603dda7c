use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Seconds into the track.
    pub position: f64,
    /// Track length in seconds.
    pub duration: f64,
    pub playing: bool,
}

impl Default for TrackInfo {
    fn default() -> Self {
        Self {
            title: "Not playing".to_string(),
            artist: "Unknown Artist".to_string(),
            album: "Unknown Album".to_string(),
            position: 0.0,
            duration: 0.0,
            playing: false,
        }
    }
}

impl TrackInfo {
    /// State reported while the player application is not running.
    pub fn closed(player: &str) -> Self {
        Self {
            title: format!("{} Closed", player),
            artist: "--".to_string(),
            album: "--".to_string(),
            position: 0.0,
            duration: 100.0,
            playing: false,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// `m:ss` rendering of a number of seconds.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
