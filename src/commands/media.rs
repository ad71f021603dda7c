use std::sync::Arc;

use crate::models::TrackInfo;
use crate::services::MusicService;
use crate::state::AppState;

async fn run_blocking<F>(state: &AppState, action: F) -> Result<TrackInfo, String>
where
    F: FnOnce(&MusicService) -> std::io::Result<TrackInfo> + Send + 'static,
{
    let music = Arc::clone(&state.music);
    tokio::task::spawn_blocking(move || action(music.as_ref()))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("Player unavailable: {}", e))
}

pub async fn play_pause(state: &AppState) -> Result<TrackInfo, String> {
    run_blocking(state, |music| music.play_pause()).await
}

pub async fn next_track(state: &AppState) -> Result<TrackInfo, String> {
    run_blocking(state, |music| music.next_track()).await
}

pub async fn prev_track(state: &AppState) -> Result<TrackInfo, String> {
    run_blocking(state, |music| music.prev_track()).await
}

/// Re-reads the player instead of returning the last polled state.
pub async fn get_track(state: &AppState) -> Result<TrackInfo, String> {
    run_blocking(state, |music| music.refresh()).await
}
