use crate::state::AppState;

pub async fn get_notes(state: &AppState) -> Result<String, String> {
    state.data.get_notes().map_err(|e| e.to_string())
}

/// Returns `true` if the stored text changed.
pub async fn save_notes(state: &AppState, text: String) -> Result<bool, String> {
    state.data.set_notes(&text).map_err(|e| e.to_string())
}
