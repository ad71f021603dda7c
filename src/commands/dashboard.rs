use crate::models::{DashboardOverview, TaskFilter};
use crate::state::AppState;

/// Everything the dashboard face shows, read from the stores and services.
pub async fn get_dashboard_overview(state: &AppState) -> Result<DashboardOverview, String> {
    let doc = state.data.snapshot().map_err(|e| e.to_string())?;
    let completed_tasks = doc
        .tasks
        .iter()
        .filter(|t| TaskFilter::Completed.matches(t))
        .count();

    Ok(DashboardOverview {
        app_name: state.settings().general.app_name,
        username: doc.username,
        theme: doc.theme,
        clock: state.clock.current(),
        weather: state.weather.current_weather(),
        weather_location: state.weather.location(),
        system: state.system.stats(),
        track: state.music.current_track(),
        active_tasks: doc.tasks.len() - completed_tasks,
        completed_tasks,
        session_count: doc.session_count,
        last_active: doc.last_active,
    })
}
