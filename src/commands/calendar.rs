use chrono::Local;

use crate::models::MonthView;
use crate::state::AppState;

fn with_view<F>(state: &AppState, change: F) -> Result<MonthView, String>
where
    F: FnOnce(MonthView) -> MonthView,
{
    let mut view = state
        .calendar
        .lock()
        .map_err(|_| "Calendar state poisoned".to_string())?;
    *view = change(*view);
    Ok(*view)
}

pub async fn get_calendar(state: &AppState) -> Result<MonthView, String> {
    with_view(state, |view| view)
}

pub async fn next_month(state: &AppState) -> Result<MonthView, String> {
    with_view(state, MonthView::next)
}

pub async fn prev_month(state: &AppState) -> Result<MonthView, String> {
    with_view(state, MonthView::prev)
}

pub async fn current_month(state: &AppState) -> Result<MonthView, String> {
    with_view(state, |_| MonthView::containing(Local::now().date_naive()))
}
