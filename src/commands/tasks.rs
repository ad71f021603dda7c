use crate::models::{sorted_for_display, Priority, Task, TaskFilter};
use crate::state::AppState;

pub async fn add_task(state: &AppState, text: String, priority: Priority) -> Result<Task, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("Task text is empty".to_string());
    }
    let task = state.data.add_task(text, priority).map_err(|e| e.to_string())?;
    log::info!("[Tasks] Added {} ({})", task.id, task.priority);
    Ok(task)
}

pub async fn toggle_task(state: &AppState, task_id: i64) -> Result<Task, String> {
    state
        .data
        .toggle_task(task_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No task with id {}", task_id))
}

pub async fn delete_task(state: &AppState, task_id: i64) -> Result<(), String> {
    if state.data.delete_task(task_id).map_err(|e| e.to_string())? {
        Ok(())
    } else {
        Err(format!("No task with id {}", task_id))
    }
}

/// Tasks matching `filter`, open ones first.
pub async fn get_tasks(state: &AppState, filter: TaskFilter) -> Result<Vec<Task>, String> {
    let tasks = state.data.get_tasks(filter).map_err(|e| e.to_string())?;
    Ok(sorted_for_display(&tasks))
}

pub async fn clear_completed(state: &AppState) -> Result<usize, String> {
    state.data.clear_completed_tasks().map_err(|e| e.to_string())
}
