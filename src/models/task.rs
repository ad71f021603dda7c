use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Format used for `created_at` / `completed_at`.
pub const TASK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    High,
    #[default]
    #[serde(other)]
    Normal,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub done: bool,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    pub fn new(id: i64, text: String, priority: Priority, now: DateTime<Local>) -> Self {
        Self {
            id,
            text,
            done: false,
            created_at: now.format(TASK_TIME_FORMAT).to_string(),
            completed_at: None,
            priority,
        }
    }

    /// Flips completion and keeps `completed_at` in step with it.
    pub fn toggle(&mut self, now: DateTime<Local>) {
        self.done = !self.done;
        self.completed_at = if self.done {
            Some(now.format(TASK_TIME_FORMAT).to_string())
        } else {
            None
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.done,
            TaskFilter::Completed => task.done,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!("Unknown task filter: {}", other)),
        }
    }
}

/// Next identifier: the current millisecond timestamp, bumped past any
/// existing id so two tasks created within the same millisecond never clash.
pub fn next_task_id(now_millis: i64, existing: &[Task]) -> i64 {
    match existing.iter().map(|t| t.id).max() {
        Some(max) if max >= now_millis => max + 1,
        _ => now_millis,
    }
}

/// Open tasks first, completed ones after; insertion order otherwise kept.
pub fn sorted_for_display(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| t.done);
    sorted
}
