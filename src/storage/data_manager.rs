use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use serde_json::Value;

use super::{to_pretty_json, StoreError};
use crate::models::{
    next_task_id, DashboardDocument, Priority, Task, TaskFilter, WeatherLocation,
};

/// Whole-file JSON store for tasks, notes and profile data.
///
/// The document lives in memory behind one mutex. Every mutation holds the
/// lock across the change and the rewrite of the file, so callers block on
/// disk I/O. Writes overwrite the file in place.
pub struct DataManager {
    path: PathBuf,
    data: Mutex<DashboardDocument>,
}

impl DataManager {
    /// Loads (or creates) the document at `path` and records a new session.
    pub fn open(path: impl Into<PathBuf>, defaults: DashboardDocument) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let manager = Self {
            path,
            data: Mutex::new(defaults),
        };
        manager.load()?;
        manager.update_session()?;
        Ok(manager)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, DashboardDocument>, StoreError> {
        self.data.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Merges the file into memory. A missing file is created from the
    /// current state; an unparsable one is copied aside and ignored.
    pub fn load(&self) -> Result<(), StoreError> {
        let mut doc = self.lock()?;

        if !self.path.exists() {
            log::info!("[DataManager] Creating {}", self.path.display());
            return self.write_locked(&mut doc);
        }

        let raw = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        match serde_json::from_slice::<Value>(&raw) {
            Ok(value) => {
                let rejected = doc.merge_from(value);
                if !rejected.is_empty() {
                    log::warn!(
                        "[DataManager] Ignored invalid fields in {}: {}",
                        self.path.display(),
                        rejected.join(", ")
                    );
                }
            }
            Err(e) => {
                log::error!("[DataManager] Error loading data: {}", e);
                self.quarantine_corrupt_file();
            }
        }
        Ok(())
    }

    /// Writes the full document to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut doc = self.lock()?;
        self.write_locked(&mut doc)
    }

    fn write_locked(&self, doc: &mut DashboardDocument) -> Result<(), StoreError> {
        doc.last_saved = Some(iso_now());
        let bytes = to_pretty_json(&*doc)?;
        fs::write(&self.path, bytes).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Applies `f` under the lock and saves when it reports a change.
    fn update<R>(
        &self,
        f: impl FnOnce(&mut DashboardDocument) -> (R, bool),
    ) -> Result<R, StoreError> {
        let mut doc = self.lock()?;
        let (result, changed) = f(&mut doc);
        if changed {
            self.write_locked(&mut doc)?;
        }
        Ok(result)
    }

    fn read<R>(&self, f: impl FnOnce(&DashboardDocument) -> R) -> Result<R, StoreError> {
        let doc = self.lock()?;
        Ok(f(&doc))
    }

    fn quarantine_corrupt_file(&self) {
        let mut backup: OsString = self.path.as_os_str().to_owned();
        backup.push(".corrupt");
        let backup = PathBuf::from(backup);
        match fs::copy(&self.path, &backup) {
            Ok(_) => log::warn!("[DataManager] Kept unreadable data at {}", backup.display()),
            Err(e) => log::error!("[DataManager] Could not back up unreadable data: {}", e),
        }
    }

    fn update_session(&self) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.last_active = Some(iso_now());
            doc.session_count += 1;
            ((), true)
        })
    }

    pub fn snapshot(&self) -> Result<DashboardDocument, StoreError> {
        self.read(|doc| doc.clone())
    }

    // --- Tasks ---

    pub fn add_task(&self, text: &str, priority: Priority) -> Result<Task, StoreError> {
        self.update(|doc| {
            let now = Local::now();
            let id = next_task_id(now.timestamp_millis(), &doc.tasks);
            let task = Task::new(id, text.to_string(), priority, now);
            doc.tasks.push(task.clone());
            (task, true)
        })
    }

    /// Returns `false` when no task has `task_id`; the file is left untouched.
    pub fn delete_task(&self, task_id: i64) -> Result<bool, StoreError> {
        self.update(|doc| {
            let before = doc.tasks.len();
            doc.tasks.retain(|t| t.id != task_id);
            let removed = doc.tasks.len() < before;
            (removed, removed)
        })
    }

    pub fn toggle_task(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        self.update(|doc| match doc.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.toggle(Local::now());
                (Some(task.clone()), true)
            }
            None => (None, false),
        })
    }

    pub fn get_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        self.read(|doc| {
            doc.tasks
                .iter()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect()
        })
    }

    /// Drops every completed task and returns how many went.
    pub fn clear_completed_tasks(&self) -> Result<usize, StoreError> {
        self.update(|doc| {
            let before = doc.tasks.len();
            doc.tasks.retain(|t| !t.done);
            (before - doc.tasks.len(), true)
        })
    }

    // --- Notes ---

    /// Saves only when the text differs from what is stored.
    pub fn set_notes(&self, text: &str) -> Result<bool, StoreError> {
        self.update(|doc| {
            if doc.notes == text {
                (false, false)
            } else {
                doc.notes = text.to_string();
                (true, true)
            }
        })
    }

    pub fn get_notes(&self) -> Result<String, StoreError> {
        self.read(|doc| doc.notes.clone())
    }

    // --- Profile ---

    pub fn get_username(&self) -> Result<String, StoreError> {
        self.read(|doc| doc.username.clone())
    }

    pub fn set_username(&self, name: &str) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.username = name.to_string();
            ((), true)
        })
    }

    pub fn get_theme(&self) -> Result<String, StoreError> {
        self.read(|doc| doc.theme.clone())
    }

    pub fn set_theme(&self, theme: &str) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.theme = theme.to_string();
            ((), true)
        })
    }

    pub fn get_weather_location(&self) -> Result<WeatherLocation, StoreError> {
        self.read(|doc| doc.weather_location)
    }

    pub fn set_weather_location(&self, lat: f64, lon: f64) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.weather_location = WeatherLocation { lat, lon };
            ((), true)
        })
    }
}

fn iso_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn open_in(dir: &Path) -> DataManager {
        DataManager::open(dir.join("data.json"), DashboardDocument::default()).unwrap()
    }

    #[test]
    fn open_creates_file_and_counts_sessions() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        assert!(db.path().exists());
        let first = db.snapshot().unwrap();
        assert_eq!(first.session_count, 1);
        assert!(first.last_active.is_some());
        assert!(first.last_saved.is_some());
        drop(db);

        let db = open_in(dir.path());
        assert_eq!(db.snapshot().unwrap().session_count, 2);
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("data.json");
        let db = DataManager::open(&path, DashboardDocument::default()).unwrap();
        assert!(path.exists());
        assert_eq!(db.get_username().unwrap(), "Commander");
    }

    #[test]
    fn added_tasks_are_open_with_unique_ids() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());

        let a = db.add_task("buy milk", Priority::Normal).unwrap();
        let b = db.add_task("call mum", Priority::High).unwrap();
        let c = db.add_task("file taxes", Priority::Low).unwrap();

        assert!(!a.done && !b.done && !c.done);
        assert!(a.completed_at.is_none());
        assert!(a.id < b.id && b.id < c.id);
        assert_eq!(db.get_tasks(TaskFilter::All).unwrap().len(), 3);
    }

    #[test]
    fn toggle_flips_completion_and_persists() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        let task = db.add_task("stretch", Priority::Normal).unwrap();

        let toggled = db.toggle_task(task.id).unwrap().unwrap();
        assert!(toggled.done);
        assert!(toggled.completed_at.is_some());

        drop(db);
        let db = open_in(dir.path());
        let stored = db.get_tasks(TaskFilter::Completed).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, task.id);

        let back = db.toggle_task(task.id).unwrap().unwrap();
        assert!(!back.done);
        assert!(back.completed_at.is_none());
        assert!(db.get_tasks(TaskFilter::Completed).unwrap().is_empty());
        assert_eq!(db.get_tasks(TaskFilter::Active).unwrap().len(), 1);
    }

    #[test]
    fn toggling_unknown_task_returns_none() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        assert!(db.toggle_task(404).unwrap().is_none());
    }

    #[test]
    fn deleting_missing_task_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        db.add_task("keep me", Priority::Normal).unwrap();
        let before = fs::read(db.path()).unwrap();

        assert!(!db.delete_task(12345).unwrap());
        assert_eq!(fs::read(db.path()).unwrap(), before);
        assert_eq!(db.get_tasks(TaskFilter::All).unwrap().len(), 1);
    }

    #[test]
    fn deleting_existing_task_removes_it() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        let task = db.add_task("temporary", Priority::Normal).unwrap();
        assert!(db.delete_task(task.id).unwrap());
        drop(db);
        assert!(open_in(dir.path()).get_tasks(TaskFilter::All).unwrap().is_empty());
    }

    #[test]
    fn clear_completed_keeps_open_tasks() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        let a = db.add_task("a", Priority::Normal).unwrap();
        let b = db.add_task("b", Priority::Normal).unwrap();
        db.add_task("c", Priority::Normal).unwrap();
        db.toggle_task(a.id).unwrap();
        db.toggle_task(b.id).unwrap();

        assert_eq!(db.clear_completed_tasks().unwrap(), 2);
        let left = db.get_tasks(TaskFilter::All).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].text, "c");
        assert_eq!(db.clear_completed_tasks().unwrap(), 0);
    }

    #[test]
    fn unchanged_notes_are_not_rewritten() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        assert!(db.set_notes("remember the milk").unwrap());
        let before = fs::read(db.path()).unwrap();

        assert!(!db.set_notes("remember the milk").unwrap());
        assert_eq!(fs::read(db.path()).unwrap(), before);
        assert_eq!(db.get_notes().unwrap(), "remember the milk");
    }

    #[test]
    fn save_and_reload_round_trips_all_fields() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        let task = db.add_task("review PR", Priority::High).unwrap();
        db.toggle_task(task.id).unwrap();
        db.add_task("plan sprint", Priority::Low).unwrap();
        db.set_notes("line one\nline two").unwrap();
        db.set_username("Ada").unwrap();
        db.set_theme("light").unwrap();
        db.set_weather_location(51.5072, -0.1276).unwrap();
        let saved = db.snapshot().unwrap();
        drop(db);

        let reopened = open_in(dir.path()).snapshot().unwrap();
        assert_eq!(reopened.tasks, saved.tasks);
        assert_eq!(reopened.notes, saved.notes);
        assert_eq!(reopened.username, "Ada");
        assert_eq!(reopened.theme, "light");
        assert_eq!(reopened.weather_location, WeatherLocation { lat: 51.5072, lon: -0.1276 });
        assert_eq!(reopened.session_count, saved.session_count + 1);
    }

    #[test]
    fn absent_keys_take_defaults_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{ "username": "Grace", "session_count": 9 }"#).unwrap();

        let db = DataManager::open(&path, DashboardDocument::default()).unwrap();
        let doc = db.snapshot().unwrap();
        assert_eq!(doc.username, "Grace");
        assert_eq!(doc.session_count, 10);
        assert_eq!(doc.theme, "dark");
        assert!(doc.tasks.is_empty());
        assert_eq!(doc.weather_location, WeatherLocation::default());
    }

    #[test]
    fn corrupt_file_is_backed_up_and_replaced_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ this is not json").unwrap();

        let db = DataManager::open(&path, DashboardDocument::default()).unwrap();
        assert_eq!(db.get_username().unwrap(), "Commander");

        let backup = dir.path().join("data.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ this is not json");
        let rewritten: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(rewritten["session_count"], 1);
    }

    #[test]
    fn file_uses_four_space_indent_and_raw_unicode() {
        let dir = tempdir().unwrap();
        let db = open_in(dir.path());
        db.set_notes("café ☕").unwrap();

        let text = fs::read_to_string(db.path()).unwrap();
        assert!(text.contains("\n    \"tasks\": []"));
        assert!(text.contains("café ☕"));
    }

    #[test]
    fn concurrent_adds_keep_ids_unique() {
        let dir = tempdir().unwrap();
        let db = Arc::new(open_in(dir.path()));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    for n in 0..10 {
                        db.add_task(&format!("w{}-{}", worker, n), Priority::Normal).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<i64> = db.get_tasks(TaskFilter::All).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 40);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 40);
    }
}
