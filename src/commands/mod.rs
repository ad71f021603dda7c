pub mod app_control;
pub mod calendar;
pub mod dashboard;
pub mod media;
pub mod notes;
pub mod settings;
pub mod tasks;
