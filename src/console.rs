use std::io::BufRead;

use chrono::Local;
use tokio::sync::mpsc;

use crate::commands::{app_control, calendar, dashboard, media, notes, settings, tasks};
use crate::models::{format_time, MonthView, Priority, Task, TaskFilter, TrackInfo};
use crate::state::AppState;

const HELP: &str = "\
Commands:
  status                      dashboard overview
  tasks [all|active|completed]
  add [!low|!high] <text>     new task
  done <id>                   toggle a task
  rm <id>                     delete a task
  clear                       remove completed tasks
  notes | notes set <text>
  name <username>
  theme <name>
  location <lat> <lon>
  weather | stats | track
  play | next | prev          music control
  calendar [next|prev|today]
  links | link <name>
  search <query>
  settings
  help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMove {
    Show,
    Next,
    Prev,
    Today,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Status,
    Tasks(TaskFilter),
    Add { text: String, priority: Priority },
    Done(i64),
    Remove(i64),
    Clear,
    Notes,
    SetNotes(String),
    Name(String),
    Theme(String),
    Location { lat: String, lon: String },
    Weather,
    Stats,
    Track,
    Play,
    Next,
    Prev,
    Calendar(CalendarMove),
    Links,
    Link(String),
    Search(String),
    Settings,
    Quit,
}

fn task_id(rest: &str) -> Result<i64, String> {
    rest.trim()
        .parse()
        .map_err(|_| format!("Expected a task id, got '{}'", rest.trim()))
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest.to_string())
    }
}

/// Parses one console line.
pub fn parse(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "" => return Err("Empty command".to_string()),
        "help" | "?" => ConsoleCommand::Help,
        "status" => ConsoleCommand::Status,
        "tasks" => ConsoleCommand::Tasks(rest.parse()?),
        "add" => {
            let (priority, text) = match rest.split_once(char::is_whitespace) {
                Some((flag, text)) if flag.starts_with('!') => {
                    (flag[1..].parse::<Priority>()?, text.trim())
                }
                _ => (Priority::Normal, rest),
            };
            ConsoleCommand::Add {
                text: required(text, "add [!low|!high] <text>")?,
                priority,
            }
        }
        "done" => ConsoleCommand::Done(task_id(rest)?),
        "rm" => ConsoleCommand::Remove(task_id(rest)?),
        "clear" => ConsoleCommand::Clear,
        "notes" => match rest.split_once(char::is_whitespace) {
            Some(("set", text)) => ConsoleCommand::SetNotes(text.trim().to_string()),
            None if rest == "set" => ConsoleCommand::SetNotes(String::new()),
            None if rest.is_empty() => ConsoleCommand::Notes,
            _ => return Err("Usage: notes | notes set <text>".to_string()),
        },
        "name" => ConsoleCommand::Name(required(rest, "name <username>")?),
        "theme" => ConsoleCommand::Theme(required(rest, "theme <name>")?),
        "location" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(lat), Some(lon), None) => ConsoleCommand::Location {
                    lat: lat.to_string(),
                    lon: lon.to_string(),
                },
                _ => return Err("Usage: location <lat> <lon>".to_string()),
            }
        }
        "weather" => ConsoleCommand::Weather,
        "stats" => ConsoleCommand::Stats,
        "track" => ConsoleCommand::Track,
        "play" | "pause" => ConsoleCommand::Play,
        "next" => ConsoleCommand::Next,
        "prev" => ConsoleCommand::Prev,
        "calendar" | "cal" => ConsoleCommand::Calendar(match rest.to_lowercase().as_str() {
            "" => CalendarMove::Show,
            "next" => CalendarMove::Next,
            "prev" => CalendarMove::Prev,
            "today" => CalendarMove::Today,
            other => return Err(format!("Unknown calendar move: {}", other)),
        }),
        "links" => ConsoleCommand::Links,
        "link" => ConsoleCommand::Link(required(rest, "link <name>")?),
        "search" => ConsoleCommand::Search(required(rest, "search <query>")?),
        "settings" => ConsoleCommand::Settings,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(command)
}

fn task_line(task: &Task) -> String {
    let mark = if task.done { "x" } else { " " };
    let priority = match task.priority {
        Priority::Normal => String::new(),
        other => format!(" !{}", other),
    };
    format!("[{}] {}{} {}", mark, task.id, priority, task.text)
}

fn track_line(track: &TrackInfo) -> String {
    let state = if track.playing { "playing" } else { "paused" };
    format!(
        "{} - {} ({}) [{} / {}, {:.0}%] {}",
        track.title,
        track.artist,
        track.album,
        format_time(track.position),
        format_time(track.duration),
        track.progress() * 100.0,
        state
    )
}

fn month_text(view: MonthView) -> String {
    view.render(Local::now().date_naive())
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

/// Runs one command and returns the text to print.
pub async fn execute(state: &AppState, command: ConsoleCommand) -> Result<String, String> {
    let output = match command {
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Status => {
            let o = dashboard::get_dashboard_overview(state).await?;
            format!(
                "{} | {} | {}\nWelcome back, {} (session {})\nWeather: {} | Wind {} | Humidity {}\n\
                 CPU {:.0}% | RAM {:.0}% | SSD {:.0}%\nNow playing: {}\nTasks: {} active, {} done",
                o.app_name,
                o.clock.time,
                o.clock.date,
                o.username,
                o.session_count,
                o.weather.headline(),
                o.weather.wind_speed,
                o.weather.humidity,
                o.system.cpu_percent,
                o.system.ram_percent,
                o.system.disk_percent,
                track_line(&o.track),
                o.active_tasks,
                o.completed_tasks
            )
        }
        ConsoleCommand::Tasks(filter) => {
            let list = tasks::get_tasks(state, filter).await?;
            if list.is_empty() {
                "No tasks".to_string()
            } else {
                list.iter().map(task_line).collect::<Vec<_>>().join("\n")
            }
        }
        ConsoleCommand::Add { text, priority } => {
            task_line(&tasks::add_task(state, text, priority).await?)
        }
        ConsoleCommand::Done(id) => task_line(&tasks::toggle_task(state, id).await?),
        ConsoleCommand::Remove(id) => {
            tasks::delete_task(state, id).await?;
            format!("Deleted {}", id)
        }
        ConsoleCommand::Clear => format!("Cleared {} completed", tasks::clear_completed(state).await?),
        ConsoleCommand::Notes => notes::get_notes(state).await?,
        ConsoleCommand::SetNotes(text) => {
            if notes::save_notes(state, text).await? {
                "Notes saved".to_string()
            } else {
                "Notes unchanged".to_string()
            }
        }
        ConsoleCommand::Name(name) => {
            format!("Welcome back, {}", settings::update_profile(state, name).await?)
        }
        ConsoleCommand::Theme(theme) => format!("Theme: {}", settings::set_theme(state, theme).await?),
        ConsoleCommand::Location { lat, lon } => {
            settings::update_weather_location(state, lat, lon).await?;
            "Location updated, refreshing weather".to_string()
        }
        ConsoleCommand::Weather => {
            let w = state.weather.current_weather();
            let loc = state.weather.location();
            format!(
                "{} | Wind {} | Humidity {} | ({}, {}) | updated {}",
                w.headline(),
                w.wind_speed,
                w.humidity,
                loc.lat,
                loc.lon,
                w.last_updated.as_deref().unwrap_or("never")
            )
        }
        ConsoleCommand::Stats => {
            let s = state.system.stats();
            let mut lines: Vec<String> = s
                .gauges()
                .iter()
                .map(|(label, frac)| format!("{:<4}{:>5.1}%", label, frac * 100.0))
                .collect();
            lines.push(format!("NET up {} B / down {} B", s.net_sent, s.net_recv));
            lines.join("\n")
        }
        ConsoleCommand::Track => track_line(&media::get_track(state).await?),
        ConsoleCommand::Play => track_line(&media::play_pause(state).await?),
        ConsoleCommand::Next => track_line(&media::next_track(state).await?),
        ConsoleCommand::Prev => track_line(&media::prev_track(state).await?),
        ConsoleCommand::Calendar(step) => {
            let view = match step {
                CalendarMove::Show => calendar::get_calendar(state).await?,
                CalendarMove::Next => calendar::next_month(state).await?,
                CalendarMove::Prev => calendar::prev_month(state).await?,
                CalendarMove::Today => calendar::current_month(state).await?,
            };
            month_text(view)
        }
        ConsoleCommand::Links => app_control::get_quick_links()
            .await?
            .iter()
            .map(|l| format!("{:<8} {}", l.name, l.url))
            .collect::<Vec<_>>()
            .join("\n"),
        ConsoleCommand::Link(name) => {
            format!("Opened {}", app_control::open_quick_link(name).await?.name)
        }
        ConsoleCommand::Search(query) => format!("Opened {}", app_control::web_search(query).await?),
        ConsoleCommand::Settings => pretty(&settings::get_settings(state).await?)?,
        ConsoleCommand::Quit => String::new(),
    };
    Ok(output)
}

/// Forwards stdin lines from a plain thread. A read blocked there cannot
/// hold up runtime shutdown the way a `tokio::io::stdin` read does.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("[Console] stdin closed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Runs commands from `input` until `quit` or the sender goes away.
pub async fn run(state: &AppState, mut input: mpsc::Receiver<String>) {
    println!("Type 'help' for commands.");

    while let Some(line) = input.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        match execute(state, command).await {
            Ok(output) => println!("{}", output),
            Err(e) => println!("Error: {}", e),
        }
    }
}
