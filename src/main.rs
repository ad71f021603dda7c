mod commands;
mod console;
mod models;
mod services;
mod state;
mod storage;
mod utils;

use std::sync::Mutex;

use anyhow::Result;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    utils::config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = utils::config::data_dir();
    let settings = utils::config::read_settings(&data_dir);
    let app = AppState::initialize(&data_dir, settings)?;
    log::info!(
        "[App] {} started, data in {}",
        app.settings().general.app_name,
        app.data.path().display()
    );

    register_listeners(&app);
    app.start_services();

    tokio::select! {
        _ = console::run(&app, console::spawn_stdin_reader()) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("[App] Ctrl-C handler failed: {}", e);
            }
        }
    }

    app.shutdown();
    log::info!("[App] Goodbye");
    Ok(())
}

/// Log-only stand-ins for the dashboard widgets.
fn register_listeners(app: &AppState) {
    app.weather.add_callback(|weather| {
        log::info!(
            "[Weather] {} | wind {} | humidity {}",
            weather.headline(),
            weather.wind_speed,
            weather.humidity
        );
    });

    app.system.add_callback(|stats| {
        log::debug!(
            "[System] cpu {:.0}% ram {:.0}% ssd {:.0}%",
            stats.cpu_percent,
            stats.ram_percent,
            stats.disk_percent
        );
    });

    let last_title = Mutex::new(String::new());
    app.music.add_callback(move |track| {
        if let Ok(mut last) = last_title.lock() {
            if *last != track.title {
                log::info!("[Music] {} - {}", track.title, track.artist);
                *last = track.title.clone();
            }
        }
    });

    app.clock.add_callback(|reading| {
        log::debug!("[Clock] {} {}", reading.time, reading.date);
    });
}
