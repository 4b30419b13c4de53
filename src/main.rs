use headsync::config::{self, DEFAULT_CONFIG_PATH};
use headsync::sim;
use log::{error, info, LevelFilter};
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("headsync::game::judgment", LevelFilter::Warn) // One line per beat otherwise
        .filter_module("headsync::core::sensor", LevelFilter::Info)
        .filter_module("headsync::sim", LevelFilter::Debug)
        .init();

    info!("Headless session starting...");

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = config::load(&path);

    let report = match sim::run(&config) {
        Ok(report) => report,
        Err(e) => {
            error!("Session failed: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!("Session exited gracefully.");
    Ok(())
}
