pub mod app;
pub mod calendar;
pub mod config;
pub mod parser;
pub mod resolver;
pub mod response;
pub mod skill;

use anyhow::{Context, Result};
use log::*;
use std::path::PathBuf;

/// Load the configuration and either answer `question` or start the prompt
pub async fn run(config_path: Option<PathBuf>, question: Option<String>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };

    let app = app::Application::from_config(&config)?;
    info!("Initializing calendar skill ({:?} backend)", config.calendar.backend);

    match question {
        Some(question) => {
            println!("{}", app.ask(&question).await);
            Ok(())
        }
        None => app.run().await,
    }
}

pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

// Re-export commonly used types
pub use calendar::{AppointmentQueryEngine, CalendarBackend, EventRecord};
pub use config::Config;
pub use resolver::{DateRange, ReferenceInstant, TemporalResolver};
pub use response::Answer;
pub use skill::AppointmentSkill;
