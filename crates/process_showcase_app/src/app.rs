// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application setup: options, configuration and run modes.

use crate::driver;
use crate::logging_sink::LoggingSink;
use clap::Parser;
use process_showcase_sequencer::{
    total_duration_ms, ConfigError, PageModel, ProcessConfig, Sequencer, SequencerError,
    DEFAULT_STEP_LIMIT,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

/// Application errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Process configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Simulation did not settle
    #[error("Sequencer error: {0}")]
    Sequencer(#[from] SequencerError),

    /// IO error (runtime or input thread startup)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Animates the process diagram and logs every change.
///
/// Interactive commands on stdin: start, pause, reset, status, quit.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "process_showcase", version)]
pub struct Cli {
    /// Run the whole sequence in virtual time and exit
    #[arg(long)]
    pub simulate: bool,

    /// Process file (.ron or .json); the built-in biodiesel process when omitted
    pub config: Option<PathBuf>,
}

/// Load and validate the process, logging timing warnings
pub fn load_config(path: Option<&Path>) -> Result<ProcessConfig> {
    let config = match path {
        Some(path) => ProcessConfig::load(path)?,
        None => ProcessConfig::default(),
    };

    for warning in config.validate()? {
        tracing::warn!("Timing: {warning}");
    }

    tracing::info!(
        "Process has {} steps, {}ms end to end",
        config.steps.len(),
        total_duration_ms(&config.steps)
    );
    Ok(config)
}

fn build_sequencer(config: ProcessConfig) -> Sequencer<LoggingSink> {
    // Readouts already go to the log; the page keeps only the current one
    let sink = LoggingSink::new(PageModel::for_steps(&config.steps).without_history());
    Sequencer::from_config(config, sink)
}

/// Run the application
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut sequencer = build_sequencer(config);

    if cli.simulate {
        sequencer.start();
        let fired = sequencer.run_until_idle(DEFAULT_STEP_LIMIT)?;
        tracing::info!("Simulation fired {} timers over {}ms", fired, sequencer.now_ms());
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        driver::spawn_stdin_reader(sender)?;
        tracing::info!("Ready. Commands: start, pause, reset, status, quit");

        let sequencer = runtime.block_on(driver::run_realtime(sequencer, receiver));
        tracing::info!(
            "Stopped ({}): {}",
            sequencer.playback().status_text(),
            sequencer.sink().page().readout()
        );
    }

    Ok(())
}
