// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process Showcase - animated process diagram host
//!
//! Runs the process step sequencer against a logging presentation sink:
//! - Interactive mode, real time, controlled with start/pause/reset on stdin
//! - Simulation mode, the whole sequence in virtual time
//!
//! ## Architecture
//!
//! The sequencer crate owns the step logic and timer queue; this binary
//! only supplies a clock, the control channel and a sink that logs.

mod app;
mod command;
mod driver;
mod logging_sink;

use app::Cli;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("process_showcase_app=info,process_showcase_sequencer=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting Process Showcase v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = app::run(cli) {
        tracing::error!("Process showcase failed: {e}");
        std::process::exit(1);
    }
}
