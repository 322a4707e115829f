// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step sequencer for the process showcase diagram.
//!
//! This crate animates an industrial process diagram one step at a time:
//! - Targets (vessels, ingredients, products) activated in staggered order
//! - Connectors (pipes) drawn and filled after the step's targets
//! - A progress readout per step
//! - Start, pause and reset controls
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - A virtual-clock timer queue, driven by the host
//! - A presentation sink trait the sequencer writes visual state to
//! - A process configuration (steps plus timing table), RON or JSON

pub mod catalog;
pub mod config;
pub mod sequencer;
pub mod sink;
pub mod step;
pub mod timer;
pub mod timing;

pub use catalog::{biodiesel_process, total_duration_ms, COMPLETE_READOUT, READY_READOUT};
pub use config::{ConfigError, ProcessConfig, TimingWarning, CONFIG_FORMAT_VERSION};
pub use sequencer::{
    PlaybackState, Sequencer, SequencerError, SequencerState, SequencerTask, DEFAULT_STEP_LIMIT,
};
pub use sink::{Control, ElementState, PageModel, PresentationSink, SinkError};
pub use step::{Effect, Step, StepTarget};
pub use timer::{ScheduledTask, TimerId, TimerQueue};
pub use timing::Timing;
