// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drives a sequencer against the wall clock.
//!
//! The driver task owns the sequencer outright. Commands arrive over a
//! channel and are applied between timer wake-ups, so every mutation runs
//! on one logical thread of control.

use crate::command::Command;
use process_showcase_sequencer::{PresentationSink, Sequencer};
use std::io::BufRead;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Apply one control command
pub fn apply<S: PresentationSink>(sequencer: &mut Sequencer<S>, command: Command) {
    match command {
        Command::Start => sequencer.start(),
        Command::Pause => sequencer.pause(),
        Command::Reset => sequencer.reset(),
        Command::Status => {
            let state = sequencer.state();
            tracing::info!(
                "{} at step {}/{}, {} timers pending",
                state.playback.status_text(),
                state.current_step + 1,
                sequencer.steps().len(),
                sequencer.pending_timers()
            );
        }
        Command::Quit => {}
    }
}

/// Spawn a thread forwarding stdin lines as commands.
///
/// The channel closes when stdin reaches end of input.
pub fn spawn_stdin_reader(sender: mpsc::UnboundedSender<Command>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if sender.send(command).is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!("{err}"),
                }
            }
        })?;
    Ok(())
}

/// Run until `Quit`, or until input has closed and no timers remain.
///
/// Returns the sequencer so callers can inspect its final state.
pub async fn run_realtime<S: PresentationSink>(
    mut sequencer: Sequencer<S>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> Sequencer<S> {
    let origin = Instant::now();
    let mut input_open = true;

    loop {
        let deadline = sequencer
            .next_deadline()
            .map(|ms| origin + Duration::from_millis(ms));

        if !input_open && deadline.is_none() {
            break;
        }

        tokio::select! {
            command = commands.recv(), if input_open => {
                sequencer.advance_to(elapsed_ms(origin));
                match command {
                    Some(Command::Quit) => break,
                    Some(command) => apply(&mut sequencer, command),
                    None => {
                        tracing::debug!("Command input closed");
                        input_open = false;
                    }
                }
            }
            _ = wait_for(deadline) => {
                sequencer.advance_to(elapsed_ms(origin));
            }
        }
    }

    sequencer
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn elapsed_ms(origin: Instant) -> u64 {
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
}
