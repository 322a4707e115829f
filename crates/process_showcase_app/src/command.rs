// SPDX-License-Identifier: MIT OR Apache-2.0
//! Control commands typed on stdin.

use std::str::FromStr;

/// User control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin or resume the animation
    Start,
    /// Suspend the animation
    Pause,
    /// Abort and restore the initial state
    Reset,
    /// Print the current state
    Status,
    /// Leave the program
    Quit,
}

/// Unrecognised command text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown command: {0} (expected start, pause, reset, status or quit)")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "play" | "s" => Ok(Self::Start),
            "pause" | "p" => Ok(Self::Pause),
            "reset" | "r" => Ok(Self::Reset),
            "status" | "?" => Ok(Self::Status),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}
