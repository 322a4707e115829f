// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process steps and the visual elements they drive.

use crate::timing::Timing;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Secondary visual effect applied to a diagram element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Effect {
    /// Agitation inside the ultrasonic mixer
    Mixing,
    /// Glow on the heating vessel
    HeatingActive,
    /// Drain animation on a separation funnel
    Draining,
    /// Rinse animation on the washing tank
    WashingActive,
    /// Product container filling up, applied after a delay
    Fill,
    /// Connector path being drawn
    PathDraw,
    /// Liquid flowing along a connector
    FlowFill,
}

impl Effect {
    /// CSS class name used to render this effect
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Mixing => "mixing",
            Self::HeatingActive => "heating-active",
            Self::Draining => "draining",
            Self::WashingActive => "washing-active",
            Self::Fill => "fill",
            Self::PathDraw => "animate",
            Self::FlowFill => "flow",
        }
    }

    /// Whether the effect applies some time after activation rather than with it
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Fill)
    }

    /// Whether the effect belongs to connectors rather than targets
    pub fn is_connector_effect(&self) -> bool {
        matches!(self, Self::PathDraw | Self::FlowFill)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// A visual target activated by a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTarget {
    /// Element identifier in the page
    pub id: String,
    /// Optional special effect applied on activation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
}

impl StepTarget {
    /// Target without any special effect
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            effect: None,
        }
    }

    /// Target with a special effect
    pub fn with_effect(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            effect: Some(effect),
        }
    }
}

/// One labeled phase of the animated process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Short label
    pub name: String,
    /// Text shown while the step runs
    pub description: String,
    /// Targets activated in order, staggered
    #[serde(default)]
    pub targets: Vec<StepTarget>,
    /// Connectors activated after all targets, staggered
    #[serde(default)]
    pub connectors: Vec<String>,
    /// Time the step occupies before the next one starts, in milliseconds
    pub duration_ms: u64,
}

impl Step {
    /// Create a step with no targets or connectors
    pub fn new(name: impl Into<String>, description: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            targets: Vec::new(),
            connectors: Vec::new(),
            duration_ms,
        }
    }

    /// Add a target
    pub fn target(mut self, target: StepTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Add a connector
    pub fn connector(mut self, id: impl Into<String>) -> Self {
        self.connectors.push(id.into());
        self
    }

    /// Progress text for this step at `index` (0-based) in the process
    pub fn readout(&self, index: usize) -> String {
        format!("Step {}: {} — {}", index + 1, self.name, self.description)
    }

    /// Latest offset from step start at which any of its timers fires.
    ///
    /// A step whose duration is shorter than this lets its own effects land
    /// after the following step has started.
    pub fn settle_ms(&self, timing: &Timing) -> u64 {
        let targets = self
            .targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                let offset = timing.target_offset(index);
                match target.effect {
                    Some(effect) if effect.is_deferred() => offset + timing.fill_delay_ms,
                    _ => offset,
                }
            })
            .max()
            .unwrap_or(0);

        let connectors = (0..self.connectors.len())
            .map(|index| {
                timing.connector_offset(self.targets.len(), index) + timing.flow_fill_delay_ms
            })
            .max()
            .unwrap_or(0);

        targets.max(connectors)
    }

    /// All element ids touched by this step, targets first
    pub fn element_ids(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .map(|t| t.id.as_str())
            .chain(self.connectors.iter().map(String::as_str))
    }
}
