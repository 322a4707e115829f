// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed delays used when laying out a step on the timeline.

use serde::{Deserialize, Serialize};

/// Delays between the timed activations inside a step, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Gap between consecutive target activations
    pub target_stagger_ms: u64,
    /// Extra gap between the last target slot and the first connector
    pub connector_lead_ms: u64,
    /// Gap between consecutive connector activations
    pub connector_stagger_ms: u64,
    /// Delay from connector activation to its flow-fill
    pub flow_fill_delay_ms: u64,
    /// Delay from target activation to a deferred effect
    pub fill_delay_ms: u64,
    /// Grace period after completion before the automatic reset
    pub auto_reset_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            target_stagger_ms: 300,
            connector_lead_ms: 500,
            connector_stagger_ms: 400,
            flow_fill_delay_ms: 800,
            fill_delay_ms: 600,
            auto_reset_delay_ms: 2500,
        }
    }
}

impl Timing {
    /// Offset of the `index`-th target from step start
    pub fn target_offset(&self, index: usize) -> u64 {
        index as u64 * self.target_stagger_ms
    }

    /// Offset of the `index`-th connector from step start, given the step's target count
    pub fn connector_offset(&self, target_count: usize, index: usize) -> u64 {
        target_count as u64 * self.target_stagger_ms
            + self.connector_lead_ms
            + index as u64 * self.connector_stagger_ms
    }
}
