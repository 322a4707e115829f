// SPDX-License-Identifier: MIT OR Apache-2.0
//! Presentation sink: the page surface the sequencer writes to.

use crate::step::{Effect, Step};
use indexmap::{IndexMap, IndexSet};

/// Error reported by a presentation sink
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The referenced element does not exist in the page
    #[error("Element not found: {0}")]
    TargetNotFound(String),
}

/// Playback control buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Play/resume button
    Start,
    /// Pause button
    Pause,
}

impl Control {
    /// Element identifier of the button
    pub fn element_id(&self) -> &'static str {
        match self {
            Self::Start => "playBtn",
            Self::Pause => "pauseBtn",
        }
    }
}

/// Surface the sequencer mutates to reflect its state.
///
/// Element-addressed operations are idempotent. A missing element is
/// reported as [`SinkError::TargetNotFound`] and must leave the sink unchanged.
pub trait PresentationSink {
    /// Mark an element active
    fn set_active(&mut self, id: &str) -> Result<(), SinkError>;

    /// Revert an element to its inactive representation, dropping any effects
    fn clear_active(&mut self, id: &str) -> Result<(), SinkError>;

    /// Apply a secondary visual effect to an element
    fn set_effect(&mut self, id: &str, effect: Effect) -> Result<(), SinkError>;

    /// Replace the progress/description text
    fn set_readout(&mut self, text: &str);

    /// Show a control button
    fn reveal_control(&mut self, control: Control);

    /// Hide a control button
    fn hide_control(&mut self, control: Control);
}

/// Visual state of one diagram element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    /// Whether the element is active
    pub active: bool,
    /// Effects applied, in application order
    pub effects: IndexSet<Effect>,
}

impl ElementState {
    /// Whether the element shows nothing beyond its resting state
    pub fn is_inactive(&self) -> bool {
        !self.active && self.effects.is_empty()
    }
}

/// In-memory page holding a fixed registry of elements
#[derive(Debug, Clone)]
pub struct PageModel {
    elements: IndexMap<String, ElementState>,
    readout: String,
    readout_history: Vec<String>,
    record_history: bool,
    start_visible: bool,
    pause_visible: bool,
}

impl PageModel {
    /// Create a page with the given element ids, all inactive
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: ids
                .into_iter()
                .map(|id| (id.into(), ElementState::default()))
                .collect(),
            readout: String::new(),
            readout_history: Vec::new(),
            record_history: true,
            start_visible: true,
            pause_visible: false,
        }
    }

    /// Stop recording readouts; only the current one is kept
    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self.readout_history = Vec::new();
        self
    }

    /// Create a page containing every element referenced by `steps`
    pub fn for_steps(steps: &[Step]) -> Self {
        Self::new(steps.iter().flat_map(Step::element_ids))
    }

    /// Look up an element
    pub fn element(&self, id: &str) -> Option<&ElementState> {
        self.elements.get(id)
    }

    /// Iterate elements in registration order
    pub fn elements(&self) -> impl Iterator<Item = (&str, &ElementState)> {
        self.elements.iter().map(|(id, state)| (id.as_str(), state))
    }

    /// Whether an element is active; false for unknown ids
    pub fn is_active(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.active)
    }

    /// Whether an element carries `effect`; false for unknown ids
    pub fn has_effect(&self, id: &str, effect: Effect) -> bool {
        self.elements.get(id).is_some_and(|e| e.effects.contains(&effect))
    }

    /// Whether every element is in its resting state
    pub fn all_inactive(&self) -> bool {
        self.elements.values().all(ElementState::is_inactive)
    }

    /// Ids of active elements in registration order
    pub fn active_ids(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Current readout text
    pub fn readout(&self) -> &str {
        &self.readout
    }

    /// Every readout written so far, oldest first. Empty when history is off.
    pub fn readout_history(&self) -> &[String] {
        &self.readout_history
    }

    /// Whether a control is visible
    pub fn is_visible(&self, control: Control) -> bool {
        match control {
            Control::Start => self.start_visible,
            Control::Pause => self.pause_visible,
        }
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut ElementState, SinkError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| SinkError::TargetNotFound(id.to_string()))
    }

    fn control_mut(&mut self, control: Control) -> &mut bool {
        match control {
            Control::Start => &mut self.start_visible,
            Control::Pause => &mut self.pause_visible,
        }
    }
}

impl PresentationSink for PageModel {
    fn set_active(&mut self, id: &str) -> Result<(), SinkError> {
        self.element_mut(id)?.active = true;
        Ok(())
    }

    fn clear_active(&mut self, id: &str) -> Result<(), SinkError> {
        let element = self.element_mut(id)?;
        element.active = false;
        element.effects.clear();
        Ok(())
    }

    fn set_effect(&mut self, id: &str, effect: Effect) -> Result<(), SinkError> {
        self.element_mut(id)?.effects.insert(effect);
        Ok(())
    }

    fn set_readout(&mut self, text: &str) {
        self.readout = text.to_string();
        if self.record_history {
            self.readout_history.push(self.readout.clone());
        }
    }

    fn reveal_control(&mut self, control: Control) {
        *self.control_mut(control) = true;
    }

    fn hide_control(&mut self, control: Control) {
        *self.control_mut(control) = false;
    }
}
