// SPDX-License-Identifier: MIT OR Apache-2.0
//! Presentation sink that logs every change it renders.

use process_showcase_sequencer::{Control, Effect, PageModel, PresentationSink, SinkError};

/// Page model whose mutations are reported through `tracing`.
///
/// Readout and control changes log at `info`, element changes at `debug`.
pub struct LoggingSink {
    page: PageModel,
}

impl LoggingSink {
    /// Wrap a page model
    pub fn new(page: PageModel) -> Self {
        Self { page }
    }

    /// Underlying page state
    pub fn page(&self) -> &PageModel {
        &self.page
    }

    fn set_control(&mut self, control: Control, visible: bool) {
        if self.page.is_visible(control) != visible {
            tracing::info!(
                "{} {}",
                if visible { "Showing" } else { "Hiding" },
                control.element_id()
            );
        }
        if visible {
            self.page.reveal_control(control);
        } else {
            self.page.hide_control(control);
        }
    }
}

impl PresentationSink for LoggingSink {
    fn set_active(&mut self, id: &str) -> Result<(), SinkError> {
        self.page.set_active(id)?;
        tracing::debug!("{id} active");
        Ok(())
    }

    fn clear_active(&mut self, id: &str) -> Result<(), SinkError> {
        let was_lit = self.page.element(id).is_some_and(|e| !e.is_inactive());
        self.page.clear_active(id)?;
        if was_lit {
            tracing::debug!("{id} cleared");
        }
        Ok(())
    }

    fn set_effect(&mut self, id: &str, effect: Effect) -> Result<(), SinkError> {
        self.page.set_effect(id, effect)?;
        tracing::debug!("{id} +{effect}");
        Ok(())
    }

    fn set_readout(&mut self, text: &str) {
        tracing::info!("{text}");
        self.page.set_readout(text);
    }

    fn reveal_control(&mut self, control: Control) {
        self.set_control(control, true);
    }

    fn hide_control(&mut self, control: Control) {
        self.set_control(control, false);
    }
}
