// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process step sequencer.
//!
//! The sequencer walks the step list one step at a time. Each step is laid
//! out on the timer queue when it begins: staggered target activations,
//! then staggered connector activations, then the advance to the next step
//! at `duration_ms`. Pause and reset drop every pending timer at once, so
//! nothing scheduled before them can fire afterwards.
//!
//! Resuming after a pause restarts the interrupted step from its beginning.
//! Elements it had already activated stay active and are set again.

use crate::catalog::{COMPLETE_READOUT, READY_READOUT};
use crate::config::ProcessConfig;
use crate::sink::{Control, PresentationSink, SinkError};
use crate::step::{Effect, Step};
use crate::timer::{ScheduledTask, TimerQueue};
use crate::timing::Timing;

/// Default bound on timers fired by [`Sequencer::run_until_idle`]
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not started, finished, or reset
    #[default]
    Idle,
    /// Steps are advancing
    Running,
    /// Suspended by the user; visual state frozen
    Paused,
}

impl PlaybackState {
    /// Started and not yet finished or reset (running or paused)
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Suspended by the user
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Status string for display
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Paused => "Paused",
        }
    }
}

/// Mutable sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequencerState {
    /// Playback state
    pub playback: PlaybackState,
    /// Index of the step in progress (0-based)
    pub current_step: usize,
}

/// Work items on the sequencer's timer queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerTask {
    /// Activate a step's target and apply its immediate effect
    ActivateTarget {
        /// Step index
        step: usize,
        /// Target index within the step
        target: usize,
    },
    /// Apply a deferred effect to an already active element
    ApplyEffect {
        /// Element id
        id: String,
        /// Effect to apply
        effect: Effect,
    },
    /// Activate a step's connector and start drawing its path
    ActivateConnector {
        /// Step index
        step: usize,
        /// Connector index within the step
        connector: usize,
    },
    /// Start the liquid flow along a connector
    FlowFill {
        /// Connector id
        id: String,
    },
    /// Move on to the next step
    AdvanceStep,
    /// Reset after the completion grace period
    AutoReset,
}

/// Sequencer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    /// Timers kept firing past the configured limit
    #[error("Timer step limit of {limit} exceeded at {now_ms}ms")]
    StepLimitExceeded {
        /// Configured limit
        limit: usize,
        /// Virtual time when the limit was hit
        now_ms: u64,
    },
}

/// Timed step sequencer driving a presentation sink
pub struct Sequencer<S> {
    steps: Vec<Step>,
    timing: Timing,
    state: SequencerState,
    timers: TimerQueue<SequencerTask>,
    sink: S,
}

impl<S: PresentationSink> Sequencer<S> {
    /// Create an idle sequencer. The sink is not touched until the first control call.
    pub fn new(steps: Vec<Step>, timing: Timing, sink: S) -> Self {
        Self {
            steps,
            timing,
            state: SequencerState::default(),
            timers: TimerQueue::new(),
            sink,
        }
    }

    /// Create an idle sequencer from a process configuration
    pub fn from_config(config: ProcessConfig, sink: S) -> Self {
        Self::new(config.steps, config.timing, sink)
    }

    /// Begin the animation, or resume it after a pause.
    ///
    /// Does nothing while already running.
    pub fn start(&mut self) {
        match self.state.playback {
            PlaybackState::Running => {
                tracing::debug!("Start ignored: already running");
                return;
            }
            PlaybackState::Idle => {
                // A finished run may still have its auto-reset pending
                self.timers.cancel_all();
                self.clear_visuals();
                self.state.current_step = 0;
                tracing::info!("Sequencer started");
            }
            PlaybackState::Paused => {
                tracing::info!("Sequencer resumed at step {}", self.state.current_step + 1);
            }
        }

        self.state.playback = PlaybackState::Running;
        self.sink.hide_control(Control::Start);
        self.sink.reveal_control(Control::Pause);
        self.run_step();
    }

    /// Suspend the animation, keeping the current visual state.
    ///
    /// Does nothing unless running.
    pub fn pause(&mut self) {
        if self.state.playback != PlaybackState::Running {
            tracing::debug!("Pause ignored: {}", self.state.playback.status_text());
            return;
        }

        let cancelled = self.timers.cancel_all();
        self.state.playback = PlaybackState::Paused;
        self.sink.reveal_control(Control::Start);
        self.sink.hide_control(Control::Pause);
        tracing::info!(
            "Sequencer paused at step {} ({} timers cancelled)",
            self.state.current_step + 1,
            cancelled
        );
    }

    /// Abort the animation and restore the initial visual state
    pub fn reset(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.state = SequencerState::default();

        self.sink.reveal_control(Control::Start);
        self.sink.hide_control(Control::Pause);
        self.sink.set_readout(READY_READOUT);
        self.clear_visuals();
        tracing::info!("Sequencer reset ({} timers cancelled)", cancelled);
    }

    /// Fire every timer due within the next `delta_ms`
    pub fn advance_by(&mut self, delta_ms: u64) {
        let target = self.timers.now_ms().saturating_add(delta_ms);
        self.advance_to(target);
    }

    /// Fire every timer due at or before `target_ms`, then move the clock there
    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(task) = self.timers.pop_due(target_ms) {
            self.fire(task);
        }
        self.timers.advance_to(target_ms);
    }

    /// Fire timers until none are pending.
    ///
    /// Returns the number fired, or an error once `limit` timers have fired
    /// with work still pending.
    pub fn run_until_idle(&mut self, limit: usize) -> Result<usize, SequencerError> {
        let mut fired = 0;
        while let Some(due) = self.timers.next_due() {
            if fired >= limit {
                return Err(SequencerError::StepLimitExceeded {
                    limit,
                    now_ms: self.timers.now_ms(),
                });
            }
            if let Some(task) = self.timers.pop_due(due) {
                self.fire(task);
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Virtual time of the next pending timer
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Current state
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Current playback state
    pub fn playback(&self) -> PlaybackState {
        self.state.playback
    }

    /// Index of the step in progress
    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    /// Number of pending timers
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of pending step advances
    pub fn pending_advances(&self) -> usize {
        self.pending(|task| matches!(task, SequencerTask::AdvanceStep))
    }

    /// Whether the completion grace period is running
    pub fn is_awaiting_reset(&self) -> bool {
        self.pending(|task| matches!(task, SequencerTask::AutoReset)) > 0
    }

    /// Pending tasks in no particular order
    pub fn pending_tasks(&self) -> impl Iterator<Item = &SequencerTask> {
        self.timers.iter().map(|t| &t.task)
    }

    /// Step list
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Timing table
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Presentation sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable presentation sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the sequencer, returning its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn pending(&self, predicate: impl Fn(&SequencerTask) -> bool) -> usize {
        self.timers.iter().filter(|t| predicate(&t.task)).count()
    }

    /// Lay out the step under the cursor, or finish if past the end
    fn run_step(&mut self) {
        let index = self.state.current_step;
        let Some(step) = self.steps.get(index) else {
            self.complete();
            return;
        };

        tracing::debug!("Running step {}: {}", index + 1, step.name);
        self.sink.set_readout(&step.readout(index));

        for target in 0..step.targets.len() {
            self.timers.schedule(
                self.timing.target_offset(target),
                SequencerTask::ActivateTarget { step: index, target },
            );
        }

        let target_count = step.targets.len();
        for connector in 0..step.connectors.len() {
            self.timers.schedule(
                self.timing.connector_offset(target_count, connector),
                SequencerTask::ActivateConnector { step: index, connector },
            );
        }

        self.timers.schedule(step.duration_ms, SequencerTask::AdvanceStep);
    }

    fn complete(&mut self) {
        self.sink.set_readout(COMPLETE_READOUT);
        self.sink.reveal_control(Control::Start);
        self.sink.hide_control(Control::Pause);
        self.state.playback = PlaybackState::Idle;
        self.timers
            .schedule(self.timing.auto_reset_delay_ms, SequencerTask::AutoReset);
        tracing::info!("Sequence complete after {} steps", self.steps.len());
    }

    fn fire(&mut self, scheduled: ScheduledTask<SequencerTask>) {
        match scheduled.task {
            SequencerTask::ActivateTarget { step, target } => {
                let Some(target) = self.steps.get(step).and_then(|s| s.targets.get(target)) else {
                    return;
                };
                if !report(self.sink.set_active(&target.id)) {
                    return;
                }
                match target.effect {
                    Some(effect) if effect.is_deferred() => {
                        self.timers.schedule(
                            self.timing.fill_delay_ms,
                            SequencerTask::ApplyEffect {
                                id: target.id.clone(),
                                effect,
                            },
                        );
                    }
                    Some(effect) => {
                        report(self.sink.set_effect(&target.id, effect));
                    }
                    None => {}
                }
            }
            SequencerTask::ApplyEffect { id, effect } => {
                report(self.sink.set_effect(&id, effect));
            }
            SequencerTask::ActivateConnector { step, connector } => {
                let Some(id) = self.steps.get(step).and_then(|s| s.connectors.get(connector)) else {
                    return;
                };
                if !report(self.sink.set_active(id)) {
                    return;
                }
                report(self.sink.set_effect(id, Effect::PathDraw));
                self.timers.schedule(
                    self.timing.flow_fill_delay_ms,
                    SequencerTask::FlowFill { id: id.clone() },
                );
            }
            SequencerTask::FlowFill { id } => {
                report(self.sink.set_effect(&id, Effect::FlowFill));
            }
            SequencerTask::AdvanceStep => {
                self.state.current_step += 1;
                self.run_step();
            }
            SequencerTask::AutoReset => self.reset(),
        }
    }

    fn clear_visuals(&mut self) {
        for step in &self.steps {
            for id in step.element_ids() {
                report(self.sink.clear_active(id));
            }
        }
    }
}

/// Cosmetic lookup misses are logged and skipped. Returns whether the change applied.
fn report(result: Result<(), SinkError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("{err}; skipping");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::biodiesel_process;
    use crate::sink::PageModel;
    use crate::step::StepTarget;

    fn sequencer(steps: Vec<Step>) -> Sequencer<PageModel> {
        let page = PageModel::for_steps(&steps);
        Sequencer::new(steps, Timing::default(), page)
    }

    fn biodiesel() -> Sequencer<PageModel> {
        sequencer(biodiesel_process())
    }

    #[test]
    fn test_single_step_timeline() {
        let step = Step::new("Only", "Single", 100).target(StepTarget::plain("a"));
        let mut seq = sequencer(vec![step]);

        seq.start();
        seq.advance_by(0);
        assert!(seq.sink().is_active("a"));
        assert_eq!(seq.sink().readout(), "Step 1: Only — Single");

        seq.advance_by(99);
        assert_eq!(seq.playback(), PlaybackState::Running);

        seq.advance_by(1);
        assert_eq!(seq.sink().readout(), COMPLETE_READOUT);
        assert_eq!(seq.playback(), PlaybackState::Idle);
        assert!(seq.is_awaiting_reset());
        assert!(seq.sink().is_active("a"));

        seq.advance_by(2500);
        assert_eq!(seq.sink().readout(), READY_READOUT);
        assert!(seq.sink().all_inactive());
        assert_eq!(seq.pending_timers(), 0);
    }

    #[test]
    fn test_full_run_readouts() {
        let mut seq = biodiesel();
        seq.start();
        seq.run_until_idle(DEFAULT_STEP_LIMIT).unwrap();

        let mut expected: Vec<String> = biodiesel_process()
            .iter()
            .enumerate()
            .map(|(i, s)| s.readout(i))
            .collect();
        expected.push(COMPLETE_READOUT.to_string());
        expected.push(READY_READOUT.to_string());

        assert_eq!(seq.sink().readout_history(), expected.as_slice());
        assert!(seq.sink().all_inactive());
        assert_eq!(seq.pending_timers(), 0);
        assert_eq!(seq.playback(), PlaybackState::Idle);
        assert_eq!(seq.now_ms(), 15_500 + 2500);
    }

    #[test]
    fn test_final_state_visible_during_grace_period() {
        let mut seq = biodiesel();
        seq.start();
        seq.advance_to(15_500);

        assert_eq!(seq.sink().readout(), COMPLETE_READOUT);
        assert!(seq.sink().is_active("item-biodiesel"));
        assert!(seq.sink().has_effect("item-biodiesel", Effect::Fill));
        assert!(seq.sink().has_effect("arrow-8", Effect::FlowFill));
        assert!(seq.sink().is_visible(Control::Start));
        assert!(!seq.sink().is_visible(Control::Pause));
    }

    #[test]
    fn test_target_and_connector_offsets() {
        let step = Step::new("s", "d", 3000)
            .target(StepTarget::plain("t1"))
            .target(StepTarget::with_effect("t2", Effect::Mixing))
            .connector("c1")
            .connector("c2");
        let mut seq = sequencer(vec![step]);
        seq.start();

        seq.advance_to(299);
        assert_eq!(seq.sink().active_ids(), vec!["t1"]);

        seq.advance_to(300);
        assert!(seq.sink().has_effect("t2", Effect::Mixing));

        // Connectors start at 2 * 300 + 500
        seq.advance_to(1099);
        assert!(!seq.sink().is_active("c1"));
        seq.advance_to(1100);
        assert!(seq.sink().is_active("c1"));
        assert!(seq.sink().has_effect("c1", Effect::PathDraw));
        assert!(!seq.sink().has_effect("c1", Effect::FlowFill));

        seq.advance_to(1500);
        assert!(seq.sink().is_active("c2"));

        seq.advance_to(1900);
        assert!(seq.sink().has_effect("c1", Effect::FlowFill));
        assert!(!seq.sink().has_effect("c2", Effect::FlowFill));

        seq.advance_to(2300);
        assert!(seq.sink().has_effect("c2", Effect::FlowFill));
    }

    #[test]
    fn test_deferred_fill() {
        let step = Step::new("s", "d", 2000).target(StepTarget::with_effect("p", Effect::Fill));
        let mut seq = sequencer(vec![step]);
        seq.start();

        seq.advance_to(599);
        assert!(seq.sink().is_active("p"));
        assert!(!seq.sink().has_effect("p", Effect::Fill));

        seq.advance_to(600);
        assert!(seq.sink().has_effect("p", Effect::Fill));
    }

    #[test]
    fn test_reset_cancels_deferred_effects() {
        let step = Step::new("s", "d", 2000)
            .target(StepTarget::with_effect("p", Effect::Fill))
            .connector("c");

        // Target active, fill pending
        let mut seq = sequencer(vec![step.clone()]);
        seq.start();
        seq.advance_to(100);
        assert!(seq.sink().is_active("p"));
        seq.reset();
        seq.advance_by(5000);
        assert!(seq.sink().all_inactive());

        // Connector active, flow pending
        let mut seq = sequencer(vec![step]);
        seq.start();
        seq.advance_to(800);
        assert!(seq.sink().is_active("c"));
        assert!(!seq.sink().has_effect("c", Effect::FlowFill));
        seq.reset();
        seq.advance_by(5000);
        assert!(seq.sink().all_inactive());
        assert_eq!(seq.sink().readout(), READY_READOUT);
    }

    #[test]
    fn test_pause_during_step_three_resumes_same_step() {
        let mut seq = biodiesel();
        seq.start();

        // Step 3 starts at 1500 + 2000
        seq.advance_to(3600);
        assert_eq!(seq.current_step(), 2);

        seq.pause();
        assert_eq!(seq.playback(), PlaybackState::Paused);
        assert_eq!(seq.pending_timers(), 0);

        let readout = seq.sink().readout().to_string();
        let history_len = seq.sink().readout_history().len();
        let active: Vec<String> = seq.sink().active_ids().into_iter().map(String::from).collect();

        seq.advance_by(10_000);
        assert_eq!(seq.sink().readout(), readout);
        assert_eq!(seq.sink().readout_history().len(), history_len);
        assert_eq!(seq.sink().active_ids(), active);
        assert_eq!(seq.current_step(), 2);

        seq.start();
        assert_eq!(seq.playback(), PlaybackState::Running);
        assert_eq!(seq.current_step(), 2);
        assert_eq!(seq.sink().readout(), readout);
        assert_eq!(seq.sink().readout_history().len(), history_len + 1);

        // The resumed step runs its full duration again
        let resumed_at = seq.now_ms();
        seq.advance_to(resumed_at + 2499);
        assert_eq!(seq.current_step(), 2);
        seq.advance_to(resumed_at + 2500);
        assert_eq!(seq.current_step(), 3);
    }

    #[test]
    fn test_pause_then_reset() {
        let mut seq = biodiesel();
        seq.start();
        seq.advance_to(4000);
        seq.pause();
        seq.reset();

        assert_eq!(seq.pending_timers(), 0);
        assert!(seq.sink().all_inactive());
        assert_eq!(seq.state(), SequencerState::default());
        assert_eq!(seq.sink().readout(), READY_READOUT);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut once = biodiesel();
        once.start();
        once.advance_to(5000);
        once.reset();

        let mut twice = biodiesel();
        twice.start();
        twice.advance_to(5000);
        twice.reset();
        twice.reset();

        assert_eq!(once.state(), twice.state());
        assert_eq!(once.pending_timers(), twice.pending_timers());
        assert_eq!(once.sink().readout(), twice.sink().readout());
        assert!(once.sink().elements().eq(twice.sink().elements()));
        for control in [Control::Start, Control::Pause] {
            assert_eq!(once.sink().is_visible(control), twice.sink().is_visible(control));
        }
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let mut seq = biodiesel();
        seq.start();
        seq.advance_by(100);
        seq.start();
        seq.start();

        assert_eq!(seq.pending_advances(), 1);
        assert_eq!(seq.sink().readout_history().len(), 1);
    }

    #[test]
    fn test_pause_when_idle_is_noop() {
        let mut seq = biodiesel();
        seq.pause();
        assert_eq!(seq.playback(), PlaybackState::Idle);

        seq.start();
        assert_eq!(seq.playback(), PlaybackState::Running);
        assert_eq!(seq.pending_advances(), 1);
    }

    #[test]
    fn test_controls_follow_state() {
        let mut seq = biodiesel();
        seq.start();
        assert!(!seq.sink().is_visible(Control::Start));
        assert!(seq.sink().is_visible(Control::Pause));

        seq.pause();
        assert!(seq.sink().is_visible(Control::Start));
        assert!(!seq.sink().is_visible(Control::Pause));

        seq.start();
        seq.reset();
        assert!(seq.sink().is_visible(Control::Start));
        assert!(!seq.sink().is_visible(Control::Pause));
    }

    #[test]
    fn test_restart_during_grace_period() {
        let mut seq = biodiesel();
        seq.start();
        seq.advance_to(15_500);
        assert!(seq.is_awaiting_reset());

        seq.start();
        assert!(!seq.is_awaiting_reset());
        assert_eq!(seq.current_step(), 0);
        assert_eq!(seq.sink().active_ids(), Vec::<&str>::new());

        // The stale auto-reset would have landed here
        seq.advance_to(15_500 + 2500);
        assert_eq!(seq.playback(), PlaybackState::Running);
        assert_eq!(seq.current_step(), 1);
    }

    #[test]
    fn test_missing_targets_are_skipped() {
        let steps = vec![
            Step::new("s1", "d", 1000)
                .target(StepTarget::with_effect("ghost", Effect::Fill))
                .target(StepTarget::plain("a"))
                .connector("ghost-arrow"),
            Step::new("s2", "d", 1000).target(StepTarget::plain("b")),
        ];
        let page = PageModel::new(["a", "b"]);
        let mut seq = Sequencer::new(steps, Timing::default(), page);

        seq.start();
        seq.advance_to(2000);
        assert!(seq.sink().is_active("a"));
        assert!(seq.sink().is_active("b"));
        assert_eq!(seq.sink().readout(), COMPLETE_READOUT);

        seq.run_until_idle(DEFAULT_STEP_LIMIT).unwrap();
        assert!(seq.sink().all_inactive());
    }

    #[test]
    fn test_empty_process_completes_immediately() {
        let mut seq = sequencer(Vec::new());
        seq.start();
        assert_eq!(seq.sink().readout(), COMPLETE_READOUT);
        assert_eq!(seq.playback(), PlaybackState::Idle);
    }

    #[test]
    fn test_run_until_idle_limit() {
        let mut seq = biodiesel();
        seq.start();
        let err = seq.run_until_idle(3).unwrap_err();
        assert!(matches!(err, SequencerError::StepLimitExceeded { limit: 3, .. }));
        assert!(seq.pending_timers() > 0);
    }

    #[test]
    fn test_overrunning_flow_lands_in_next_step() {
        // Mixing step: arrow-3 flow fires at 2400ms, 400ms into heating
        let mut seq = biodiesel();
        seq.start();
        seq.advance_to(1500 + 2000);
        assert_eq!(seq.current_step(), 2);
        assert!(!seq.sink().has_effect("arrow-3", Effect::FlowFill));

        seq.advance_to(1500 + 2400);
        assert!(seq.sink().has_effect("arrow-3", Effect::FlowFill));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Start,
            Pause,
            Reset,
            Advance(u64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Start),
                Just(Op::Pause),
                Just(Op::Reset),
                (0u64..4000).prop_map(Op::Advance),
            ]
        }

        proptest! {
            #[test]
            fn test_at_most_one_pending_advance(ops in prop::collection::vec(op(), 0..40)) {
                let mut seq = biodiesel();
                for action in ops {
                    match action {
                        Op::Start => seq.start(),
                        Op::Pause => seq.pause(),
                        Op::Reset => seq.reset(),
                        Op::Advance(ms) => seq.advance_by(ms),
                    }
                    prop_assert!(seq.pending_advances() <= 1);
                    if seq.playback() != PlaybackState::Running {
                        prop_assert_eq!(seq.pending_advances(), 0);
                    }
                }
            }

            #[test]
            fn test_pause_then_reset_clears_everything(ops in prop::collection::vec(op(), 0..40)) {
                let mut seq = biodiesel();
                for action in ops {
                    match action {
                        Op::Start => seq.start(),
                        Op::Pause => seq.pause(),
                        Op::Reset => seq.reset(),
                        Op::Advance(ms) => seq.advance_by(ms),
                    }
                }
                seq.pause();
                seq.reset();
                prop_assert_eq!(seq.pending_timers(), 0);
                prop_assert!(seq.sink().all_inactive());
                prop_assert_eq!(seq.sink().readout(), READY_READOUT);

                seq.advance_by(60_000);
                prop_assert!(seq.sink().all_inactive());
            }
        }
    }
}
