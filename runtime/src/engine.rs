//! # Engine: Scenario Execution State Machine
//!
//! The `Engine` owns the active scenario's position and run flags and is the
//! single source of truth for step transitions.
//!
//! ## Transition policy
//!
//! * **Forward executes**: `go_to_next_step` runs the action of the step it
//!   lands on.
//! * **Backward and jumps only move the pointer**: revisiting a step never
//!   replays (or undoes) its side effects.
//! * **Failures never halt the show**: an action that errors or panics is
//!   logged and reported to `on_step_error`; the pointer and the remaining
//!   callbacks behave as if it had succeeded.
//! * **One action at a time**: a forward request that arrives while another
//!   action is in flight still moves the pointer, but its action is dropped
//!   with a warning rather than queued.
//!
//! ```rust,ignore
//! let engine = Engine::new(EngineConfig::default(), Callbacks::new())?;
//! engine.load_scenario("Demo", steps, LoadOptions::default()).await;
//! engine.go_to_next_step().await;
//! engine.go_to_previous_step();
//! ```

use crate::observer::{EngineObserver, NoopObserver};
use crate::scheduler;
use crate::state::{EngineSnapshot, ExecutionState};
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;
use walkthrough_core::config::{EngineConfig, validate_speed};
use walkthrough_core::error::{ConfigError, StepFailure};
use walkthrough_core::scenario::Scenario;
use walkthrough_core::step::Step;
use walkthrough_core::timeline::{Timeline, TimelineEvent, Transition, now_millis};

/// How `load_scenario` starts the new scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Enter and execute step 1 immediately
    pub auto_start: bool,
    /// Begin with auto-play enabled
    pub auto_play: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            auto_start: true,
            auto_play: false,
        }
    }
}

impl LoadOptions {
    /// Store the steps without entering step 1.
    pub fn deferred() -> Self {
        Self {
            auto_start: false,
            auto_play: false,
        }
    }

    pub fn playing() -> Self {
        Self {
            auto_start: true,
            auto_play: true,
        }
    }
}

pub(crate) struct EngineInner {
    state: Mutex<ExecutionState>,
    observer: Arc<dyn EngineObserver>,
    snapshots: watch::Sender<EngineSnapshot>,
    tickets: AtomicU64,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.state.get_mut().cancel_timer();
    }
}

/// Cheaply clonable handle to one execution state machine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

/// A handle that does not keep the engine alive.
#[derive(Clone)]
pub struct WeakEngine {
    inner: Weak<EngineInner>,
}

impl WeakEngine {
    pub fn upgrade(&self) -> Option<Engine> {
        self.inner.upgrade().map(|inner| Engine { inner })
    }
}

/// Releases the reentrancy guard when the action settles, however it settles.
struct ExecutionGuard<'a> {
    inner: &'a EngineInner,
    ticket: u64,
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        // A load or stop may have cleared the guard and a newer action may
        // hold it now; only release our own ticket.
        if state.executing == Some(self.ticket) {
            state.executing = None;
        }
    }
}

pub struct EngineBuilder {
    config: EngineConfig,
    observer: Arc<dyn EngineObserver>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn speed(mut self, speed_multiplier: f64) -> Self {
        self.config.speed_multiplier = speed_multiplier;
        self
    }

    pub fn observer(mut self, observer: impl EngineObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.validate()?;
        let state = ExecutionState::new(&self.config);
        let (snapshots, _) = watch::channel(state.snapshot());
        Ok(Engine {
            inner: Arc::new(EngineInner {
                state: Mutex::new(state),
                observer: self.observer,
                snapshots,
                tickets: AtomicU64::new(0),
            }),
        })
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            config: EngineConfig::default(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn new(config: EngineConfig, observer: impl EngineObserver + 'static) -> Result<Self, ConfigError> {
        Self::builder().config(config).observer(observer).build()
    }

    pub fn downgrade(&self) -> WeakEngine {
        WeakEngine {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Replace whatever is loaded with `steps` and, unless deferred, enter
    /// and execute step 1. Completes once step 1's action has settled.
    pub async fn load_scenario(&self, name: impl Into<String>, steps: Vec<Step>, options: LoadOptions) {
        let name = name.into();
        let span = tracing::info_span!("scenario", walkthrough.scenario = %name);
        self.load_inner(name, steps, options).instrument(span).await
    }

    /// Load a typed [`Scenario`].
    pub async fn load(&self, scenario: Scenario, options: LoadOptions) {
        let (name, steps) = scenario.into_parts();
        self.load_scenario(name, steps, options).await
    }

    async fn load_inner(&self, name: String, steps: Vec<Step>, options: LoadOptions) {
        let (first, generation) = {
            let mut state = self.inner.state.lock();
            state.cancel_timer();
            state.executing = None;
            state.generation += 1;
            state.current_step = 0;
            state.is_running = false;
            state.is_auto_playing = options.auto_play;
            state.steps = steps;
            state.scenario_name.clone_from(&name);

            state.timeline = Timeline::new();
            let step_count = state.total_steps();
            state.record(TimelineEvent::ScenarioLoaded {
                run_id: Uuid::new_v4(),
                name: name.clone(),
                step_count,
                timestamp: now_millis(),
            });

            let first = if options.auto_start && step_count > 0 {
                state.is_running = true;
                state.enter(1, Transition::Start);
                Some(state.steps[0].clone())
            } else {
                None
            };
            if step_count == 0 {
                tracing::warn!("Loaded a scenario with no steps; nothing to run");
            }

            self.commit(&mut state);
            (first, state.generation)
        };

        tracing::info!(auto_start = options.auto_start, auto_play = options.auto_play, "Scenario loaded");
        self.inner.observer.on_scenario_start(&name);

        if let Some(step) = first {
            self.execute_step(1, &step, generation).await;
            if self.is_current(generation) {
                self.inner.observer.on_step_change(1, &step);
            }
        }
    }

    /// Advance one step and execute it. No-op at the last step or when idle.
    pub async fn go_to_next_step(&self) {
        let (step_number, step, generation, reached_end) = {
            let mut state = self.inner.state.lock();
            if state.current_step >= state.total_steps() {
                tracing::trace!(step = state.current_step, "Already at the last step");
                return;
            }
            let next = state.current_step + 1;
            state.enter(next, Transition::Forward);
            let step = state.steps[next - 1].clone();
            let reached_end = next == state.total_steps();
            self.commit(&mut state);
            (next, step, state.generation, reached_end)
        };
        tracing::debug!(step = step_number, "Advanced");

        self.execute_step(step_number, &step, generation).await;

        // Only a new generation (stop, reset or reload) makes these stale.
        if !self.is_current(generation) {
            tracing::debug!(step = step_number, "Scenario changed while the action ran; skipping callbacks");
            return;
        }
        self.inner.observer.on_step_change(step_number, &step);

        if reached_end {
            self.inner
                .state
                .lock()
                .record(TimelineEvent::ScenarioCompleted { timestamp: now_millis() });
            tracing::info!("Scenario complete");
            self.inner.observer.on_scenario_complete();
        }
    }

    /// Step back without executing anything. No-op at step 1 or when idle.
    pub fn go_to_previous_step(&self) {
        let (step_number, step) = {
            let mut state = self.inner.state.lock();
            if state.current_step <= 1 {
                return;
            }
            let previous = state.current_step - 1;
            state.enter(previous, Transition::Backward);
            self.commit(&mut state);
            (previous, state.steps[previous - 1].clone())
        };
        tracing::debug!(step = step_number, "Stepped back");
        self.inner.observer.on_step_change(step_number, &step);
    }

    /// Jump straight to step `n` (1-indexed). Skipped steps do not execute.
    pub fn go_to_step(&self, n: usize) {
        let step = {
            let mut state = self.inner.state.lock();
            if n == 0 || n > state.total_steps() {
                tracing::trace!(target_step = n, "Jump out of range ignored");
                return;
            }
            state.enter(n, Transition::Jump);
            self.commit(&mut state);
            state.steps[n - 1].clone()
        };
        tracing::debug!(step = n, "Jumped");
        self.inner.observer.on_step_change(n, &step);
    }

    pub fn toggle_auto_play(&self) {
        let mut state = self.inner.state.lock();
        state.is_auto_playing = !state.is_auto_playing;
        tracing::debug!(auto_play = state.is_auto_playing, "Auto-play toggled");
        self.commit(&mut state);
    }

    pub fn start_auto_play(&self) {
        self.set_auto_play(true);
    }

    pub fn pause_auto_play(&self) {
        self.set_auto_play(false);
    }

    fn set_auto_play(&self, enabled: bool) {
        let mut state = self.inner.state.lock();
        if state.is_auto_playing == enabled {
            return;
        }
        state.is_auto_playing = enabled;
        tracing::debug!(auto_play = enabled, "Auto-play changed");
        self.commit(&mut state);
    }

    /// Return to idle. Safe to call repeatedly.
    pub fn stop_scenario(&self) {
        let mut state = self.inner.state.lock();
        let was_loaded = state.is_running || !state.steps.is_empty();
        state.reset_to_idle();
        if was_loaded {
            state.record(TimelineEvent::ScenarioStopped { timestamp: now_millis() });
            tracing::info!("Scenario stopped");
        }
        self.commit(&mut state);
    }

    /// Back to step 1, executing it again, with auto-play paused.
    pub async fn reset_scenario(&self) {
        let (step, generation) = {
            let mut state = self.inner.state.lock();
            if state.steps.is_empty() {
                return;
            }
            state.cancel_timer();
            state.generation += 1;
            state.is_auto_playing = false;
            state.record(TimelineEvent::ScenarioReset { timestamp: now_millis() });
            state.enter(1, Transition::Reset);
            self.commit(&mut state);
            (state.steps[0].clone(), state.generation)
        };
        tracing::info!("Scenario reset");

        self.execute_step(1, &step, generation).await;
        if self.is_current(generation) {
            self.inner.observer.on_step_change(1, &step);
        }
    }

    pub fn set_speed_multiplier(&self, speed_multiplier: f64) -> Result<(), ConfigError> {
        validate_speed(speed_multiplier)?;
        let mut state = self.inner.state.lock();
        if state.speed_multiplier == speed_multiplier {
            return Ok(());
        }
        state.speed_multiplier = speed_multiplier;
        tracing::debug!(speed = speed_multiplier, "Speed multiplier changed");
        self.commit(&mut state);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Receive a fresh snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn current_step(&self) -> usize {
        self.inner.state.lock().current_step
    }

    pub fn total_steps(&self) -> usize {
        self.inner.state.lock().total_steps()
    }

    pub fn is_auto_playing(&self) -> bool {
        self.inner.state.lock().is_auto_playing
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().is_running
    }

    pub fn scenario_name(&self) -> String {
        self.inner.state.lock().scenario_name.clone()
    }

    pub fn current_step_data(&self) -> Option<Step> {
        self.inner.state.lock().current_step_data().cloned()
    }

    pub fn step_explanation(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .current_step_data()
            .map(|step| step.explanation.clone())
    }

    pub fn can_go_next(&self) -> bool {
        self.snapshot().can_go_next
    }

    pub fn can_go_previous(&self) -> bool {
        self.snapshot().can_go_previous
    }

    pub fn is_complete(&self) -> bool {
        self.snapshot().is_complete
    }

    pub fn progress(&self) -> f64 {
        self.snapshot().progress
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.inner.state.lock().speed_multiplier
    }

    /// Whether an auto-advance is currently scheduled.
    pub fn has_pending_advance(&self) -> bool {
        self.inner.state.lock().pending_timer.is_some()
    }

    /// Events recorded since the current scenario was loaded.
    pub fn timeline(&self) -> Timeline {
        self.inner.state.lock().timeline.clone()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Reschedule auto-play and publish the new snapshot. Call after every
    /// mutation, with the lock still held.
    fn commit(&self, state: &mut ExecutionState) {
        scheduler::reschedule(self, state);
        self.inner.snapshots.send_replace(state.snapshot());
    }

    /// Remove timer `id` from the pending slot without aborting it.
    pub(crate) fn claim_timer(&self, id: u64) -> bool {
        let mut state = self.inner.state.lock();
        match &state.pending_timer {
            Some(timer) if timer.id == id => {
                state.pending_timer = None;
                true
            }
            _ => false,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.state.lock().generation == generation
    }

    fn acquire_guard(&self, step_number: usize) -> Option<ExecutionGuard<'_>> {
        let ticket = self.inner.tickets.fetch_add(1, Ordering::Relaxed) + 1;
        let mut state = self.inner.state.lock();
        if state.executing.is_some() {
            tracing::warn!(step = step_number, "Another step action is still executing; skipping this one");
            state.record(TimelineEvent::StepSkipped {
                step: step_number,
                timestamp: now_millis(),
            });
            return None;
        }
        state.executing = Some(ticket);
        Some(ExecutionGuard {
            inner: &self.inner,
            ticket,
        })
    }

    async fn execute_step(&self, step_number: usize, step: &Step, generation: u64) {
        if step.is_inert() {
            tracing::trace!(step = step_number, "Inert step, nothing to execute");
            return;
        }
        let Some(_guard) = self.acquire_guard(step_number) else {
            return;
        };

        let span = tracing::info_span!("step", walkthrough.step = step_number);
        let result = run_action(step).instrument(span).await;

        if let Err(failure) = result {
            tracing::error!(step = step_number, error = %failure, "Step action failed");
            let current = {
                let mut state = self.inner.state.lock();
                let current = state.generation == generation;
                if current {
                    state.record(TimelineEvent::StepFailed {
                        step: step_number,
                        failure: failure.clone(),
                        timestamp: now_millis(),
                    });
                }
                current
            };
            if current {
                self.inner.observer.on_step_error(step_number, &failure);
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("state", &self.snapshot()).finish()
    }
}

/// Run a step's action, turning errors and panics into a [`StepFailure`].
async fn run_action(step: &Step) -> Result<(), StepFailure> {
    let future = match panic::catch_unwind(AssertUnwindSafe(|| step.run())) {
        Ok(Some(future)) => future,
        Ok(None) => return Ok(()),
        Err(payload) => return Err(StepFailure::Panicked(panic_message(payload.as_ref()))),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(StepFailure::Failed(e.to_string())),
        Err(payload) => Err(StepFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_defaults() {
        let options = LoadOptions::default();
        assert!(options.auto_start);
        assert!(!options.auto_play);
        assert!(LoadOptions::playing().auto_play);
        assert!(!LoadOptions::deferred().auto_start);
    }

    #[test]
    fn test_builder_rejects_bad_speed() {
        let err = Engine::builder().speed(0.0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSpeed(_)));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_failed_action_is_reported_not_raised() {
        let engine = Engine::builder().build().unwrap();
        let steps = vec![
            Step::new("ok"),
            Step::new("fails").with_action(|| async { Err("backend down".into()) }),
        ];
        engine.load_scenario("Failing", steps, LoadOptions::default()).await;
        engine.go_to_next_step().await;

        assert_eq!(engine.current_step(), 2);
        let timeline = engine.timeline();
        let failures: Vec<_> = timeline.failures().collect();
        assert_eq!(failures, vec![(2, &StepFailure::Failed("backend down".into()))]);
    }
}
