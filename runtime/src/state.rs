//! ExecutionState - the engine's private, mutable state
//!
//! Only `Engine` mutates this. Everything the rendering layer sees goes
//! through [`EngineSnapshot`].

use serde::Serialize;
use std::time::Duration;
use tokio::task::AbortHandle;
use walkthrough_core::config::EngineConfig;
use walkthrough_core::dsl::scale_duration;
use walkthrough_core::step::Step;
use walkthrough_core::timeline::{Timeline, TimelineEvent, Transition, now_millis};

/// The single outstanding auto-advance.
pub(crate) struct PendingTimer {
    pub(crate) id: u64,
    pub(crate) handle: AbortHandle,
}

pub(crate) struct ExecutionState {
    /// 0 when idle, otherwise 1-indexed into `steps`
    pub(crate) current_step: usize,
    pub(crate) steps: Vec<Step>,
    pub(crate) is_auto_playing: bool,
    pub(crate) is_running: bool,
    pub(crate) scenario_name: String,
    /// Ticket of the action currently holding the reentrancy guard
    pub(crate) executing: Option<u64>,
    pub(crate) pending_timer: Option<PendingTimer>,
    pub(crate) speed_multiplier: f64,
    pub(crate) default_step_duration_ms: u64,
    /// Bumped on load, stop and reset so in-flight actions can tell they are stale
    pub(crate) generation: u64,
    pub(crate) timeline: Timeline,
    next_timer_id: u64,
}

impl ExecutionState {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        Self {
            current_step: 0,
            steps: Vec::new(),
            is_auto_playing: false,
            is_running: false,
            scenario_name: String::new(),
            executing: None,
            pending_timer: None,
            speed_multiplier: config.speed_multiplier,
            default_step_duration_ms: config.default_step_duration_ms,
            generation: 0,
            timeline: Timeline::new(),
            next_timer_id: 0,
        }
    }

    pub(crate) fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn current_step_data(&self) -> Option<&Step> {
        self.current_step.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// Move the pointer and record how it got there.
    pub(crate) fn enter(&mut self, step: usize, via: Transition) {
        self.current_step = step;
        self.record(TimelineEvent::StepEntered {
            step,
            via,
            timestamp: now_millis(),
        });
    }

    pub(crate) fn record(&mut self, event: TimelineEvent) {
        self.timeline.push(event);
    }

    pub(crate) fn cancel_timer(&mut self) {
        if let Some(timer) = self.pending_timer.take() {
            timer.handle.abort();
            tracing::trace!(timer = timer.id, "Auto-advance cancelled");
        }
    }

    pub(crate) fn next_timer_id(&mut self) -> u64 {
        self.next_timer_id += 1;
        self.next_timer_id
    }

    pub(crate) fn should_auto_advance(&self) -> bool {
        self.is_auto_playing
            && self.is_running
            && self.current_step > 0
            && self.current_step < self.total_steps()
    }

    /// Auto-play wait for the active step, already divided by the speed.
    pub(crate) fn current_step_wait(&self) -> Duration {
        let ms = self
            .current_step_data()
            .map(|step| step.duration_ms_or(self.default_step_duration_ms))
            .unwrap_or(self.default_step_duration_ms);
        scale_duration(ms, self.speed_multiplier)
    }

    pub(crate) fn reset_to_idle(&mut self) {
        self.cancel_timer();
        self.current_step = 0;
        self.steps.clear();
        self.is_auto_playing = false;
        self.is_running = false;
        self.scenario_name.clear();
        self.executing = None;
        self.generation += 1;
    }

    pub(crate) fn snapshot(&self) -> EngineSnapshot {
        let total_steps = self.total_steps();
        let current_step = self.current_step;
        EngineSnapshot {
            current_step,
            total_steps,
            is_auto_playing: self.is_auto_playing,
            is_running: self.is_running,
            scenario_name: self.scenario_name.clone(),
            step_explanation: self.current_step_data().map(|s| s.explanation.clone()),
            can_go_next: current_step < total_steps,
            can_go_previous: current_step > 1,
            is_complete: total_steps > 0 && current_step == total_steps,
            progress: if total_steps > 0 {
                current_step as f64 / total_steps as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Read-only projection of the engine for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub current_step: usize,
    pub total_steps: usize,
    pub is_auto_playing: bool,
    pub is_running: bool,
    pub scenario_name: String,
    pub step_explanation: Option<String>,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub is_complete: bool,
    /// Percentage in `0.0..=100.0`
    pub progress: f64,
}

impl EngineSnapshot {
    pub fn is_idle(&self) -> bool {
        self.current_step == 0 && !self.is_running && self.total_steps == 0
    }
}
