//! Lifecycle callbacks supplied at engine construction.
//!
//! Callbacks run on whichever task drove the transition, after the engine
//! has released its state lock, so they may freely read from the engine.

use std::sync::Arc;
use walkthrough_core::error::StepFailure;
use walkthrough_core::step::Step;

pub trait EngineObserver: Send + Sync {
    /// Once per load, before the first step executes.
    fn on_scenario_start(&self, _name: &str) {}

    /// When forward advancement reaches the last step.
    fn on_scenario_complete(&self) {}

    /// After every pointer move: forward, backward, jump or reset.
    fn on_step_change(&self, _step_number: usize, _step: &Step) {}

    /// A step's action returned an error or panicked. The scenario carries on.
    fn on_step_error(&self, _step_number: usize, _failure: &StepFailure) {}
}

impl<T: EngineObserver + ?Sized> EngineObserver for Arc<T> {
    fn on_scenario_start(&self, name: &str) {
        (**self).on_scenario_start(name)
    }

    fn on_scenario_complete(&self) {
        (**self).on_scenario_complete()
    }

    fn on_step_change(&self, step_number: usize, step: &Step) {
        (**self).on_step_change(step_number, step)
    }

    fn on_step_error(&self, step_number: usize, failure: &StepFailure) {
        (**self).on_step_error(step_number, failure)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

type StartFn = Arc<dyn Fn(&str) + Send + Sync>;
type CompleteFn = Arc<dyn Fn() + Send + Sync>;
type StepChangeFn = Arc<dyn Fn(usize, &Step) + Send + Sync>;
type StepErrorFn = Arc<dyn Fn(usize, &StepFailure) + Send + Sync>;

/// Closure-based observer.
///
/// ```rust,ignore
/// let callbacks = Callbacks::new()
///     .scenario_start(|name| println!("starting {}", name))
///     .step_change(|n, step| println!("[{}] {}", n, step.explanation));
/// let engine = Engine::new(EngineConfig::default(), callbacks)?;
/// ```
#[derive(Clone, Default)]
pub struct Callbacks {
    scenario_start: Option<StartFn>,
    scenario_complete: Option<CompleteFn>,
    step_change: Option<StepChangeFn>,
    step_error: Option<StepErrorFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scenario_start(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.scenario_start = Some(Arc::new(f));
        self
    }

    pub fn scenario_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.scenario_complete = Some(Arc::new(f));
        self
    }

    pub fn step_change(mut self, f: impl Fn(usize, &Step) + Send + Sync + 'static) -> Self {
        self.step_change = Some(Arc::new(f));
        self
    }

    pub fn step_error(mut self, f: impl Fn(usize, &StepFailure) + Send + Sync + 'static) -> Self {
        self.step_error = Some(Arc::new(f));
        self
    }
}

impl EngineObserver for Callbacks {
    fn on_scenario_start(&self, name: &str) {
        if let Some(f) = &self.scenario_start {
            f(name);
        }
    }

    fn on_scenario_complete(&self) {
        if let Some(f) = &self.scenario_complete {
            f();
        }
    }

    fn on_step_change(&self, step_number: usize, step: &Step) {
        if let Some(f) = &self.step_change {
            f(step_number, step);
        }
    }

    fn on_step_error(&self, step_number: usize, failure: &StepFailure) {
        if let Some(f) = &self.step_error {
            f(step_number, failure);
        }
    }
}
