//! # Step: One Moment of a Scenario
//!
//! A `Step` is a single unit of simulated work: an explanation shown to
//! observers, an optional async action, and the time auto-play waits before
//! moving past it.
//!
//! Steps are plain data. The engine never inspects `metadata`, and a step
//! without an action is inert: transitions onto it still happen, nothing runs.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Auto-play wait used when a step does not specify its own duration.
pub const DEFAULT_STEP_DURATION_MS: u64 = 1500;

/// Type alias for async boxed futures used by step actions.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type StepError = Box<dyn std::error::Error + Send + Sync>;

pub type StepResult = Result<(), StepError>;

/// The side effect a step performs when the engine executes it.
///
/// Must be `Send + Sync` so the same step can be re-executed from the
/// auto-play timer, the keyboard listener, or a direct caller.
pub type StepAction = Arc<dyn Fn() -> BoxFuture<'static, StepResult> + Send + Sync>;

/// Opaque annotations (category, analytics tag, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Wrap an async closure into a [`StepAction`].
pub fn action_fn<F, Fut>(f: F) -> StepAction
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, StepResult> { Box::pin(f()) })
}

#[derive(Clone, Default)]
pub struct Step {
    pub explanation: String,
    pub action: Option<StepAction>,
    /// Milliseconds auto-play waits on this step. `None` defers to the
    /// engine's configured default.
    pub duration_ms: Option<u64>,
    pub metadata: Metadata,
}

impl Step {
    /// An inert step with the given explanation.
    pub fn new(explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
            ..Default::default()
        }
    }

    pub fn with_action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        self.action = Some(action_fn(f));
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_inert(&self) -> bool {
        self.action.is_none()
    }

    /// Auto-play wait in milliseconds, or `default_ms` when unset.
    pub fn duration_ms_or(&self, default_ms: u64) -> u64 {
        self.duration_ms.unwrap_or(default_ms)
    }

    /// Start the action, if any. The returned future owns everything it needs.
    pub fn run(&self) -> Option<BoxFuture<'static, StepResult>> {
        self.action.as_ref().map(|action| action())
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("explanation", &self.explanation)
            .field("action", &self.action.as_ref().map(|_| "<action>"))
            .field("duration_ms", &self.duration_ms)
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_step_is_inert() {
        let step = Step::new("nothing happens");
        assert!(step.is_inert());
        assert!(step.run().is_none());
        assert_eq!(step.duration_ms_or(400), 400);
    }

    #[tokio::test]
    async fn test_run_invokes_action_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let step = Step::new("count").with_duration(200).with_action(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        step.run().unwrap().await.unwrap();
        step.run().unwrap().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(step.duration_ms_or(400), 200);
    }

    #[test]
    fn test_debug_hides_action() {
        let step = Step::new("x").with_action(|| async { Ok(()) });
        let rendered = format!("{:?}", step);
        assert!(rendered.contains("<action>"));
    }
}
