//! # Scenario Definition DSL
//!
//! Factory functions that fill defaults and flag malformed definitions, plus
//! a [`StepBuilder`] with shortcuts for the interaction shapes most
//! scenarios repeat (request, response, cache lookups, events, cleanup).
//!
//! Nothing here has side effects beyond `tracing` warnings. Effects happen
//! only when a built step's action is executed by the engine.

mod builder;
pub mod context;

pub use builder::{MESSAGE_TRAVEL_MS, StepBuilder};
pub use context::{
    FlowMessage, LogEntry, LogLevel, LogSink, MemoryBoard, MemoryLog, MessageBoard, MessageKind, Position,
    PositionLookup, SpeedDelay, StaticPositions, StepContext, TracingLog, scale_duration,
};

use crate::error::DefinitionError;
use crate::scenario::Scenario;
use crate::step::{DEFAULT_STEP_DURATION_MS, Metadata, Step, StepAction};

/// Build a step, filling in the default duration.
///
/// A blank explanation or a missing action is logged, not rejected; the
/// caller decides whether that is fatal.
pub fn create_step(
    explanation: impl Into<String>,
    action: Option<StepAction>,
    duration_ms: Option<u64>,
    metadata: Option<Metadata>,
) -> Step {
    let explanation = explanation.into();
    if explanation.trim().is_empty() {
        tracing::warn!("create_step: explanation is empty");
    }
    if action.is_none() {
        tracing::warn!(explanation = %explanation, "create_step: step has no action");
    }

    Step {
        explanation,
        action,
        duration_ms: Some(duration_ms.unwrap_or(DEFAULT_STEP_DURATION_MS)),
        metadata: metadata.unwrap_or_default(),
    }
}

/// Build a scenario. Only a missing name is an error; an empty step list is
/// a warning.
pub fn create_scenario(
    name: &str,
    description: Option<&str>,
    steps: Vec<Step>,
    metadata: Option<Metadata>,
) -> Result<Scenario, DefinitionError> {
    if name.trim().is_empty() {
        return Err(DefinitionError::MissingName);
    }
    if steps.is_empty() {
        tracing::warn!(scenario = %name, "create_scenario: scenario has no steps");
    }

    let mut scenario = Scenario::new(name);
    scenario.description = description.map(str::to_string);
    scenario.steps = steps;
    scenario.metadata = metadata.unwrap_or_default();
    Ok(scenario)
}

pub fn create_step_builder(context: StepContext) -> StepBuilder {
    StepBuilder::new(context)
}

/// A delay function dividing every wait by `speed_multiplier`.
///
/// The multiplier is not validated here; see [`scale_duration`].
pub fn create_speed_delay(speed_multiplier: f64) -> SpeedDelay {
    SpeedDelay::new(speed_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::action_fn;

    #[test]
    fn test_create_step_fills_defaults() {
        let step = create_step("Client sends request", Some(action_fn(|| async { Ok(()) })), None, None);
        assert_eq!(step.duration_ms, Some(DEFAULT_STEP_DURATION_MS));
        assert!(step.metadata.is_empty());
        assert!(!step.is_inert());
    }

    #[test]
    fn test_create_step_tolerates_missing_parts() {
        let step = create_step("", None, Some(300), None);
        assert!(step.is_inert());
        assert_eq!(step.duration_ms, Some(300));
    }

    #[test]
    fn test_create_scenario_requires_name() {
        let err = create_scenario("  ", None, vec![Step::new("a")], None).unwrap_err();
        assert!(matches!(err, DefinitionError::MissingName));
    }

    #[test]
    fn test_create_scenario_allows_empty_steps() {
        let scenario = create_scenario("Empty", Some("nothing yet"), vec![], None).unwrap();
        assert!(scenario.is_empty());
        assert_eq!(scenario.description.as_deref(), Some("nothing yet"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_delay_divides_wait() {
        let delay = create_speed_delay(4.0);
        let start = tokio::time::Instant::now();
        delay.wait(1000).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(250));
        assert!(elapsed < std::time::Duration::from_millis(260));
    }
}
