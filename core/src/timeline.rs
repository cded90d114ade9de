use crate::error::StepFailure;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the pointer arrived at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// First step of a freshly loaded scenario
    Start,
    Forward,
    Backward,
    Jump,
    Reset,
}

/// Represents a discrete event in the engine's execution timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimelineEvent {
    ScenarioLoaded {
        run_id: Uuid,
        name: String,
        step_count: usize,
        timestamp: u64,
    },
    /// The pointer moved onto a step
    StepEntered {
        step: usize,
        via: Transition,
        timestamp: u64,
    },
    /// The step's action returned an error or panicked
    StepFailed {
        step: usize,
        failure: StepFailure,
        timestamp: u64,
    },
    /// Another action was in flight, so this step's action did not run
    StepSkipped { step: usize, timestamp: u64 },
    ScenarioCompleted { timestamp: u64 },
    ScenarioReset { timestamp: u64 },
    ScenarioStopped { timestamp: u64 },
}

/// Milliseconds since the Unix epoch, for timeline stamps.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// A sequential record of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every step number the pointer visited, in order.
    pub fn visited_steps(&self) -> Vec<(usize, Transition)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TimelineEvent::StepEntered { step, via, .. } => Some((*step, *via)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &StepFailure)> {
        self.events.iter().filter_map(|e| match e {
            TimelineEvent::StepFailed { step, failure, .. } => Some((*step, failure)),
            _ => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TimelineEvent::StepSkipped { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visited_steps_in_order() {
        let mut timeline = Timeline::new();
        timeline.push(TimelineEvent::StepEntered { step: 1, via: Transition::Start, timestamp: 1 });
        timeline.push(TimelineEvent::StepEntered { step: 2, via: Transition::Forward, timestamp: 2 });
        timeline.push(TimelineEvent::StepSkipped { step: 2, timestamp: 3 });
        timeline.push(TimelineEvent::StepEntered { step: 1, via: Transition::Backward, timestamp: 4 });

        assert_eq!(
            timeline.visited_steps(),
            vec![(1, Transition::Start), (2, Transition::Forward), (1, Transition::Backward)]
        );
        assert_eq!(timeline.skipped_count(), 1);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = TimelineEvent::StepFailed {
            step: 2,
            failure: StepFailure::Failed("boom".into()),
            timestamp: 10,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "step_failed");
        assert_eq!(json["failure"]["kind"], "failed");
    }
}
