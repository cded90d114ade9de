use crate::step::{Metadata, Step};
use uuid::Uuid;

/// A named, ordered sequence of steps.
///
/// Immutable once handed to the engine: loading a new scenario replaces the
/// previous one wholesale.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<Step>,
    pub metadata: Metadata,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            steps: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn add_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Split into the `(name, steps)` pair the engine loads.
    pub fn into_parts(self) -> (String, Vec<Step>) {
        (self.name, self.steps)
    }
}
