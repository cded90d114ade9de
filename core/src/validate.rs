//! Diagnostic passes over scenario definitions.
//!
//! Neither function fails: both collect every problem they find and leave
//! the decision to the caller. The engine itself loads malformed scenarios.

use crate::scenario::Scenario;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check a typed scenario for a name, at least one step, and an explanation
/// and action on every step.
pub fn validate_scenario(scenario: &Scenario) -> ValidationReport {
    let mut errors = Vec::new();

    if scenario.name.trim().is_empty() {
        errors.push("Scenario must have a name".to_string());
    }
    if scenario.steps.is_empty() {
        errors.push("Scenario must have at least one step".to_string());
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        let n = index + 1;
        if step.explanation.trim().is_empty() {
            errors.push(format!("Step {}: missing explanation", n));
        }
        if step.action.is_none() {
            errors.push(format!("Step {}: missing action", n));
        }
    }

    ValidationReport::from_errors(errors)
}

/// Check an untyped definition document (a parsed manifest).
///
/// Catches what the type system catches for [`Scenario`]: a missing or
/// non-array `steps` field and non-numeric durations. A manifest step's
/// action is its `kind`.
pub fn validate_definition(document: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    let name = document.get("name").and_then(Value::as_str).unwrap_or("");
    if name.trim().is_empty() {
        errors.push("Scenario must have a name".to_string());
    }

    match document.get("steps") {
        None => errors.push("Scenario must have a steps array".to_string()),
        Some(Value::Array(steps)) => {
            if steps.is_empty() {
                errors.push("Scenario must have at least one step".to_string());
            }
            for (index, step) in steps.iter().enumerate() {
                check_step(index + 1, step, &mut errors);
            }
        }
        Some(_) => errors.push("Scenario steps must be an array".to_string()),
    }

    ValidationReport::from_errors(errors)
}

fn check_step(n: usize, step: &Value, errors: &mut Vec<String>) {
    let Some(fields) = step.as_object() else {
        errors.push(format!("Step {}: must be an object", n));
        return;
    };

    let explanation = fields.get("explanation").and_then(Value::as_str).unwrap_or("");
    if explanation.trim().is_empty() {
        errors.push(format!("Step {}: missing explanation", n));
    }

    if !fields.get("kind").is_some_and(Value::is_string) {
        errors.push(format!("Step {}: missing action kind", n));
    }

    if let Some(duration) = fields.get("duration") {
        if !duration.is_u64() {
            errors.push(format!("Step {}: duration must be a non-negative integer", n));
        }
    }
}
