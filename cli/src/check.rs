//! Manifest validation

use anyhow::{Context, Result};
use std::path::Path;
use walkthrough::core::manifest::ScenarioManifest;
use walkthrough::core::validate::{ValidationReport, validate_definition};

/// Validate a manifest file and print every problem found.
pub fn run_check_command(path: &Path) -> Result<()> {
    println!("Checking scenario manifest: {}", path.display());

    let report = check_manifest(path)?;
    if report.valid {
        println!("✅ Manifest is valid");
        return Ok(());
    }

    for error in &report.errors {
        println!("  ❌ {}", error);
    }
    anyhow::bail!("{} problem(s) found in {}", report.errors.len(), path.display());
}

/// Structural diagnostics first, then a typed parse to catch unknown step
/// kinds and misspelled fields.
pub fn check_manifest(path: &Path) -> Result<ValidationReport> {
    let document = ScenarioManifest::load_document(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    let mut report = validate_definition(&document);
    if report.valid {
        if let Err(e) = serde_json::from_value::<ScenarioManifest>(document) {
            report.valid = false;
            report.errors.push(format!("Manifest does not match the step schema: {}", e));
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manifest_file(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_toml_manifest() {
        let file = manifest_file(
            ".toml",
            r#"
name = "Ping"

[[steps]]
kind = "request"
from = "client"
to = "api"
label = "GET /ping"
explanation = "Client pings the API"
"#,
        );
        let report = check_manifest(file.path()).unwrap();
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn test_structural_errors_are_listed() {
        let file = manifest_file(".json", r#"{ "name": "", "steps": [ { "explanation": "x" } ] }"#);
        let report = check_manifest(file.path()).unwrap();
        assert!(!report.valid);
        assert!(report.errors.contains(&"Scenario must have a name".to_string()));
        assert!(report.errors.contains(&"Step 1: missing action kind".to_string()));
    }

    #[test]
    fn test_unknown_kind_fails_typed_parse() {
        let file = manifest_file(
            ".json",
            r#"{ "name": "Odd", "steps": [ { "kind": "teleport", "explanation": "?" } ] }"#,
        );
        let report = check_manifest(file.path()).unwrap();
        assert!(!report.valid);
        assert!(report.errors[0].starts_with("Manifest does not match the step schema"));
    }

    #[test]
    fn test_bundled_scenarios_are_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for name in ["cache-aside.toml", "order-events.json"] {
            let report = check_manifest(&dir.join(name)).unwrap();
            assert!(report.valid, "{}: {:?}", name, report.errors);
        }
    }

    #[test]
    fn test_unsupported_extension_is_an_error() {
        let file = manifest_file(".yaml", "name: nope");
        assert!(check_manifest(file.path()).is_err());
    }
}
