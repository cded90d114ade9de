//! Terminal playback

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use walkthrough::prelude::*;

pub struct PlayOptions {
    pub manifest: PathBuf,
    pub speed: Option<f64>,
    pub auto: bool,
    pub config: Option<PathBuf>,
}

/// Prints log entries as they happen.
struct ConsoleLog;

impl LogSink for ConsoleLog {
    fn log(&self, level: LogLevel, message: &str) {
        let marker = match level {
            LogLevel::Info => "·",
            LogLevel::Success => "✅",
            LogLevel::Warning => "⚠️ ",
            LogLevel::Error => "❌",
        };
        println!("      {} {}", marker, message);
    }
}

/// Resolve the engine config: file, then the manifest's suggested speed,
/// then `WALKTHROUGH_SPEED`, then `--speed`.
fn resolve_config(options: &PlayOptions, manifest: &ScenarioManifest) -> Result<EngineConfig> {
    let mut config = match &options.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(speed) = manifest.speed {
        config.speed_multiplier = speed;
    }
    let mut config = config.with_env_overrides();
    if let Some(speed) = options.speed {
        config.speed_multiplier = speed;
    }
    config.validate().context("Invalid playback speed")?;
    Ok(config)
}

pub async fn run_play_command(options: PlayOptions) -> Result<()> {
    let manifest = ScenarioManifest::from_path(&options.manifest)
        .with_context(|| format!("Failed to load manifest: {}", options.manifest.display()))?;
    let config = resolve_config(&options, &manifest)?;

    let context = StepContext::new(Arc::new(ConsoleLog), Arc::new(MemoryBoard::new()))
        .with_delay(SpeedDelay::new(config.speed_multiplier))
        .with_positions(Arc::new(manifest.static_positions()));
    let scenario = manifest
        .build(&StepBuilder::new(context))
        .context("Failed to build scenario")?;

    let report = validate_scenario(&scenario);
    for error in &report.errors {
        println!("⚠️  {}", error);
    }
    if scenario.is_empty() {
        anyhow::bail!("Scenario '{}' has no steps to play", scenario.name);
    }

    let total = scenario.step_count();
    let finished = Arc::new(Notify::new());
    let callbacks = {
        let finished = finished.clone();
        Callbacks::new()
            .scenario_start(|name| println!("▶ {}", name))
            .step_change(move |n, step| println!("  [{}/{}] {}", n, total, step.explanation))
            .step_error(|n, failure| println!("  ❌ step {}: {}", n, failure))
            .scenario_complete(move || {
                println!("🏁 Scenario complete");
                finished.notify_one();
            })
    };

    let engine = Engine::new(config, callbacks)?;
    if options.auto {
        play_auto(&engine, scenario, &finished).await
    } else {
        play_interactive(&engine, scenario).await
    }
}

async fn play_auto(engine: &Engine, scenario: Scenario, finished: &Notify) -> Result<()> {
    engine.load(scenario, LoadOptions::playing()).await;
    // A single-step scenario is already at its end once loaded.
    if !engine.is_complete() {
        tokio::select! {
            _ = finished.notified() => {}
            _ = tokio::signal::ctrl_c() => println!("Interrupted"),
        }
    }
    engine.stop_scenario();
    Ok(())
}

async fn play_interactive(engine: &Engine, scenario: Scenario) -> Result<()> {
    println!("Commands: <enter>/n next, p previous, space/auto toggle auto-play, r reset, q quit");
    engine.load(scenario, LoadOptions::default()).await;

    let (keys, events) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let listener = spawn_keyboard_listener(engine.clone(), events, cancel.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            "q" | "quit" => break,
            "r" | "reset" => {
                engine.reset_scenario().await;
                continue;
            }
            _ => {}
        }
        let event = if line.is_empty() {
            Some(KeyEvent::new(Key::ArrowRight))
        } else {
            KeyEvent::parse_command(&line)
        };
        match event {
            Some(event) => keys.send(event).await?,
            None => println!("Unknown command: {}", line.trim()),
        }
    }

    cancel.cancel();
    listener.await?;
    engine.stop_scenario();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(speed: Option<f64>) -> ScenarioManifest {
        ScenarioManifest {
            name: "Ping".into(),
            description: None,
            speed,
            positions: Default::default(),
            steps: Vec::new(),
        }
    }

    fn options(speed: Option<f64>) -> PlayOptions {
        PlayOptions {
            manifest: PathBuf::from("ping.json"),
            speed,
            auto: true,
            config: None,
        }
    }

    #[test]
    fn test_cli_speed_wins_over_manifest() {
        let config = resolve_config(&options(Some(3.0)), &manifest(Some(2.0))).unwrap();
        assert_eq!(config.speed_multiplier, 3.0);
    }

    #[test]
    fn test_invalid_cli_speed_is_rejected() {
        assert!(resolve_config(&options(Some(0.0)), &manifest(None)).is_err());
    }
}
