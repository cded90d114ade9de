use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use walkthrough_core::config::EngineConfig;
use walkthrough_core::step::Step;
use walkthrough_runtime::prelude::*;

fn timed_steps(durations: &[u64]) -> Vec<Step> {
    durations
        .iter()
        .enumerate()
        .map(|(i, ms)| Step::new(format!("step {}", i + 1)).with_duration(*ms))
        .collect()
}

fn completion_counter() -> (Callbacks, Arc<Mutex<usize>>) {
    let completions = Arc::new(Mutex::new(0));
    let counter = completions.clone();
    let callbacks = Callbacks::new().scenario_complete(move || *counter.lock() += 1);
    (callbacks, completions)
}

#[tokio::test(start_paused = true)]
async fn test_speed_scales_the_auto_advance() {
    let engine = Engine::builder().speed(2.0).build().unwrap();
    engine
        .load_scenario("Fast", timed_steps(&[1000, 1000]), LoadOptions::playing())
        .await;
    assert!(engine.has_pending_advance());

    sleep(Duration::from_millis(499)).await;
    assert_eq!(engine.current_step(), 1);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(engine.current_step(), 2);
    assert!(!engine.has_pending_advance());
}

#[tokio::test(start_paused = true)]
async fn test_auto_play_runs_to_completion_once() {
    let (callbacks, completions) = completion_counter();
    let engine = Engine::new(EngineConfig::default(), callbacks).unwrap();
    engine
        .load_scenario("Auto", timed_steps(&[100, 200, 300]), LoadOptions::playing())
        .await;

    sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.current_step(), 2);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(engine.current_step(), 3);
    assert!(engine.is_complete());
    // Auto-play stays on at the end but nothing is scheduled.
    assert!(engine.is_auto_playing());
    assert!(!engine.has_pending_advance());
    assert_eq!(*completions.lock(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_duration_comes_from_config() {
    let config = EngineConfig {
        default_step_duration_ms: 400,
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, NoopObserver).unwrap();
    let steps = vec![Step::new("a"), Step::new("b")];
    engine.load_scenario("Defaults", steps, LoadOptions::playing()).await;

    sleep(Duration::from_millis(399)).await;
    assert_eq!(engine.current_step(), 1);
    sleep(Duration::from_millis(2)).await;
    assert_eq!(engine.current_step(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_pause_cancels_pending_advance() {
    let engine = Engine::builder().build().unwrap();
    engine
        .load_scenario("Paused", timed_steps(&[500, 500]), LoadOptions::playing())
        .await;

    engine.pause_auto_play();
    assert!(!engine.has_pending_advance());

    sleep(Duration::from_secs(5)).await;
    assert_eq!(engine.current_step(), 1);

    engine.start_auto_play();
    sleep(Duration::from_millis(501)).await;
    assert_eq!(engine.current_step(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_manual_navigation_restarts_the_timer() {
    let engine = Engine::builder().build().unwrap();
    engine
        .load_scenario("Manual", timed_steps(&[1000, 1000, 1000, 1000]), LoadOptions::playing())
        .await;

    sleep(Duration::from_millis(900)).await;
    engine.go_to_step(3);

    // The old timer would have fired at 1000ms and moved us to step 2.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.current_step(), 3);

    sleep(Duration::from_millis(801)).await;
    assert_eq!(engine.current_step(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_speed_change_reschedules() {
    let engine = Engine::builder().build().unwrap();
    engine
        .load_scenario("Speedup", timed_steps(&[1000, 1000]), LoadOptions::playing())
        .await;

    engine.set_speed_multiplier(4.0).unwrap();
    assert!(engine.set_speed_multiplier(-1.0).is_err());
    assert_eq!(engine.speed_multiplier(), 4.0);

    sleep(Duration::from_millis(251)).await;
    assert_eq!(engine.current_step(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_advance() {
    let engine = Engine::builder().build().unwrap();
    engine
        .load_scenario("Stopped", timed_steps(&[100, 100]), LoadOptions::playing())
        .await;

    engine.stop_scenario();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(engine.current_step(), 0);
    assert!(!engine.has_pending_advance());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_engine_ends_the_timer() {
    let engine = Engine::builder().build().unwrap();
    engine
        .load_scenario("Dropped", timed_steps(&[100, 100]), LoadOptions::playing())
        .await;
    let weak = engine.downgrade();

    drop(engine);
    sleep(Duration::from_secs(1)).await;

    assert!(weak.upgrade().is_none());
}
