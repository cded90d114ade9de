use std::sync::Arc;
use std::time::Duration;
use walkthrough::core::dsl::{MessageKind, Position};
use walkthrough::prelude::*;

fn context() -> (StepContext, Arc<MemoryLog>, Arc<MemoryBoard>) {
    let log = Arc::new(MemoryLog::new());
    let board = Arc::new(MemoryBoard::new());
    let positions = StaticPositions::new()
        .with("client", 0.0, 0.0)
        .with("api", 200.0, 0.0)
        .with("redis", 200.0, 150.0);
    let context = StepContext::new(log.clone(), board.clone()).with_positions(Arc::new(positions));
    (context, log, board)
}

#[tokio::test(start_paused = true)]
async fn test_cache_aside_plays_to_completion() {
    let (context, log, board) = context();
    let builder = create_step_builder(context);
    let scenario = create_scenario(
        "Cache Aside",
        Some("Read-through on a cold cache"),
        vec![
            builder.request_step("client", "api", "GET /users/1", "Client asks for a user"),
            builder.cache_check_step("api", "redis", "user:1", "API checks Redis"),
            builder.cache_miss_step("redis", "api", "user:1", "Nothing cached yet"),
            builder.response_step("api", "client", "200 OK", "API answers"),
            builder.cleanup_step("Clear the board"),
        ],
        None,
    )
    .unwrap();
    assert!(validate_scenario(&scenario).valid);

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let done_tx = std::sync::Mutex::new(Some(done_tx));
    let callbacks = Callbacks::new().scenario_complete(move || {
        if let Some(tx) = done_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
    });
    let engine = Engine::new(EngineConfig::default(), callbacks).unwrap();
    engine.load(scenario, LoadOptions::playing()).await;

    assert_eq!(board.len(), 1);
    let first = &board.messages()[0];
    assert_eq!(first.kind, MessageKind::Request);
    assert_eq!(first.to_position, Some(Position::new(200.0, 0.0)));

    tokio::time::timeout(Duration::from_secs(30), done_rx)
        .await
        .unwrap()
        .unwrap();

    assert!(engine.is_complete());
    assert!(board.is_empty());
    assert_eq!(
        log.messages(),
        vec![
            "client → api: GET /users/1",
            "api checking redis for key 'user:1'",
            "Cache MISS for 'user:1'",
            "client ← api: 200 OK",
            "Cleared message flow",
        ]
    );
}

#[tokio::test]
async fn test_manifest_drives_manual_playback() {
    let manifest = ScenarioManifest::from_json_str(
        r#"{
            "name": "Events",
            "steps": [
                { "kind": "publish_event", "publisher": "orders", "broker": "kafka",
                  "event": "OrderPlaced", "explanation": "Orders publishes" },
                { "kind": "note", "message": "Consumers pick it up", "explanation": "Fan out" }
            ]
        }"#,
    )
    .unwrap();
    let (context, log, _board) = context();
    let builder = create_step_builder(context.with_delay(create_speed_delay(1000.0)));
    let scenario = manifest.build(&builder).unwrap();

    let engine = Engine::builder().build().unwrap();
    engine.load(scenario, LoadOptions::default()).await;
    engine.go_to_next_step().await;

    assert_eq!(engine.current_step(), 2);
    assert_eq!(engine.scenario_name(), "Events");
    assert_eq!(
        log.messages(),
        vec!["orders published 'OrderPlaced' to kafka", "Consumers pick it up"]
    );
    let json = serde_json::to_value(engine.timeline()).unwrap();
    assert_eq!(json["events"][0]["event"], "scenario_loaded");
}
