//! Shared collaborators that builder-generated actions act upon.
//!
//! The rendering layer supplies real implementations (an on-screen log, an
//! arrow canvas, a layout). The in-memory versions here back tests and the
//! CLI player.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Collects entries in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemoryLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Forwards entries to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "walkthrough::log", "{}", message),
            LogLevel::Warning => tracing::warn!(target: "walkthrough::log", "{}", message),
            LogLevel::Success => tracing::info!(target: "walkthrough::log", success = true, "{}", message),
            LogLevel::Info => tracing::info!(target: "walkthrough::log", "{}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where a named service sits on screen.
pub trait PositionLookup: Send + Sync {
    fn position(&self, service: &str) -> Option<Position>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticPositions {
    positions: HashMap<String, Position>,
}

impl StaticPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, service: impl Into<String>, x: f64, y: f64) -> Self {
        self.positions.insert(service.into(), Position::new(x, y));
        self
    }
}

impl From<HashMap<String, Position>> for StaticPositions {
    fn from(positions: HashMap<String, Position>) -> Self {
        Self { positions }
    }
}

impl PositionLookup for StaticPositions {
    fn position(&self, service: &str) -> Option<Position> {
        self.positions.get(service).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Request,
    Response,
    CacheCheck,
    CacheHit,
    CacheMiss,
    Event,
}

/// One arrow travelling between two services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMessage {
    pub id: Uuid,
    pub kind: MessageKind,
    pub from: String,
    pub to: String,
    pub label: String,
    pub from_position: Option<Position>,
    pub to_position: Option<Position>,
}

pub trait MessageBoard: Send + Sync {
    fn push(&self, message: FlowMessage);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryBoard {
    messages: Mutex<Vec<FlowMessage>>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<FlowMessage> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MessageBoard for MemoryBoard {
    fn push(&self, message: FlowMessage) {
        self.messages.lock().push(message);
    }

    fn clear(&self) {
        self.messages.lock().clear();
    }
}

/// Scale `ms` by a speed multiplier.
///
/// Degenerate multipliers (zero, negative, NaN) produce a zero wait instead
/// of a panic; callers that care validate the multiplier up front.
pub fn scale_duration(ms: u64, speed_multiplier: f64) -> Duration {
    Duration::try_from_secs_f64(ms as f64 / 1000.0 / speed_multiplier).unwrap_or(Duration::ZERO)
}

/// A delay function whose waits are divided by a speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedDelay {
    speed_multiplier: f64,
}

impl SpeedDelay {
    pub fn new(speed_multiplier: f64) -> Self {
        Self { speed_multiplier }
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn scaled(&self, ms: u64) -> Duration {
        scale_duration(ms, self.speed_multiplier)
    }

    pub async fn wait(&self, ms: u64) {
        tokio::time::sleep(self.scaled(ms)).await;
    }
}

impl Default for SpeedDelay {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Everything a builder-generated action needs.
#[derive(Clone)]
pub struct StepContext {
    pub log: Arc<dyn LogSink>,
    pub messages: Arc<dyn MessageBoard>,
    pub delay: SpeedDelay,
    pub positions: Arc<dyn PositionLookup>,
}

impl StepContext {
    pub fn new(log: Arc<dyn LogSink>, messages: Arc<dyn MessageBoard>) -> Self {
        Self {
            log,
            messages,
            delay: SpeedDelay::default(),
            positions: Arc::new(StaticPositions::new()),
        }
    }

    pub fn with_delay(mut self, delay: SpeedDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_positions(mut self, positions: Arc<dyn PositionLookup>) -> Self {
        self.positions = positions;
        self
    }
}
