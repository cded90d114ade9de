use super::context::{FlowMessage, LogLevel, MessageKind, StepContext};
use super::create_step;
use crate::step::{Metadata, Step, StepResult, action_fn};
use std::future::Future;
use uuid::Uuid;

/// Time a message arrow takes to travel, before speed scaling.
pub const MESSAGE_TRAVEL_MS: u64 = 800;

/// Named constructors for recurring interaction shapes.
///
/// Every constructor is sugar over [`create_step`]: the result is an
/// ordinary [`Step`] whose action logs, draws and waits through the shared
/// [`StepContext`].
#[derive(Clone)]
pub struct StepBuilder {
    context: StepContext,
}

/// Arrow parameters captured by a message step's action.
#[derive(Clone)]
struct Hop {
    kind: MessageKind,
    from: String,
    to: String,
    label: String,
}

impl StepBuilder {
    pub fn new(context: StepContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &StepContext {
        &self.context
    }

    pub fn request_step(&self, from: &str, to: &str, label: &str, explanation: &str) -> Step {
        self.message_step(
            explanation,
            Hop::new(MessageKind::Request, from, to, label),
            LogLevel::Info,
            format!("{} → {}: {}", from, to, label),
        )
    }

    pub fn response_step(&self, from: &str, to: &str, label: &str, explanation: &str) -> Step {
        self.message_step(
            explanation,
            Hop::new(MessageKind::Response, from, to, label),
            LogLevel::Success,
            format!("{} ← {}: {}", to, from, label),
        )
    }

    pub fn cache_check_step(&self, service: &str, cache: &str, key: &str, explanation: &str) -> Step {
        self.message_step(
            explanation,
            Hop::new(MessageKind::CacheCheck, service, cache, &format!("GET {}", key)),
            LogLevel::Info,
            format!("{} checking {} for key '{}'", service, cache, key),
        )
    }

    pub fn cache_hit_step(&self, cache: &str, service: &str, key: &str, explanation: &str) -> Step {
        self.message_step(
            explanation,
            Hop::new(MessageKind::CacheHit, cache, service, "HIT"),
            LogLevel::Success,
            format!("Cache HIT for '{}'", key),
        )
    }

    pub fn cache_miss_step(&self, cache: &str, service: &str, key: &str, explanation: &str) -> Step {
        self.message_step(
            explanation,
            Hop::new(MessageKind::CacheMiss, cache, service, "MISS"),
            LogLevel::Warning,
            format!("Cache MISS for '{}'", key),
        )
    }

    pub fn publish_event_step(&self, publisher: &str, broker: &str, event: &str, explanation: &str) -> Step {
        self.message_step(
            explanation,
            Hop::new(MessageKind::Event, publisher, broker, event),
            LogLevel::Info,
            format!("{} published '{}' to {}", publisher, event, broker),
        )
    }

    /// Clear every arrow from the board.
    pub fn cleanup_step(&self, explanation: &str) -> Step {
        let ctx = self.context.clone();
        let action = action_fn(move || {
            let ctx = ctx.clone();
            async move {
                ctx.messages.clear();
                ctx.log.log(LogLevel::Info, "Cleared message flow");
                Ok(())
            }
        });
        create_step(explanation, Some(action), None, Some(category("cleanup")))
    }

    /// Wrap a caller-supplied action unchanged.
    pub fn custom_step<F, Fut>(&self, explanation: &str, action: F, duration_ms: Option<u64>) -> Step
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult> + Send + 'static,
    {
        create_step(explanation, Some(action_fn(action)), duration_ms, Some(category("custom")))
    }

    /// A step that only writes a log line.
    pub fn note_step(&self, explanation: &str, level: LogLevel, message: &str) -> Step {
        let ctx = self.context.clone();
        let message = message.to_string();
        let action = action_fn(move || {
            let ctx = ctx.clone();
            let message = message.clone();
            async move {
                ctx.log.log(level, &message);
                Ok(())
            }
        });
        create_step(explanation, Some(action), None, Some(category("note")))
    }

    fn message_step(&self, explanation: &str, hop: Hop, level: LogLevel, log_line: String) -> Step {
        let ctx = self.context.clone();
        let metadata = category(hop.kind_name());
        let action = action_fn(move || {
            let ctx = ctx.clone();
            let hop = hop.clone();
            let log_line = log_line.clone();
            async move {
                ctx.log.log(level, &log_line);
                ctx.messages.push(FlowMessage {
                    id: Uuid::new_v4(),
                    kind: hop.kind,
                    from_position: ctx.positions.position(&hop.from),
                    to_position: ctx.positions.position(&hop.to),
                    from: hop.from,
                    to: hop.to,
                    label: hop.label,
                });
                ctx.delay.wait(MESSAGE_TRAVEL_MS).await;
                Ok(())
            }
        });
        create_step(explanation, Some(action), None, Some(metadata))
    }
}

impl Hop {
    fn new(kind: MessageKind, from: &str, to: &str, label: &str) -> Self {
        Self {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            label: label.to_string(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::CacheCheck => "cache_check",
            MessageKind::CacheHit => "cache_hit",
            MessageKind::CacheMiss => "cache_miss",
            MessageKind::Event => "event",
        }
    }
}

fn category(name: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("category".to_string(), name.into());
    metadata
}
