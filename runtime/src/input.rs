//! Keyboard bindings for a running scenario.
//!
//! Right arrow advances, left arrow steps back and space toggles auto-play.
//! Bindings are only live while the engine reports `is_running`, and keys
//! typed into a text field never reach the engine.

use crate::engine::Engine;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Space,
    Other(String),
}

/// Where the key press originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrigin {
    #[default]
    Document,
    TextInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub origin: EventOrigin,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            origin: EventOrigin::Document,
        }
    }

    pub fn from_text_input(key: Key) -> Self {
        Self {
            key,
            origin: EventOrigin::TextInput,
        }
    }

    /// Map a terminal command word onto a key press.
    pub fn parse_command(input: &str) -> Option<Self> {
        if input == " " {
            return Some(Self::new(Key::Space));
        }
        let key = match input.trim().to_ascii_lowercase().as_str() {
            "n" | "next" | "right" => Key::ArrowRight,
            "p" | "prev" | "previous" | "left" => Key::ArrowLeft,
            "space" | "auto" => Key::Space,
            _ => return None,
        };
        Some(Self::new(key))
    }
}

/// Whether the caller should suppress the key's default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled,
    Ignored,
}

#[derive(Clone)]
pub struct KeyboardBindings {
    engine: Engine,
}

impl KeyboardBindings {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn dispatch(&self, event: &KeyEvent) -> KeyDisposition {
        if event.origin == EventOrigin::TextInput || !self.engine.is_running() {
            return KeyDisposition::Ignored;
        }
        match event.key {
            Key::ArrowRight => {
                // Not awaited: a second press during a slow action must hit
                // the reentrancy guard instead of waiting its turn.
                let Ok(runtime) = Handle::try_current() else {
                    tracing::warn!("No tokio runtime on this thread; ignoring advance key");
                    return KeyDisposition::Ignored;
                };
                let engine = self.engine.clone();
                runtime.spawn(async move { engine.go_to_next_step().await });
            }
            Key::ArrowLeft => self.engine.go_to_previous_step(),
            Key::Space => self.engine.toggle_auto_play(),
            Key::Other(_) => return KeyDisposition::Ignored,
        }
        tracing::trace!(key = ?event.key, "Key handled");
        KeyDisposition::Handled
    }
}

/// Feed `events` to the engine while it is running.
///
/// The task ends when `cancel` fires, the event channel closes or the
/// engine is dropped. Events arriving while the engine is idle are dropped.
pub fn spawn_keyboard_listener(
    engine: Engine,
    mut events: mpsc::Receiver<KeyEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut snapshots = engine.subscribe();
    let weak = engine.downgrade();
    drop(engine);

    tokio::spawn(async move {
        let mut installed = false;
        loop {
            let running = snapshots.borrow_and_update().is_running;
            if running != installed {
                installed = running;
                if installed {
                    tracing::debug!("Keyboard bindings installed");
                } else {
                    tracing::debug!("Keyboard bindings removed");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if !installed {
                        continue;
                    }
                    // Strong only for this dispatch; the listener must not
                    // keep the engine alive.
                    let Some(engine) = weak.upgrade() else { break };
                    KeyboardBindings::new(engine).dispatch(&event);
                }
            }
        }
        tracing::debug!("Keyboard listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_words() {
        assert_eq!(KeyEvent::parse_command("n").map(|e| e.key), Some(Key::ArrowRight));
        assert_eq!(KeyEvent::parse_command(" Next ").map(|e| e.key), Some(Key::ArrowRight));
        assert_eq!(KeyEvent::parse_command("left").map(|e| e.key), Some(Key::ArrowLeft));
        assert_eq!(KeyEvent::parse_command(" ").map(|e| e.key), Some(Key::Space));
        assert_eq!(KeyEvent::parse_command("auto").map(|e| e.key), Some(Key::Space));
        assert_eq!(KeyEvent::parse_command("q"), None);
    }

    #[test]
    fn test_parsed_commands_come_from_the_document() {
        let event = KeyEvent::parse_command("p").unwrap();
        assert_eq!(event.origin, EventOrigin::Document);
    }
}
