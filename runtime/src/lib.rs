pub mod engine;
pub mod input;
pub mod observer;
mod scheduler;
pub mod state;

pub mod prelude {
    pub use crate::engine::{Engine, EngineBuilder, LoadOptions, WeakEngine};
    pub use crate::input::{
        EventOrigin, Key, KeyDisposition, KeyEvent, KeyboardBindings, spawn_keyboard_listener,
    };
    pub use crate::observer::{Callbacks, EngineObserver, NoopObserver};
    pub use crate::state::EngineSnapshot;
}

pub use engine::{Engine, EngineBuilder, LoadOptions, WeakEngine};
pub use input::{KeyEvent, KeyboardBindings, spawn_keyboard_listener};
pub use observer::{Callbacks, EngineObserver};
pub use state::EngineSnapshot;
