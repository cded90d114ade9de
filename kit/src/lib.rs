//! Walkthrough facade crate.
//!
//! Re-exports the definition layer (`walkthrough-core`) and the execution
//! engine (`walkthrough-runtime`) behind a single entry point.
//!
//! ```rust,ignore
//! use walkthrough::prelude::*;
//!
//! let context = StepContext::new(Arc::new(TracingLog), Arc::new(MemoryBoard::default()));
//! let builder = create_step_builder(context);
//! let scenario = create_scenario(
//!     "Cache Aside",
//!     None,
//!     vec![
//!         builder.request_step("client", "api", "GET /users/1", "Client asks for a user"),
//!         builder.cache_check_step("api", "redis", "user:1", "API checks the cache"),
//!     ],
//!     None,
//! )?;
//!
//! let engine = Engine::new(EngineConfig::default(), Callbacks::new())?;
//! engine.load(scenario, LoadOptions::playing()).await;
//! ```

pub use walkthrough_core as core;
pub use walkthrough_runtime as runtime;

pub use walkthrough_core::{EngineConfig, Scenario, Step, StepFailure};
pub use walkthrough_runtime::{Callbacks, Engine, EngineObserver, EngineSnapshot, LoadOptions};

pub mod prelude {
    pub use walkthrough_core::prelude::*;
    pub use walkthrough_runtime::prelude::*;
}
