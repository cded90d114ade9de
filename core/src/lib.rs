pub mod config;
pub mod dsl;
pub mod error;
pub mod manifest;
pub mod scenario;
pub mod step;
pub mod timeline;
pub mod validate;

pub use config::EngineConfig;
pub use error::{ConfigError, DefinitionError, StepFailure};
pub use scenario::Scenario;
pub use step::{DEFAULT_STEP_DURATION_MS, Step, StepAction, StepError, StepResult};
pub use timeline::{Timeline, TimelineEvent, Transition};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::dsl::{
        LogLevel, LogSink, MemoryBoard, MemoryLog, MessageBoard, PositionLookup, SpeedDelay,
        StaticPositions, StepBuilder, StepContext, TracingLog, create_scenario, create_speed_delay,
        create_step, create_step_builder,
    };
    pub use crate::error::{ConfigError, DefinitionError, StepFailure};
    pub use crate::manifest::ScenarioManifest;
    pub use crate::scenario::Scenario;
    pub use crate::step::{Metadata, Step, StepAction, StepError, StepResult, action_fn};
    pub use crate::timeline::{Timeline, TimelineEvent, Transition};
    pub use crate::validate::{ValidationReport, validate_definition, validate_scenario};
}
