//! Shared plumbing for the galaxy command-line tools.

pub mod common;
pub mod config;
pub mod logging;

pub use common::{InputArgs, InputOpts, OutputArgs, SplitArgs, SplitModeArg};
pub use config::{ConfigError, GalaxyToolConfig};
pub use logging::init_tracing;
