// reslayer
// Priority-overlay resource resolution over layered content stores

pub mod cli;
pub mod config;
pub mod graphics;
pub mod io;
pub mod logging;
pub mod resource;
pub mod sound;

pub use cli::Cli;
pub use config::RegistryConfig;
pub use logging::LogLevel;
pub use resource::{PriorityTier, Registry, ResourceKind, ResourceValue};
