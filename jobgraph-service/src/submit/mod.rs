// Submit Module
// Configuration, staging, engine invocation and the executor tying them together

pub mod config;
pub mod engine;
pub mod executor;
pub mod staging;

// Re-export key types
pub use config::{ConfigError, EngineConfig, SubmitConfig, SubmitConfigBuilder};
pub use engine::EngineCommand;
pub use executor::{Executor, SubmitReport, WrExecutor};
pub use staging::{DirStaging, Staging, RECORDS_FILE_NAME};
