// Submission Configuration
// Run-wide options shared by executor backends, loadable from YAML

use crate::jobs::spec::DEFAULT_MEMORY_MB;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How the batch engine is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable, looked up on PATH unless it is a path
    pub program: String,
    /// Working directory the engine runs jobs in
    pub cwd: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "wr".to_string(),
            cwd: PathBuf::from("/tmp"),
        }
    }
}

/// Options for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Run-wide prefix for report labels
    pub job_name_prefix: Option<String>,
    /// Engine priority, zero when unset
    pub priority: Option<u32>,
    /// Log the engine command instead of running it
    pub interactive: bool,
    /// Memory for definitions that do not request any, in megabytes
    pub default_memory_mb: u64,
    pub engine: EngineConfig,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            job_name_prefix: None,
            priority: None,
            interactive: false,
            default_memory_mb: DEFAULT_MEMORY_MB,
            engine: EngineConfig::default(),
        }
    }
}

impl SubmitConfig {
    pub fn builder() -> SubmitConfigBuilder {
        SubmitConfigBuilder::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Priority passed to the engine
    pub fn effective_priority(&self) -> u32 {
        self.priority.unwrap_or(0)
    }
}

/// Builder for [`SubmitConfig`], starting from defaults or a loaded file
#[derive(Debug, Clone, Default)]
pub struct SubmitConfigBuilder {
    config: SubmitConfig,
}

impl SubmitConfigBuilder {
    pub fn from_config(config: SubmitConfig) -> Self {
        Self { config }
    }

    pub fn job_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.job_name_prefix = Some(prefix.into());
        self
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.config.priority = Some(priority);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.config.interactive = interactive;
        self
    }

    pub fn default_memory_mb(mut self, megabytes: u64) -> Self {
        self.config.default_memory_mb = megabytes;
        self
    }

    pub fn engine_program(mut self, program: impl Into<String>) -> Self {
        self.config.engine.program = program.into();
        self
    }

    pub fn engine_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.config.engine.cwd = cwd.into();
        self
    }

    pub fn build(self) -> SubmitConfig {
        self.config
    }
}
