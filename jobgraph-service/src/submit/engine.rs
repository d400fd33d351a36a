// Batch Engine Command
// Builds and runs the engine's `add` invocation for a persisted job file

use crate::error::SubmitError;
use crate::jobs::spec::shell_quote;
use crate::submit::config::SubmitConfig;

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Disk budget override
const DISK: u32 = 0;
/// Resource override level
const OVERRIDE_LEVEL: u32 = 2;
/// Automatic retries by the engine
const RETRIES: u32 = 0;

/// A fully-specified engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    /// `<program> add --cwd <dir> --disk 0 --override 2 --priority <p> --retries 0 -f <file>`
    pub fn add(config: &SubmitConfig, records_path: &Path) -> Self {
        let args = vec![
            "add".to_string(),
            "--cwd".to_string(),
            config.engine.cwd.to_string_lossy().into_owned(),
            "--disk".to_string(),
            DISK.to_string(),
            "--override".to_string(),
            OVERRIDE_LEVEL.to_string(),
            "--priority".to_string(),
            config.effective_priority().to_string(),
            "--retries".to_string(),
            RETRIES.to_string(),
            "-f".to_string(),
            records_path.to_string_lossy().into_owned(),
        ];

        Self {
            program: config.engine.program.clone(),
            args,
        }
    }

    /// Run the command to completion. Any exit other than zero is an error.
    pub async fn run(&self) -> Result<(), SubmitError> {
        let program = which::which(&self.program).map_err(|source| SubmitError::EngineNotFound {
            program: self.program.clone(),
            source,
        })?;
        debug!(program = %program.display(), "resolved batch engine");

        let output = Command::new(&program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!(target: "jobgraph_service::engine", "{}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!(target: "jobgraph_service::engine", "{}", line);
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(SubmitError::Submission {
                code: output.status.code(),
            })
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_command_line() {
        let config = SubmitConfig::builder().priority(7).build();
        let command = EngineCommand::add(&config, Path::new("/stage/commands4jobs.jsonl"));

        assert_eq!(
            command.to_string(),
            "wr add --cwd /tmp --disk 0 --override 2 --priority 7 --retries 0 -f /stage/commands4jobs.jsonl"
        );
    }

    #[test]
    fn test_priority_defaults_to_zero() {
        let config = SubmitConfig::default();
        let command = EngineCommand::add(&config, Path::new("/f"));
        let at = command.args.iter().position(|a| a == "--priority").unwrap();
        assert_eq!(command.args[at + 1], "0");
    }

    #[tokio::test]
    async fn test_run_success() {
        let config = SubmitConfig::builder().engine_program("true").build();
        let command = EngineCommand::add(&config, Path::new("/f"));
        command.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_failure_carries_status() {
        let config = SubmitConfig::builder().engine_program("false").build();
        let command = EngineCommand::add(&config, Path::new("/f"));
        match command.run().await {
            Err(SubmitError::Submission { code }) => assert_eq!(code, Some(1)),
            other => panic!("expected Submission error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let config = SubmitConfig::builder()
            .engine_program("jobgraph-no-such-engine")
            .build();
        let command = EngineCommand::add(&config, Path::new("/f"));
        let err = command.run().await.unwrap_err();
        assert!(matches!(err, SubmitError::EngineNotFound { .. }));
    }
}
