// Job Spec Builder
// Converts job definitions into records for the batch engine

use crate::error::SubmitError;
use crate::jobs::definition::JobDefinition;
use crate::submit::config::SubmitConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Memory requested when a definition does not say, in megabytes
pub const DEFAULT_MEMORY_MB: u64 = 2000;

/// Unit suffix appended to every memory value
pub const MEMORY_UNIT: &str = "M";

const REPORT_SEPARATOR: &str = "-";
const LOG_EXTENSION: &str = "out";

/// One job as the batch engine sees it.
///
/// Serialized as a single JSON object per line. `cpus` and `deps` are left
/// out entirely when not set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendJobSpec {
    pub memory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
    pub dep_grps: Vec<String>,
    pub rep_grp: String,
}

impl BackendJobSpec {
    /// Canonical single-line record
    pub fn to_record(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Builds [`BackendJobSpec`]s for one submission
#[derive(Debug, Clone)]
pub struct JobSpecBuilder {
    job_name_prefix: Option<String>,
    default_memory_mb: u64,
}

impl JobSpecBuilder {
    pub fn new() -> Self {
        Self {
            job_name_prefix: None,
            default_memory_mb: DEFAULT_MEMORY_MB,
        }
    }

    pub fn from_config(config: &SubmitConfig) -> Self {
        Self {
            job_name_prefix: config.job_name_prefix.clone(),
            default_memory_mb: config.default_memory_mb,
        }
    }

    /// Prefix every report label with a run-wide name
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.job_name_prefix = Some(prefix.into());
        self
    }

    pub fn with_default_memory(mut self, megabytes: u64) -> Self {
        self.default_memory_mb = megabytes;
        self
    }

    /// Build the engine record for one definition of `function`.
    ///
    /// `deps` are the upstream group ids; an empty slice yields a record
    /// without a `deps` field.
    pub fn build(
        &self,
        definition: &JobDefinition,
        function: &str,
        log_dir: &Path,
        deps: &[String],
        group_id: &str,
    ) -> Result<BackendJobSpec, SubmitError> {
        let memory = format!(
            "{}{}",
            definition.memory.unwrap_or(self.default_memory_mb),
            MEMORY_UNIT
        );
        let cpus = definition.cpu_count()?;
        let log_path = absolute(log_dir)?.join(log_file_name(definition, function));

        Ok(BackendJobSpec {
            memory,
            cpus,
            cmd: wrap_command(&definition.command, &log_path),
            deps: (!deps.is_empty()).then(|| deps.to_vec()),
            dep_grps: vec![group_id.to_string()],
            rep_grp: self.report_label(definition, function),
        })
    }

    /// `[prefix-]identifier-function`
    pub fn report_label(&self, definition: &JobDefinition, function: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        parts.extend(self.job_name_prefix.as_deref());
        parts.push(&definition.identifier);
        parts.push(function);
        parts.join(REPORT_SEPARATOR)
    }
}

impl Default for JobSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `function.timestamp.suffix.out`
pub fn log_file_name(definition: &JobDefinition, function: &str) -> String {
    format!(
        "{}.{}.{}.{}",
        function,
        definition.run_tag(),
        definition.log_suffix(),
        LOG_EXTENSION
    )
}

fn absolute(dir: &Path) -> Result<PathBuf, SubmitError> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

/// Wrap a command so stdout and stderr both land in `log_path` while the
/// command's own exit status is what the shell reports.
///
/// The command is ended with a newline so a trailing comment or heredoc
/// cannot swallow the closing paren.
pub fn wrap_command(command: &str, log_path: &Path) -> String {
    format!(
        "set -o pipefail; ( {}\n) 2>&1 | tee {}",
        command,
        shell_quote(&log_path.to_string_lossy())
    )
}

/// Quote a word for a POSIX shell, leaving plain words untouched
pub(crate) fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+,@%".contains(c));

    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::definition::{Composition, ResourceValue};
    use chrono::{TimeZone, Utc};

    fn definition(identifier: &str) -> JobDefinition {
        JobDefinition::new(
            identifier,
            "samtools index in.bam",
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 5).unwrap(),
        )
    }

    #[test]
    fn test_default_memory() {
        let spec = JobSpecBuilder::new()
            .build(&definition("s1"), "index", Path::new("/logs"), &[], "g1")
            .unwrap();
        assert_eq!(spec.memory, "2000M");
    }

    #[test]
    fn test_explicit_memory() {
        let spec = JobSpecBuilder::new()
            .build(
                &definition("s1").with_memory(500),
                "index",
                Path::new("/logs"),
                &[],
                "g1",
            )
            .unwrap();
        assert_eq!(spec.memory, "500M");
    }

    #[test]
    fn test_cpus() {
        let builder = JobSpecBuilder::new();

        let spec = builder
            .build(&definition("s1"), "index", Path::new("/logs"), &[], "g1")
            .unwrap();
        assert_eq!(spec.cpus, None);

        let def = definition("s1").with_cpus(vec![ResourceValue::Number(2.0)]);
        let spec = builder
            .build(&def, "index", Path::new("/logs"), &[], "g1")
            .unwrap();
        assert_eq!(spec.cpus, Some(2));

        let def = definition("s1").with_cpus(vec![ResourceValue::Text("two".into())]);
        let err = builder
            .build(&def, "index", Path::new("/logs"), &[], "g1")
            .unwrap_err();
        assert!(matches!(err, SubmitError::ResourceParse { .. }));
    }

    #[test]
    fn test_dependency_fields() {
        let builder = JobSpecBuilder::new();

        let spec = builder
            .build(&definition("s1"), "index", Path::new("/logs"), &[], "own")
            .unwrap();
        assert_eq!(spec.deps, None);
        assert_eq!(spec.dep_grps, vec!["own"]);

        let deps = vec!["up1".to_string(), "up2".to_string()];
        let spec = builder
            .build(&definition("s1"), "index", Path::new("/logs"), &deps, "own")
            .unwrap();
        assert_eq!(spec.deps, Some(deps));
        assert_eq!(spec.dep_grps, vec!["own"]);
    }

    #[test]
    fn test_report_label() {
        let def = definition("sample7");
        assert_eq!(
            JobSpecBuilder::new().report_label(&def, "align"),
            "sample7-align"
        );
        assert_eq!(
            JobSpecBuilder::new()
                .with_prefix("run42")
                .report_label(&def, "align"),
            "run42-sample7-align"
        );
    }

    #[test]
    fn test_log_file_name() {
        let def = definition("s1");
        assert_eq!(log_file_name(&def, "index"), "index.20240301103005.s1.out");

        let def = def.with_composition(Composition::new("NA12878").with_library("lib2"));
        assert_eq!(
            log_file_name(&def, "index"),
            "index.20240301103005.NA12878_lib2.out"
        );
    }

    #[test]
    fn test_wrapped_command() {
        let spec = JobSpecBuilder::new()
            .build(&definition("s1"), "index", Path::new("/logs/index"), &[], "g1")
            .unwrap();
        assert_eq!(
            spec.cmd,
            "set -o pipefail; ( samtools index in.bam\n) 2>&1 | tee /logs/index/index.20240301103005.s1.out"
        );
    }

    fn run_wrapped(command: &str, log_dir: &Path) -> (Option<i32>, String) {
        let def = JobDefinition::new(
            "s1",
            command,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 5).unwrap(),
        );
        let spec = JobSpecBuilder::new()
            .build(&def, "index", log_dir, &[], "g1")
            .unwrap();
        let status = std::process::Command::new("bash")
            .arg("-c")
            .arg(&spec.cmd)
            .stdout(std::process::Stdio::null())
            .status()
            .unwrap();
        let log = std::fs::read_to_string(log_dir.join(log_file_name(&def, "index")))
            .unwrap_or_default();
        (status.code(), log)
    }

    #[test]
    fn test_wrapped_command_tolerates_trailing_comment() {
        let temp = tempfile::tempdir().unwrap();
        let (code, _) = run_wrapped("true # note", temp.path());
        assert_eq!(code, Some(0));
    }

    #[test]
    fn test_wrapped_command_keeps_exit_status_and_output() {
        let temp = tempfile::tempdir().unwrap();
        let (code, log) = run_wrapped("echo out; echo err >&2; exit 3", temp.path());
        assert_eq!(code, Some(3));
        assert_eq!(log, "out\nerr\n");
    }

    #[test]
    fn test_relative_log_dir_is_made_absolute() {
        let spec = JobSpecBuilder::new()
            .build(&definition("s1"), "index", Path::new("logs"), &[], "g1")
            .unwrap();
        let log_path = spec.cmd.rsplit(" | tee ").next().unwrap().trim_matches('\'');
        assert!(Path::new(log_path).is_absolute());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/tmp/a.out"), "/tmp/a.out");
        assert_eq!(shell_quote("/tmp/my logs/a.out"), "'/tmp/my logs/a.out'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_record_omits_absent_fields() {
        let spec = BackendJobSpec {
            memory: "2000M".to_string(),
            cpus: None,
            cmd: "true".to_string(),
            deps: None,
            dep_grps: vec!["g1".to_string()],
            rep_grp: "s1-index".to_string(),
        };
        assert_eq!(
            spec.to_record().unwrap(),
            r#"{"memory":"2000M","cmd":"true","dep_grps":["g1"],"rep_grp":"s1-index"}"#
        );
    }
}
