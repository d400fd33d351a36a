use jobgraph_service::{
    DirStaging, EngineCommand, Executor, FunctionDefinitions, FunctionGraph, JobDefinition,
    Staging, SubmitConfig, WrExecutor,
};

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::sync::{Arc, Mutex};

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

fn single_function() -> (FunctionGraph, FunctionDefinitions) {
    let mut graph = FunctionGraph::new();
    graph.add_function("qc").unwrap();

    let mut definitions = FunctionDefinitions::new();
    definitions.insert(
        "qc".into(),
        vec![JobDefinition::new(
            "s1",
            "fastqc s1.fq",
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        )],
    );
    (graph, definitions)
}

#[tokio::test]
async fn test_interactive_mode_logs_command_verbatim() {
    let (buffer, _guard) = capture();
    let temp = tempfile::tempdir().unwrap();
    let staging = DirStaging::new(temp.path()).unwrap();
    let (mut graph, definitions) = single_function();

    let config = SubmitConfig::builder()
        .interactive(true)
        .priority(30)
        .engine_program("jobgraph-no-such-engine")
        .build();
    let expected = EngineCommand::add(&config, &staging.records_file_path()).to_string();

    let report = WrExecutor::with_rng(config, StdRng::seed_from_u64(5))
        .execute(&mut graph, &definitions, &staging)
        .await
        .unwrap();

    assert!(!report.submitted);
    assert_eq!(report.command, expected);

    let logs = buffer.contents();
    assert!(logs.contains(&expected), "command missing from logs:\n{}", logs);
    assert!(logs.contains("interactive mode, not submitting"));
}

#[tokio::test]
async fn test_normal_mode_logs_command() {
    let (buffer, _guard) = capture();
    let temp = tempfile::tempdir().unwrap();
    let staging = DirStaging::new(temp.path()).unwrap();
    let (mut graph, definitions) = single_function();

    let config = SubmitConfig::builder().engine_program("true").build();
    let expected = EngineCommand::add(&config, &staging.records_file_path()).to_string();

    let report = WrExecutor::with_rng(config, StdRng::seed_from_u64(5))
        .execute(&mut graph, &definitions, &staging)
        .await
        .unwrap();

    assert!(report.submitted);

    let logs = buffer.contents();
    assert!(logs.contains(&expected), "command missing from logs:\n{}", logs);
    assert!(logs.contains("submitting jobs"));
    assert!(logs.contains("jobs submitted"));
}
