// Staging
// Where job logs go and where the job records are persisted for the engine

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the persisted job records inside a staging directory
pub const RECORDS_FILE_NAME: &str = "commands4jobs.jsonl";

/// Storage the submission pipeline writes through
pub trait Staging: Send + Sync {
    /// Directory the logs of `function`'s jobs are written to
    fn log_dir(&self, function: &str) -> io::Result<PathBuf>;

    /// Persist job records, one per line, replacing earlier contents
    fn save_records(&self, records: &[String]) -> io::Result<()>;

    /// Path the records are persisted to
    fn records_file_path(&self) -> PathBuf;
}

/// Staging rooted in one directory:
/// `<root>/logs/<function>/` for logs and `<root>/commands4jobs.jsonl`
/// for records.
#[derive(Debug, Clone)]
pub struct DirStaging {
    root: PathBuf,
}

impl DirStaging {
    /// Create the root directory if needed and resolve it to an absolute path
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Staging for DirStaging {
    fn log_dir(&self, function: &str) -> io::Result<PathBuf> {
        let dir = self.root.join("logs").join(function);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn save_records(&self, records: &[String]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(self.records_file_path())?);
        for record in records {
            writer.write_all(record.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    fn records_file_path(&self) -> PathBuf {
        self.root.join(RECORDS_FILE_NAME)
    }
}
