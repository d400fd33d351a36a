// Job Definitions
// Immutable per-function units of work handed over by the pipeline layer

use crate::error::SubmitError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Job definitions keyed by the function that produced them
pub type FunctionDefinitions = BTreeMap<String, Vec<JobDefinition>>;

/// Timestamp layout used in log names and group ids
const RUN_TAG_FORMAT: &str = "%Y%m%d%H%M%S";

/// A resource hint as written by the pipeline layer: either a number or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceValue {
    Number(f64),
    Text(String),
}

impl ResourceValue {
    /// Truncate to a whole count, rejecting anything that is not a finite,
    /// non-negative number
    pub fn to_count(&self) -> Option<u32> {
        let value = match self {
            ResourceValue::Number(n) => *n,
            ResourceValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };

        if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
            Some(value.trunc() as u32)
        } else {
            None
        }
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceValue::Number(n) => write!(f, "{}", n),
            ResourceValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ResourceValue {
    fn from(value: f64) -> Self {
        ResourceValue::Number(value)
    }
}

impl From<&str> for ResourceValue {
    fn from(value: &str) -> Self {
        ResourceValue::Text(value.to_string())
    }
}

/// What a job was run on, used to label its log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub sample: String,
    #[serde(default)]
    pub library: Option<String>,
    #[serde(default)]
    pub lane: Option<String>,
}

impl Composition {
    pub fn new(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            library: None,
            lane: None,
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn with_lane(mut self, lane: impl Into<String>) -> Self {
        self.lane = Some(lane.into());
        self
    }

    /// `sample[_library][_lane]`
    pub fn label(&self) -> String {
        let mut parts = vec![self.sample.as_str()];
        parts.extend(self.library.as_deref());
        parts.extend(self.lane.as_deref());
        parts.join("_")
    }
}

/// One unit of work produced by a pipeline function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Unique name of the unit of work within a run
    pub identifier: String,
    /// Command line to execute
    pub command: String,
    /// Memory in megabytes
    #[serde(default)]
    pub memory: Option<u64>,
    /// Cpu hints; only the first element is used
    #[serde(default)]
    pub num_cpus: Option<Vec<ResourceValue>>,
    pub created_on: DateTime<Utc>,
    #[serde(default)]
    pub composition: Option<Composition>,
    /// Excluded definitions contribute no job
    #[serde(default)]
    pub excluded: bool,
    /// Consumed by the pipeline layer, carried here untouched
    #[serde(default)]
    pub immediate_mode: bool,
}

impl JobDefinition {
    pub fn new(
        identifier: impl Into<String>,
        command: impl Into<String>,
        created_on: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            command: command.into(),
            memory: None,
            num_cpus: None,
            created_on,
            composition: None,
            excluded: false,
            immediate_mode: false,
        }
    }

    pub fn with_memory(mut self, megabytes: u64) -> Self {
        self.memory = Some(megabytes);
        self
    }

    pub fn with_cpus(mut self, cpus: Vec<ResourceValue>) -> Self {
        self.num_cpus = Some(cpus);
        self
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = Some(composition);
        self
    }

    pub fn with_excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    /// Requested cpu count, if any.
    ///
    /// An empty hint list counts as no request.
    pub fn cpu_count(&self) -> Result<Option<u32>, SubmitError> {
        let Some(first) = self.num_cpus.as_ref().and_then(|cpus| cpus.first()) else {
            return Ok(None);
        };

        first
            .to_count()
            .map(Some)
            .ok_or_else(|| SubmitError::ResourceParse {
                identifier: self.identifier.clone(),
                value: first.to_string(),
            })
    }

    /// Label used to make log file names unique
    pub fn log_suffix(&self) -> String {
        match &self.composition {
            Some(composition) => composition.label(),
            None => self.identifier.clone(),
        }
    }

    /// Run-scoped identifier derived from the creation timestamp
    pub fn run_tag(&self) -> String {
        self.created_on.format(RUN_TAG_FORMAT).to_string()
    }
}
