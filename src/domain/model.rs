use crate::utils::error::EtlError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Column names taken from the first line of a CSV source.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    columns: csv::StringRecord,
}

impl Header {
    pub fn new(columns: csv::StringRecord) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> csv::StringRecordIter<'_> {
        self.columns.iter()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.columns.get(index)
    }
}

/// One data row keyed by column name. Keys keep header order and every
/// value is a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.data
            .insert(name.to_string(), Value::String(value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// How serialized records are framed inside one output object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line, each terminated by `\n`.
    #[default]
    Ndjson,
    /// A single JSON array: `[`, comma separated records, `]`.
    JsonArray,
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            "json-array" | "array" => Ok(OutputFormat::JsonArray),
            other => Err(EtlError::InvalidConfigValueError {
                field: "output_format".to_string(),
                value: other.to_string(),
                reason: "Expected one of: ndjson, json-array".to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::JsonArray => write!(f, "json-array"),
        }
    }
}

/// Reference to one object delivered by a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeStats {
    pub records: usize,
    pub blank_lines: usize,
}

/// Result of transcoding one source object into its scratch file.
#[derive(Debug)]
pub struct TransformOutcome {
    pub bucket: String,
    pub source_key: String,
    pub scratch_path: PathBuf,
    pub result: Result<TranscodeStats, EtlError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStatus {
    Uploaded,
    TransformFailed,
    UploadFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectReport {
    pub source_key: String,
    pub destination_key: Option<String>,
    pub records: usize,
    pub status: ObjectStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub objects: Vec<ObjectReport>,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn uploaded(&self) -> usize {
        self.count(ObjectStatus::Uploaded)
    }

    pub fn failed(&self) -> usize {
        self.objects.len() - self.uploaded()
    }

    pub fn records_processed(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| o.status == ObjectStatus::Uploaded)
            .map(|o| o.records)
            .sum()
    }

    fn count(&self, status: ObjectStatus) -> usize {
        self.objects.iter().filter(|o| o.status == status).count()
    }
}
