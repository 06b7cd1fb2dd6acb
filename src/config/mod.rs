pub mod storage;

use crate::core::ConfigProvider;
use crate::domain::model::OutputFormat;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use std::env;
use std::path::{Path, PathBuf};

pub use storage::S3Settings;

pub const DEFAULT_INPUT_SEGMENT: &str = "inputs";
pub const DEFAULT_OUTPUT_SEGMENT: &str = "outputs";

/// Settings for the conversion itself, independent of the storage backend.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub scratch_dir: PathBuf,
    pub output_format: OutputFormat,
    pub input_segment: String,
    pub output_segment: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scratch_dir: env::temp_dir(),
            output_format: OutputFormat::default(),
            input_segment: DEFAULT_INPUT_SEGMENT.to_string(),
            output_segment: DEFAULT_OUTPUT_SEGMENT.to_string(),
        }
    }
}

impl ConvertConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the config from a variable lookup. Unset or empty variables
    /// keep their defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            scratch_dir: var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            output_format: match var("OUTPUT_FORMAT") {
                Some(value) => value.parse()?,
                None => defaults.output_format,
            },
            input_segment: var("INPUT_SEGMENT").unwrap_or(defaults.input_segment),
            output_segment: var("OUTPUT_SEGMENT").unwrap_or(defaults.output_segment),
        })
    }
}

impl ConfigProvider for ConvertConfig {
    fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    fn input_segment(&self) -> &str {
        &self.input_segment
    }

    fn output_segment(&self) -> &str {
        &self.output_segment
    }
}

impl Validate for ConvertConfig {
    fn validate(&self) -> Result<()> {
        validate_path("scratch_dir", &self.scratch_dir.to_string_lossy())?;
        validate_non_empty_string("input_segment", &self.input_segment)?;
        validate_non_empty_string("output_segment", &self.output_segment)?;

        tracing::info!(
            "Convert configuration validated (format: {}, scratch: {})",
            self.output_format,
            self.scratch_dir.display()
        );
        Ok(())
    }
}
