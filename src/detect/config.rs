//! YAML engine configuration.
//!
//! ```yaml
//! joint:
//!   program: python3
//!   args: [workers/easyocr_worker.py]
//! detector:
//!   program: python3
//!   args: [workers/det_worker.py]
//! recognizer:
//!   program: python3
//!   args: [workers/rec_worker.py, --device, cpu]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::provider::ModelKind;
use crate::error::OcrLabelError;

/// How to launch the worker process hosting one model.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WorkerCommand {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the worker; inherited when absent.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Worker commands for each model kind. Unconfigured models fail to load.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub joint: Option<WorkerCommand>,

    #[serde(default)]
    pub detector: Option<WorkerCommand>,

    #[serde(default)]
    pub recognizer: Option<WorkerCommand>,
}

impl EngineConfig {
    /// Reads an engine config file.
    pub fn load(path: &Path) -> Result<Self, OcrLabelError> {
        let data = fs::read_to_string(path).map_err(OcrLabelError::Io)?;
        Self::from_yaml_str(&data).map_err(|source| OcrLabelError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses an engine config from YAML text.
    pub fn from_yaml_str(data: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    /// The worker command for a model kind, if configured.
    pub fn command(&self, kind: ModelKind) -> Option<&WorkerCommand> {
        match kind {
            ModelKind::Joint => self.joint.as_ref(),
            ModelKind::Detector => self.detector.as_ref(),
            ModelKind::Recognizer => self.recognizer.as_ref(),
        }
    }
}
