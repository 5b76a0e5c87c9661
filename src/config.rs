//! Detector configuration.
//!
//! Loaded from JSON; every field has a default so partial documents are
//! accepted.

use crate::base::DEFAULT_CONTAMINATION;
use crate::error::{CopodError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    /// Evaluate feature columns on the rayon pool
    #[serde(default)]
    pub parallel: bool,
    /// Quantile bands used by `explain` when none are passed
    #[serde(default)]
    pub explain_cutoffs: Option<[f64; 2]>,
}

fn default_contamination() -> f64 {
    DEFAULT_CONTAMINATION
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            parallel: false,
            explain_cutoffs: None,
        }
    }
}

impl DetectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CopodError::InvalidParameter(format!("config: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
