//! Checkpoint and Recovery
//!
//! A fitted detector is fully determined by its contamination and training
//! rows, so a checkpoint stores those and restoring re-fits. The training
//! shape and buffer are guarded by an xxh3 checksum, and the table is
//! re-validated as it is decoded.

use crate::config::DetectorConfig;
use crate::detector::Copod;
use crate::error::{CopodError, Result};
use crate::matrix::Matrix;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Version for checkpoint format migrations
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopodCheckpoint {
    /// Format version
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub contamination: f64,
    pub parallel: bool,
    pub explain_cutoffs: Option<[f64; 2]>,
    pub n_classes: usize,
    /// Training rows, absent for an unfitted detector
    pub training: Option<Matrix>,
    /// xxh3 of the training shape and buffer
    pub checksum: u64,
}

fn training_checksum(training: Option<&Matrix>) -> u64 {
    match training {
        Some(m) => {
            let mut bytes = Vec::with_capacity(16 + m.as_slice().len() * 8);
            bytes.extend_from_slice(&(m.rows() as u64).to_le_bytes());
            bytes.extend_from_slice(&(m.cols() as u64).to_le_bytes());
            bytes.extend(m.as_slice().iter().flat_map(|v| v.to_le_bytes()));
            xxhash_rust::xxh3::xxh3_64(&bytes)
        }
        None => 0,
    }
}

impl CopodCheckpoint {
    pub fn capture(detector: &Copod) -> Self {
        let training = detector.training().map(|t| t.table.clone());
        Self {
            version: CHECKPOINT_VERSION,
            created_at: Utc::now(),
            contamination: detector.contamination(),
            parallel: detector.is_parallel(),
            explain_cutoffs: detector.explain_cutoffs(),
            n_classes: detector.n_classes(),
            checksum: training_checksum(training.as_ref()),
            training,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CopodError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let checkpoint: CopodCheckpoint = bincode::deserialize(bytes)
            .map_err(|e| CopodError::DeserializationFailed(e.to_string()))?;

        if checkpoint.version > CHECKPOINT_VERSION {
            return Err(CopodError::UnsupportedVersion {
                found: checkpoint.version,
                max_supported: CHECKPOINT_VERSION,
            });
        }

        let found = training_checksum(checkpoint.training.as_ref());
        if found != checkpoint.checksum {
            return Err(CopodError::ChecksumMismatch {
                expected: checkpoint.checksum,
                found,
            });
        }

        Ok(checkpoint)
    }

    /// Rebuild the detector, re-fitting on the stored training rows.
    pub fn restore(&self) -> Result<Copod> {
        let config = DetectorConfig {
            contamination: self.contamination,
            parallel: self.parallel,
            explain_cutoffs: self.explain_cutoffs,
        };
        let mut detector = Copod::from_config(&config)?;
        if let Some(training) = &self.training {
            detector.fit(training)?;
            info!(
                rows = training.rows(),
                created_at = %self.created_at,
                "restored copod checkpoint"
            );
        }
        Ok(detector)
    }
}

impl Copod {
    /// Serialize the detector to a versioned checkpoint payload.
    pub fn checkpoint(&self) -> Result<Vec<u8>> {
        CopodCheckpoint::capture(self).to_bytes()
    }

    pub fn restore(bytes: &[u8]) -> Result<Copod> {
        CopodCheckpoint::from_bytes(bytes)?.restore()
    }
}
