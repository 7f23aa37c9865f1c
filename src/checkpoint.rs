use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::solver::{Algorithm, SolverConfig, TrainingReport};
use crate::table::{PolicyTable, ValueFunction};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode checkpoint: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// How a checkpointed policy was produced.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingMetadata {
    /// Environment spec accepted by `Environment::from_spec`.
    pub environment: String,
    pub algorithm: Algorithm,
    pub config: SolverConfig,
    pub state_count: usize,
    pub action_count: usize,
    pub iterations: usize,
    pub total_sweeps: usize,
}

impl TrainingMetadata {
    pub fn new(
        environment: impl Into<String>,
        algorithm: Algorithm,
        config: SolverConfig,
        policy: &PolicyTable,
        report: &TrainingReport,
    ) -> Self {
        Self {
            environment: environment.into(),
            algorithm,
            config,
            state_count: policy.state_count(),
            action_count: policy.action_count(),
            iterations: report.iterations.len(),
            total_sweeps: report.total_sweeps(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PolicyCheckpoint {
    pub metadata: TrainingMetadata,
    pub policy: PolicyTable,
    pub values: ValueFunction,
}

impl PolicyCheckpoint {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let bytes = fs::read(path)?;
        let (checkpoint, _): (PolicyCheckpoint, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        Ok(checkpoint)
    }
}
