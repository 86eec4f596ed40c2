// ABOUTME: Error types for stage scheduling and deployer execution.
// ABOUTME: ProcessorError marks units failed; SchedulerError is a registration problem.

use thiserror::Error;

use crate::graph::GraphError;

/// A stage processor failed on one unit. Captured onto the unit as its
/// `problem` and surfaced to the caller of `process()`.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("deployer {deployer} failed: {message}")]
    Failed { deployer: String, message: String },

    #[error("missing attachment: {name}")]
    MissingAttachment { name: String },

    #[error("dependency graph rejected operation: {0}")]
    Graph(#[from] GraphError),
}

impl ProcessorError {
    pub fn failed(deployer: impl Into<String>, message: impl Into<String>) -> Self {
        ProcessorError::Failed {
            deployer: deployer.into(),
            message: message.into(),
        }
    }
}

/// Scheduling-level problems: misconfigured stages or deployer graphs.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("stage already exists: {0}")]
    DuplicateStage(String),

    #[error("deployer input/output cycle in stage {stage}: {members:?}")]
    DeployerCycle { stage: String, members: Vec<String> },
}
