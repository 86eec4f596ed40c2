// ABOUTME: Application-wide error types for gantry.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::complete::IncompleteDeployments;
use crate::scheduler::SchedulerError;
use crate::structure::StructureError;
use crate::types::{UnitName, UnitNameError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid unit name: {0}")]
    InvalidName(#[from] UnitNameError),

    #[error("deployment already registered: {0}")]
    DuplicateDeployment(UnitName),

    #[error("unknown deployment: {0}")]
    UnknownDeployment(UnitName),

    #[error("structure determination failed: {0}")]
    Structure(#[from] StructureError),

    #[error("scheduling failed: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("{} deployment(s) failed: {}", failures.len(), failures.iter().map(|(n, m)| format!("{n} ({m})")).collect::<Vec<_>>().join(", "))]
    DeploymentsFailed { failures: Vec<(UnitName, String)> },

    #[error("{0}")]
    Incomplete(Box<IncompleteDeployments>),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
