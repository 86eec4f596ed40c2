// ABOUTME: Stage scheduler: ordered stages, pluggable deployers, deterministic traversal.
// ABOUTME: Exports the Deployer contract, stage sequence, and the scheduler itself.

mod component;
mod deployer;
mod error;
mod order;
pub mod stage;
mod stage_scheduler;

pub use component::{ComponentExpander, ComponentSpec};
pub use deployer::{DEFAULT_RELATIVE_ORDER, Deployer, DeployerMeta, FnDeployer};
pub use error::{ProcessorError, SchedulerError};
pub use stage::Stages;
pub use stage_scheduler::StageScheduler;
