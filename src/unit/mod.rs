// ABOUTME: Deployment unit tree with scoped attachment storage.
// ABOUTME: Exports DeploymentUnit, Attachments, and lifecycle state types.

mod attachments;
mod deployment_unit;

pub use attachments::{AttachmentValue, Attachments};
pub use deployment_unit::{AppliedDeployer, DeploymentUnit, Problem, UnitState};
