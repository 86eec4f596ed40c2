// ABOUTME: Deployer capability record and functional contract.
// ABOUTME: Applicability is selected by data (stage, tokens, flags), not subclassing.

use std::collections::BTreeSet;

use crate::unit::DeploymentUnit;

use super::error::ProcessorError;

pub const DEFAULT_RELATIVE_ORDER: i32 = 0;

/// Declarative description of one deployer: where it runs, what it
/// consumes and produces, and how it traverses the unit tree.
#[derive(Debug, Clone)]
pub struct DeployerMeta {
    pub name: String,
    pub stage: String,
    /// Tie-break within a stage after input/output ordering; default is
    /// the mid-value 0.
    pub relative_order: i32,
    /// Scheduling hint: attachments this deployer consumes.
    pub inputs: BTreeSet<String>,
    /// Scheduling hint: attachments this deployer produces.
    pub outputs: BTreeSet<String>,
    /// Participation gate: a unit lacking any of these is skipped.
    pub required_inputs: BTreeSet<String>,
    pub top_level_only: bool,
    pub components_only: bool,
    pub want_components: bool,
    /// Treat every declared input as required.
    pub all_inputs: bool,
    /// Pre-order traversal when true (the default); post-order otherwise.
    pub parent_first: bool,
}

impl DeployerMeta {
    pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            relative_order: DEFAULT_RELATIVE_ORDER,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            required_inputs: BTreeSet::new(),
            top_level_only: false,
            components_only: false,
            want_components: false,
            all_inputs: false,
            parent_first: true,
        }
    }

    pub fn relative_order(mut self, order: i32) -> Self {
        self.relative_order = order;
        self
    }

    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.insert(name.into());
        self
    }

    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.outputs.insert(name.into());
        self
    }

    /// Declare an input that also gates participation.
    pub fn required_input(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.inputs.insert(name.clone());
        self.required_inputs.insert(name);
        self
    }

    pub fn top_level_only(mut self) -> Self {
        self.top_level_only = true;
        self
    }

    pub fn components_only(mut self) -> Self {
        self.components_only = true;
        self.want_components = true;
        self
    }

    pub fn want_components(mut self) -> Self {
        self.want_components = true;
        self
    }

    pub fn all_inputs(mut self) -> Self {
        self.all_inputs = true;
        self
    }

    pub fn children_first(mut self) -> Self {
        self.parent_first = false;
        self
    }

    /// Whether this deployer runs on `unit` at all. Skipping is per unit;
    /// the deployer stays registered for every other unit.
    pub fn applicable(&self, unit: &DeploymentUnit) -> bool {
        if self.components_only && !unit.is_component() {
            return false;
        }
        if unit.is_component() && !self.want_components {
            return false;
        }
        if self.top_level_only && !unit.is_top_level() {
            return false;
        }
        if !unit.attachments.has_all(&self.required_inputs) {
            return false;
        }
        if self.all_inputs && !unit.attachments.has_all(&self.inputs) {
            return false;
        }
        true
    }
}

/// A pluggable stage processor.
pub trait Deployer: Send + Sync {
    fn meta(&self) -> &DeployerMeta;

    /// Apply this processor to one unit.
    fn deploy(&self, unit: &mut DeploymentUnit) -> Result<(), ProcessorError>;

    /// Revert a previous `deploy` during rollback or undeploy. Errors are
    /// logged and never stop the unwind.
    fn undeploy(&self, _unit: &mut DeploymentUnit) -> Result<(), ProcessorError> {
        Ok(())
    }
}

type DeployFn = dyn Fn(&mut DeploymentUnit) -> Result<(), ProcessorError> + Send + Sync;

/// Deployer built from closures; the common case for metadata
/// materialization processors plugged in from outside.
pub struct FnDeployer {
    meta: DeployerMeta,
    deploy: Box<DeployFn>,
    undeploy: Option<Box<DeployFn>>,
}

impl FnDeployer {
    pub fn new<F>(meta: DeployerMeta, deploy: F) -> Self
    where
        F: Fn(&mut DeploymentUnit) -> Result<(), ProcessorError> + Send + Sync + 'static,
    {
        Self {
            meta,
            deploy: Box::new(deploy),
            undeploy: None,
        }
    }

    pub fn with_undeploy<F>(mut self, undeploy: F) -> Self
    where
        F: Fn(&mut DeploymentUnit) -> Result<(), ProcessorError> + Send + Sync + 'static,
    {
        self.undeploy = Some(Box::new(undeploy));
        self
    }
}

impl Deployer for FnDeployer {
    fn meta(&self) -> &DeployerMeta {
        &self.meta
    }

    fn deploy(&self, unit: &mut DeploymentUnit) -> Result<(), ProcessorError> {
        (self.deploy)(unit)
    }

    fn undeploy(&self, unit: &mut DeploymentUnit) -> Result<(), ProcessorError> {
        match &self.undeploy {
            Some(f) => f(unit),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitName;

    fn unit(name: &str) -> DeploymentUnit {
        DeploymentUnit::new(UnitName::new(name).unwrap())
    }

    #[test]
    fn required_input_gates_participation() {
        let meta = DeployerMeta::new("parser", "parse").required_input("raw-descriptor");

        let bare = unit("a.jar");
        assert!(!meta.applicable(&bare));

        let mut with_input = unit("b.jar");
        with_input.attachments.put("raw-descriptor", "<xml/>".to_string());
        assert!(meta.applicable(&with_input));
    }

    #[test]
    fn all_inputs_promotes_hints_to_requirements() {
        let meta = DeployerMeta::new("combiner", "describe")
            .input("left")
            .input("right")
            .all_inputs();

        let mut half = unit("c.jar");
        half.attachments.put("left", 1_u8);
        assert!(!meta.applicable(&half));

        half.attachments.put("right", 2_u8);
        assert!(meta.applicable(&half));
    }

    #[test]
    fn component_flags_control_applicability() {
        let plain = DeployerMeta::new("plain", "real");
        let comp_only = DeployerMeta::new("comp", "real").components_only();
        let wants = DeployerMeta::new("wants", "real").want_components();

        let mut owner = unit("app.ear");
        owner.add_component(unit("app.ear/bean"));
        let component = &owner.components()[0];

        assert!(plain.applicable(&owner));
        assert!(!plain.applicable(component));
        assert!(!comp_only.applicable(&owner));
        assert!(comp_only.applicable(component));
        assert!(wants.applicable(&owner));
        assert!(wants.applicable(component));
    }

    #[test]
    fn top_level_only_skips_nested_units() {
        let meta = DeployerMeta::new("top", "parse").top_level_only();
        let mut root = unit("app.ear");
        root.add_child(unit("app.ear/sub.war"));

        assert!(meta.applicable(&root));
        assert!(!meta.applicable(&root.children()[0]));
    }
}
