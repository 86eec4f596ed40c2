// ABOUTME: DeploymentUnit, a node in the processed artifact tree.
// ABOUTME: Owns nested children, scoped components, attachments, and failure state.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::types::UnitName;

use super::attachments::{AttachmentValue, Attachments};

/// Processing state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Created but not yet driven through any stage.
    Pending,
    /// All applicable deployers completed.
    Processed,
    /// A deployer failed; `problem` holds the capture.
    Failed,
    /// Unwound; kept only until removed from the tree.
    Undeployed,
}

/// Last captured failure on a unit.
#[derive(Debug, Clone)]
pub struct Problem {
    pub message: String,
    pub stage: Option<String>,
    pub at: DateTime<Utc>,
}

impl Problem {
    pub fn new(message: impl Into<String>, stage: Option<&str>) -> Self {
        Self {
            message: message.into(),
            stage: stage.map(str::to_string),
            at: Utc::now(),
        }
    }
}

/// Record of one deployer application, kept for reverse-order rollback.
/// `seq` is the global application sequence across one `process()` run;
/// unwinding by descending `seq` reverses stage, traversal, and deployer
/// order at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDeployer {
    pub seq: u64,
    pub stage_index: usize,
    pub deployer_index: usize,
}

/// A node in the deployment unit tree.
///
/// Children are structurally nested sub-deployments discovered by the
/// structure resolver; components are named sub-elements scoped to this
/// unit that are not structurally nested (individually addressable
/// descriptors inside one artifact).
#[derive(Debug)]
pub struct DeploymentUnit {
    name: UnitName,
    parent_name: Option<UnitName>,
    relative_order: i32,
    is_component: bool,
    pub attachments: Attachments,
    children: Vec<DeploymentUnit>,
    components: Vec<DeploymentUnit>,
    controller_context_names: BTreeSet<String>,
    problem: Option<Problem>,
    state: UnitState,
    pub(crate) applied: Vec<AppliedDeployer>,
    pub(crate) produced_output: bool,
    pub(crate) components_expanded: bool,
}

impl DeploymentUnit {
    pub fn new(name: UnitName) -> Self {
        Self::with_predetermined(name, BTreeMap::new())
    }

    pub fn with_predetermined(
        name: UnitName,
        predetermined: BTreeMap<String, AttachmentValue>,
    ) -> Self {
        Self {
            name,
            parent_name: None,
            relative_order: 0,
            is_component: false,
            attachments: Attachments::with_predetermined(predetermined),
            children: Vec::new(),
            components: Vec::new(),
            controller_context_names: BTreeSet::new(),
            problem: None,
            state: UnitState::Pending,
            applied: Vec::new(),
            produced_output: false,
            components_expanded: false,
        }
    }

    pub fn name(&self) -> &UnitName {
        &self.name
    }

    pub fn simple_name(&self) -> &str {
        self.name.simple_name()
    }

    pub fn parent_name(&self) -> Option<&UnitName> {
        self.parent_name.as_ref()
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_name.is_none()
    }

    pub fn is_component(&self) -> bool {
        self.is_component
    }

    pub fn relative_order(&self) -> i32 {
        self.relative_order
    }

    pub fn set_relative_order(&mut self, order: i32) {
        self.relative_order = order;
    }

    /// Attach a structurally nested sub-deployment.
    pub fn add_child(&mut self, mut child: DeploymentUnit) {
        child.parent_name = Some(self.name.clone());
        self.children.push(child);
        self.children.sort_by(|a, b| {
            a.relative_order
                .cmp(&b.relative_order)
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    /// Attach a named component scoped to this unit.
    pub fn add_component(&mut self, mut component: DeploymentUnit) {
        component.parent_name = Some(self.name.clone());
        component.is_component = true;
        self.components.push(component);
    }

    pub fn children(&self) -> &[DeploymentUnit] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [DeploymentUnit] {
        &mut self.children
    }

    pub fn components(&self) -> &[DeploymentUnit] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [DeploymentUnit] {
        &mut self.components
    }

    /// Record a name this unit registered with the external dependency graph.
    pub fn register_context_name(&mut self, name: impl Into<String>) {
        self.controller_context_names.insert(name.into());
    }

    pub fn controller_context_names(&self) -> &BTreeSet<String> {
        &self.controller_context_names
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub(crate) fn mark_processed(&mut self) {
        if self.state == UnitState::Pending {
            self.state = UnitState::Processed;
        }
    }

    pub(crate) fn mark_failed(&mut self, problem: Problem) {
        self.problem = Some(problem);
        self.state = UnitState::Failed;
    }

    pub(crate) fn mark_undeployed(&mut self) {
        self.state = UnitState::Undeployed;
        for child in &mut self.children {
            child.mark_undeployed();
        }
        for component in &mut self.components {
            component.mark_undeployed();
        }
    }

    /// Depth-first search for a unit by name within this subtree,
    /// including components.
    pub fn find(&self, name: &UnitName) -> Option<&DeploymentUnit> {
        if &self.name == name {
            return Some(self);
        }
        self.children
            .iter()
            .chain(self.components.iter())
            .find_map(|u| u.find(name))
    }

    /// Mutable counterpart of [`DeploymentUnit::find`].
    pub fn find_mut(&mut self, name: &UnitName) -> Option<&mut DeploymentUnit> {
        if &self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .chain(self.components.iter_mut())
            .find_map(|u| u.find_mut(name))
    }

    /// Context names registered anywhere in this subtree, paired with the
    /// owning unit's name.
    pub fn collect_context_names(&self) -> Vec<(UnitName, String)> {
        let mut out: Vec<(UnitName, String)> = self
            .controller_context_names
            .iter()
            .map(|c| (self.name.clone(), c.clone()))
            .collect();
        for unit in self.children.iter().chain(self.components.iter()) {
            out.extend(unit.collect_context_names());
        }
        out
    }

    /// Whether any deployer produced an output anywhere in this subtree.
    pub(crate) fn any_output_produced(&self) -> bool {
        self.produced_output
            || self.children.iter().any(DeploymentUnit::any_output_produced)
            || self.components.iter().any(DeploymentUnit::any_output_produced)
    }
}
