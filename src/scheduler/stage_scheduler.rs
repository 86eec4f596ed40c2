// ABOUTME: Drives registered deployers over the unit tree, stage by stage.
// ABOUTME: Deterministic ordering, per-unit failure isolation, reverse-order rollback.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::UnitName;
use crate::unit::{AppliedDeployer, DeploymentUnit, Problem, UnitState};

use super::component::ComponentExpander;
use super::deployer::Deployer;
use super::error::SchedulerError;
use super::order::order_stage;
use super::stage::Stages;

/// The stage scheduler: holds the stage sequence, the deployer registry,
/// and the component expanders, and drives one synchronous pass at a time.
///
/// Deployer slots keep their registration index for the lifetime of the
/// scheduler so rollback records stay valid across removals.
pub struct StageScheduler {
    stages: Stages,
    deployers: Vec<Option<Arc<dyn Deployer>>>,
    expanders: Vec<ComponentExpander>,
}

impl StageScheduler {
    pub fn new(stages: Stages) -> Self {
        Self {
            stages,
            deployers: Vec::new(),
            expanders: Vec::new(),
        }
    }

    pub fn stages(&self) -> &Stages {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut Stages {
        &mut self.stages
    }

    /// Register a deployer. Its declared stage must exist.
    pub fn add_deployer(&mut self, deployer: Arc<dyn Deployer>) -> Result<usize, SchedulerError> {
        let stage = &deployer.meta().stage;
        if self.stages.index_of(stage).is_none() {
            return Err(SchedulerError::UnknownStage(stage.clone()));
        }
        self.deployers.push(Some(deployer));
        Ok(self.deployers.len() - 1)
    }

    /// Unregister by name. The slot is tombstoned so indices recorded on
    /// units stay stable.
    pub fn remove_deployer(&mut self, name: &str) -> bool {
        for slot in &mut self.deployers {
            if slot.as_ref().is_some_and(|d| d.meta().name == name) {
                *slot = None;
                return true;
            }
        }
        false
    }

    pub fn add_expander(&mut self, expander: ComponentExpander) {
        self.expanders.push(expander);
    }

    /// Execution order for every stage: registration indices per stage.
    fn stage_orders(&self) -> Result<Vec<Vec<usize>>, SchedulerError> {
        let mut orders = Vec::with_capacity(self.stages.len());
        for stage in self.stages.names() {
            let members: Vec<(usize, Arc<dyn Deployer>)> = self
                .deployers
                .iter()
                .enumerate()
                .filter_map(|(reg, slot)| slot.clone().map(|d| (reg, d)))
                .filter(|(_, d)| &d.meta().stage == stage)
                .collect();
            orders.push(order_stage(stage, &members)?);
        }
        Ok(orders)
    }

    /// Drive every registered deployer over the tree: one global pass per
    /// stage, so all units finish a stage before any unit enters the next.
    /// Per-unit failures are collected, not propagated; a scheduling
    /// configuration problem aborts before anything runs.
    pub fn process(
        &self,
        roots: &mut [DeploymentUnit],
    ) -> Result<Vec<(UnitName, String)>, SchedulerError> {
        let orders = self.stage_orders()?;
        self.expand_components(roots);

        let mut root_order: Vec<usize> = (0..roots.len()).collect();
        root_order.sort_by(|&a, &b| {
            roots[a]
                .relative_order()
                .cmp(&roots[b].relative_order())
                .then_with(|| roots[a].name().cmp(roots[b].name()))
        });

        let mut seq = 0_u64;
        let mut failures = Vec::new();

        for (stage_index, stage_name) in self.stages.names().iter().enumerate() {
            tracing::debug!(stage = %stage_name, "entering stage");
            for &root_index in &root_order {
                for &reg in &orders[stage_index] {
                    let Some(deployer) = self.deployers[reg].clone() else {
                        continue;
                    };
                    self.visit(
                        &mut roots[root_index],
                        deployer.as_ref(),
                        reg,
                        stage_index,
                        stage_name,
                        &mut seq,
                        &mut failures,
                    );
                }
            }
        }

        for root in roots.iter_mut() {
            mark_tree_processed(root);
        }
        Ok(failures)
    }

    /// Unwind everything applied to this subtree, in exactly the reverse
    /// of the order it was applied, then mark it undeployed. Idempotent:
    /// a subtree with nothing applied is untouched.
    pub fn undeploy(&self, unit: &mut DeploymentUnit) {
        self.rollback_subtree(unit);
        unit.mark_undeployed();
    }

    fn visit(
        &self,
        unit: &mut DeploymentUnit,
        deployer: &dyn Deployer,
        reg: usize,
        stage_index: usize,
        stage_name: &str,
        seq: &mut u64,
        failures: &mut Vec<(UnitName, String)>,
    ) {
        if matches!(unit.state(), UnitState::Failed | UnitState::Undeployed) {
            return;
        }
        let parent_first = deployer.meta().parent_first;
        if parent_first
            && !self.apply(unit, deployer, reg, stage_index, stage_name, seq, failures)
        {
            return;
        }
        for child in unit.children_mut() {
            self.visit(child, deployer, reg, stage_index, stage_name, seq, failures);
        }
        if !parent_first {
            self.apply(unit, deployer, reg, stage_index, stage_name, seq, failures);
        }
    }

    /// Apply one deployer to one unit and then to its components, in
    /// order. Returns false when the unit itself failed; a component
    /// failure is scoped to that component.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        unit: &mut DeploymentUnit,
        deployer: &dyn Deployer,
        reg: usize,
        stage_index: usize,
        stage_name: &str,
        seq: &mut u64,
        failures: &mut Vec<(UnitName, String)>,
    ) -> bool {
        if deployer.meta().applicable(unit)
            && !self.apply_single(unit, deployer, reg, stage_index, stage_name, seq, failures)
        {
            return false;
        }
        for component in unit.components_mut() {
            if matches!(component.state(), UnitState::Failed | UnitState::Undeployed) {
                continue;
            }
            if deployer.meta().applicable(component) {
                self.apply_single(component, deployer, reg, stage_index, stage_name, seq, failures);
            }
        }
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_single(
        &self,
        unit: &mut DeploymentUnit,
        deployer: &dyn Deployer,
        reg: usize,
        stage_index: usize,
        stage_name: &str,
        seq: &mut u64,
        failures: &mut Vec<(UnitName, String)>,
    ) -> bool {
        match deployer.deploy(unit) {
            Ok(()) => {
                *seq += 1;
                unit.applied.push(AppliedDeployer {
                    seq: *seq,
                    stage_index,
                    deployer_index: reg,
                });
                if !deployer.meta().outputs.is_empty() {
                    unit.produced_output = true;
                }
                true
            }
            Err(error) => {
                let message = error.to_string();
                tracing::error!(
                    unit = %unit.name(),
                    deployer = %deployer.meta().name,
                    stage = %stage_name,
                    %message,
                    "deployer failed; unwinding unit"
                );
                self.rollback_subtree(unit);
                unit.mark_failed(Problem::new(message.clone(), Some(stage_name)));
                failures.push((unit.name().clone(), message));
                false
            }
        }
    }

    /// Revert every applied record in the subtree by descending sequence:
    /// reverse stage order, then reverse traversal order, then reverse
    /// deployer order. Undeploy hook errors are logged, never propagated.
    fn rollback_subtree(&self, unit: &mut DeploymentUnit) {
        while let Some(seq) = max_applied_seq(unit) {
            self.revert_seq(unit, seq);
        }
    }

    fn revert_seq(&self, unit: &mut DeploymentUnit, seq: u64) -> bool {
        if let Some(pos) = unit.applied.iter().position(|a| a.seq == seq) {
            let record = unit.applied.remove(pos);
            match &self.deployers[record.deployer_index] {
                Some(deployer) => {
                    if let Err(error) = deployer.undeploy(unit) {
                        tracing::warn!(
                            unit = %unit.name(),
                            deployer = %deployer.meta().name,
                            %error,
                            "undeploy hook failed; continuing unwind"
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        unit = %unit.name(),
                        "deployer removed since deploy; skipping undeploy hook"
                    );
                }
            }
            return true;
        }
        for child in unit.children_mut() {
            if self.revert_seq(child, seq) {
                return true;
            }
        }
        for component in unit.components_mut() {
            if self.revert_seq(component, seq) {
                return true;
            }
        }
        false
    }

    /// Materialize components for every unit whose container attachment
    /// some registered deployer consumes or produces. Runs once per unit,
    /// independent of stage scheduling.
    fn expand_components(&self, roots: &mut [DeploymentUnit]) {
        let active: BTreeSet<&str> = self
            .deployers
            .iter()
            .flatten()
            .flat_map(|d| d.meta().inputs.iter().chain(d.meta().outputs.iter()))
            .map(String::as_str)
            .collect();
        let relevant: Vec<&ComponentExpander> = self
            .expanders
            .iter()
            .filter(|e| active.contains(e.container_attachment()))
            .collect();
        if relevant.is_empty() {
            return;
        }
        for root in roots {
            expand_tree(root, &relevant);
        }
    }
}

fn expand_tree(unit: &mut DeploymentUnit, expanders: &[&ComponentExpander]) {
    if !unit.components_expanded {
        for expander in expanders {
            expander.expand(unit);
        }
        unit.components_expanded = true;
    }
    for child in unit.children_mut() {
        expand_tree(child, expanders);
    }
}

fn mark_tree_processed(unit: &mut DeploymentUnit) {
    unit.mark_processed();
    for child in unit.children_mut() {
        mark_tree_processed(child);
    }
    for component in unit.components_mut() {
        mark_tree_processed(component);
    }
}

fn max_applied_seq(unit: &DeploymentUnit) -> Option<u64> {
    let own = unit.applied.iter().map(|a| a.seq).max();
    let nested = unit
        .children()
        .iter()
        .chain(unit.components().iter())
        .filter_map(max_applied_seq)
        .max();
    own.max(nested)
}
