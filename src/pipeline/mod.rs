// ABOUTME: Top-level pipeline facade: add, process, check completeness, undeploy.
// ABOUTME: Coordinates resolver, scheduler, unit tree, and the dependency graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::complete::CompletenessChecker;
use crate::config::StructureConfig;
use crate::container::ContainerSource;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::scheduler::{StageScheduler, Stages};
use crate::structure::{
    CONTEXT_INFO_ATTACHMENT, ContextInfo, STRUCTURE_ATTACHMENT, StructureError, StructureMetaData,
    StructureResolver,
};
use crate::types::UnitName;
use crate::unit::{AttachmentValue, DeploymentUnit};

/// The deployment pipeline.
///
/// One registered deployment at a time flows: container source →
/// structure determination → unit subtree → staged processing →
/// completeness check against the dependency graph. A single `process()`
/// pass advances every pending deployment through one stage before any
/// deployment enters the next, so unrelated deployments sharing a stage
/// see a deterministic global order.
pub struct Pipeline {
    resolver: StructureResolver,
    scheduler: StageScheduler,
    graph: Arc<dyn DependencyGraph>,
    deployments: Vec<DeploymentUnit>,
}

impl Pipeline {
    pub fn new(
        resolver: StructureResolver,
        scheduler: StageScheduler,
        graph: Arc<dyn DependencyGraph>,
    ) -> Self {
        Self {
            resolver,
            scheduler,
            graph,
            deployments: Vec::new(),
        }
    }

    /// Pipeline with the built-in recognizers, built-in stages, and
    /// default structure configuration.
    pub fn with_defaults(graph: Arc<dyn DependencyGraph>) -> Self {
        Self::new(
            StructureResolver::new(StructureConfig::default()),
            StageScheduler::new(Stages::builtin()),
            graph,
        )
    }

    pub fn resolver_mut(&mut self) -> &mut StructureResolver {
        &mut self.resolver
    }

    pub fn scheduler(&self) -> &StageScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut StageScheduler {
        &mut self.scheduler
    }

    pub fn graph(&self) -> &Arc<dyn DependencyGraph> {
        &self.graph
    }

    /// Register a deployment: determine its structure, materialize any
    /// modification requirements, and insert the resulting unit subtree.
    pub fn add_deployment(&mut self, name: &str, source: &dyn ContainerSource) -> Result<UnitName> {
        let name = UnitName::new(name)?;
        if self.deployments.iter().any(|d| d.name() == &name) {
            return Err(Error::DuplicateDeployment(name));
        }

        let metadata = self.resolver.determine_structure(source)?;

        // Mount hook: contexts must read as normal directory trees before
        // any stage runs.
        for info in metadata.contexts() {
            if let Some(modification) = info.modification() {
                source
                    .materialize(info.path(), modification)
                    .map_err(|source| {
                        Error::Structure(StructureError::Container {
                            path: info.path().to_string(),
                            source,
                        })
                    })?;
            }
        }

        let root = build_unit_tree(&name, &metadata)?;
        tracing::info!(deployment = %name, contexts = metadata.len(), "deployment registered");
        self.deployments.push(root);
        Ok(name)
    }

    /// Drive all pending units through every stage, globally. Per-unit
    /// failures are reported together after the pass; each failed unit
    /// was already unwound and carries its problem.
    pub fn process(&mut self) -> Result<()> {
        let failures = self.scheduler.process(&mut self.deployments)?;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::DeploymentsFailed { failures })
        }
    }

    /// Check the dependency graph for one deployment (or all) and raise
    /// a structured error if anything is unresolved. A report containing
    /// only blocked-on-async demands still raises; the report
    /// distinguishes the kinds so callers can decide to retry.
    pub fn check_complete(&self, scope: Option<&UnitName>) -> Result<()> {
        let roots: Vec<&DeploymentUnit> = match scope {
            Some(name) => vec![
                self.deployments
                    .iter()
                    .find(|d| d.name() == name)
                    .ok_or_else(|| Error::UnknownDeployment(name.clone()))?,
            ],
            None => self.deployments.iter().collect(),
        };

        let report = CompletenessChecker::check(roots, self.graph.as_ref());
        if report.is_incomplete() {
            Err(Error::Incomplete(Box::new(report)))
        } else {
            Ok(())
        }
    }

    /// Unwind and remove a deployment. Idempotent: undeploying a name
    /// that is not (or no longer) registered is a no-op.
    pub fn undeploy(&mut self, name: &UnitName) -> Result<()> {
        let Some(position) = self.deployments.iter().position(|d| d.name() == name) else {
            tracing::debug!(deployment = %name, "undeploy of unregistered deployment ignored");
            return Ok(());
        };
        let mut root = self.deployments.remove(position);
        self.scheduler.undeploy(&mut root);
        for (_, context) in root.collect_context_names() {
            self.graph.uninstall_context(&context);
        }
        tracing::info!(deployment = %name, "deployment removed");
        Ok(())
    }

    pub fn deployment(&self, name: &UnitName) -> Option<&DeploymentUnit> {
        self.deployments.iter().find_map(|d| d.find(name))
    }

    pub fn deployments(&self) -> impl Iterator<Item = &DeploymentUnit> {
        self.deployments.iter()
    }
}

/// Build the unit subtree for one deployment from its frozen structure:
/// the root unit carries the whole `StructureMetaData` plus its own
/// `ContextInfo`; each subordinate context becomes a child unit nested
/// under its closest ancestor context.
fn build_unit_tree(name: &UnitName, metadata: &StructureMetaData) -> Result<DeploymentUnit> {
    let mut predetermined: BTreeMap<String, AttachmentValue> = BTreeMap::new();
    predetermined.insert(
        STRUCTURE_ATTACHMENT.to_string(),
        Arc::new(metadata.clone()) as AttachmentValue,
    );
    if let Some(info) = metadata.context("") {
        predetermined.insert(
            CONTEXT_INFO_ATTACHMENT.to_string(),
            Arc::new(info.clone()) as AttachmentValue,
        );
    }
    let mut root = DeploymentUnit::with_predetermined(name.clone(), predetermined);

    // Shallow paths first so every parent exists before its children.
    let mut subordinate: Vec<&ContextInfo> = metadata
        .contexts()
        .iter()
        .filter(|c| !c.path().is_empty())
        .collect();
    subordinate.sort_by_key(|c| (c.path().matches('/').count(), c.path().to_string()));

    for info in subordinate {
        let unit_name = UnitName::new(&format!("{}/{}", name, info.path()))?;
        let mut predetermined: BTreeMap<String, AttachmentValue> = BTreeMap::new();
        predetermined.insert(
            CONTEXT_INFO_ATTACHMENT.to_string(),
            Arc::new(info.clone()) as AttachmentValue,
        );
        let child = DeploymentUnit::with_predetermined(unit_name, predetermined);

        let parent_name = closest_ancestor(name, info.path(), metadata)?;
        let parent = match parent_name {
            Some(parent_name) => root
                .find_mut(&parent_name)
                // Parents exist before children thanks to the depth sort.
                .expect("ancestor context unit inserted by depth-ordered pass"),
            None => &mut root,
        };
        parent.add_child(child);
    }

    Ok(root)
}

/// Closest registered context that is a proper path prefix of `path`.
fn closest_ancestor(
    name: &UnitName,
    path: &str,
    metadata: &StructureMetaData,
) -> Result<Option<UnitName>> {
    let mut best: Option<&str> = None;
    for candidate in metadata.contexts() {
        let cp = candidate.path();
        if cp.is_empty() || cp == path {
            continue;
        }
        if path.starts_with(cp)
            && path.as_bytes().get(cp.len()) == Some(&b'/')
            && best.is_none_or(|b| cp.len() > b.len())
        {
            best = Some(cp);
        }
    }
    match best {
        Some(prefix) => Ok(Some(UnitName::new(&format!("{name}/{prefix}"))?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{ContextInfo, MetadataKind};

    fn metadata_with(paths: &[&str]) -> StructureMetaData {
        let mut metadata = StructureMetaData::new();
        let mut root = ContextInfo::new("");
        root.add_metadata_location("meta-inf", MetadataKind::Default);
        metadata.add_context(root).unwrap();
        for p in paths {
            metadata.add_context(ContextInfo::new(*p)).unwrap();
        }
        metadata
    }

    #[test]
    fn subordinate_contexts_nest_under_closest_ancestor() {
        let metadata = metadata_with(&["lib.jar", "lib.jar/inner.jar", "other.war"]);
        let name = UnitName::new("app.ear").unwrap();
        let root = build_unit_tree(&name, &metadata).unwrap();

        assert_eq!(root.children().len(), 2);
        let lib = root.find(&UnitName::new("app.ear/lib.jar").unwrap()).unwrap();
        assert_eq!(lib.children().len(), 1);
        assert_eq!(lib.children()[0].simple_name(), "inner.jar");
    }

    #[test]
    fn root_unit_carries_structure_and_its_context_info() {
        let metadata = metadata_with(&[]);
        let name = UnitName::new("app.ear").unwrap();
        let root = build_unit_tree(&name, &metadata).unwrap();

        assert!(root.attachments.get::<StructureMetaData>(STRUCTURE_ATTACHMENT).is_some());
        let info = root.attachments.get::<ContextInfo>(CONTEXT_INFO_ATTACHMENT).unwrap();
        assert_eq!(info.metadata_locations().len(), 1);
    }

    #[test]
    fn child_units_carry_their_own_context_info_only() {
        let metadata = metadata_with(&["sub.war"]);
        let name = UnitName::new("app.ear").unwrap();
        let root = build_unit_tree(&name, &metadata).unwrap();

        let sub = &root.children()[0];
        let info = sub.attachments.get::<ContextInfo>(CONTEXT_INFO_ATTACHMENT).unwrap();
        assert_eq!(info.path(), "sub.war");
        assert!(sub.attachments.get::<StructureMetaData>(STRUCTURE_ATTACHMENT).is_none());
    }
}
