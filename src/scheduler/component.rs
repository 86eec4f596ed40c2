// ABOUTME: Component expansion: materializing named sub-units from a container attachment.
// ABOUTME: An extractor closure per container type; the scheduler drives expansion.

use std::collections::BTreeMap;

use crate::unit::{AttachmentValue, DeploymentUnit};

/// Description of one component to materialize: its name segment and the
/// predetermined attachments it starts with.
pub struct ComponentSpec {
    pub name: String,
    pub predetermined: BTreeMap<String, AttachmentValue>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predetermined: BTreeMap::new(),
        }
    }

    pub fn with_attachment(mut self, name: impl Into<String>, value: AttachmentValue) -> Self {
        self.predetermined.insert(name.into(), value);
        self
    }
}

type ExtractFn = dyn Fn(&DeploymentUnit) -> Vec<ComponentSpec> + Send + Sync;

/// Expands components out of a container attachment.
///
/// `extract` pulls an ordered list of component descriptors from an
/// existing attachment on the unit; the scheduler materializes each as a
/// named component sub-unit. Expansion happens once per unit, at the
/// point some registered deployer consumes or produces the container
/// type — independent of stage scheduling.
pub struct ComponentExpander {
    container_attachment: String,
    extract: Box<ExtractFn>,
}

impl ComponentExpander {
    pub fn new<F>(container_attachment: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&DeploymentUnit) -> Vec<ComponentSpec> + Send + Sync + 'static,
    {
        Self {
            container_attachment: container_attachment.into(),
            extract: Box::new(extract),
        }
    }

    pub fn container_attachment(&self) -> &str {
        &self.container_attachment
    }

    /// Materialize this expander's components on `unit` if the container
    /// attachment is present. Returns how many components were attached.
    pub(super) fn expand(&self, unit: &mut DeploymentUnit) -> usize {
        if !unit.attachments.has(&self.container_attachment) {
            return 0;
        }
        let specs = (self.extract)(unit);
        let count = specs.len();
        for spec in specs {
            let Ok(name) = unit.name().child(&spec.name) else {
                tracing::warn!(
                    unit = %unit.name(),
                    component = %spec.name,
                    "skipping component with invalid name segment"
                );
                continue;
            };
            let component = DeploymentUnit::with_predetermined(name, spec.predetermined);
            unit.add_component(component);
        }
        tracing::debug!(
            unit = %unit.name(),
            attachment = %self.container_attachment,
            count,
            "expanded components"
        );
        count
    }
}
