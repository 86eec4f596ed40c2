// ABOUTME: Structural metadata built once per top-level deployment.
// ABOUTME: ContextInfo entries keyed by unique deployment-relative paths.

use std::collections::BTreeSet;

use serde::Serialize;

use super::error::StructureError;

/// Storage preparation a context requires before later stages may read it
/// as a normal directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModificationType {
    Unpack,
    UnpackRecursive,
    Move,
    Temp,
}

/// How a metadata location relates to the context's default location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetadataKind {
    Default,
    /// Additive with the default location, never exclusive of it.
    Alternative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataLocation {
    pub path: String,
    pub kind: MetadataKind,
}

/// One classpath entry, independently includable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClasspathEntry {
    pub path: String,
    pub included: bool,
}

/// Structural classification of one context within a deployment,
/// keyed by its path relative to the deployment root ("" is the root).
#[derive(Debug, Clone, Serialize)]
pub struct ContextInfo {
    path: String,
    metadata_locations: Vec<MetadataLocation>,
    classpath: Vec<ClasspathEntry>,
    comparator: Option<String>,
    modification: Option<ModificationType>,
}

impl ContextInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata_locations: Vec::new(),
            classpath: Vec::new(),
            comparator: None,
            modification: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn add_metadata_location(&mut self, path: impl Into<String>, kind: MetadataKind) {
        self.metadata_locations.push(MetadataLocation {
            path: path.into(),
            kind,
        });
    }

    pub fn metadata_locations(&self) -> &[MetadataLocation] {
        &self.metadata_locations
    }

    pub fn add_classpath_entry(&mut self, path: impl Into<String>, included: bool) {
        self.classpath.push(ClasspathEntry {
            path: path.into(),
            included,
        });
    }

    pub fn classpath(&self) -> &[ClasspathEntry] {
        &self.classpath
    }

    pub fn set_comparator(&mut self, comparator: impl Into<String>) {
        self.comparator = Some(comparator.into());
    }

    pub fn comparator(&self) -> Option<&str> {
        self.comparator.as_deref()
    }

    pub fn set_modification(&mut self, modification: ModificationType) {
        self.modification = Some(modification);
    }

    pub fn modification(&self) -> Option<ModificationType> {
        self.modification
    }
}

/// All structural contexts discovered for one top-level deployment.
///
/// Built once by the structure resolver before any stage runs, optionally
/// adjusted by a listener hook, then treated as read-only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureMetaData {
    contexts: Vec<ContextInfo>,
    #[serde(skip)]
    paths: BTreeSet<String>,
}

impl StructureMetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context. Paths are unique within one deployment;
    /// a duplicate is a hard error and leaves the metadata unchanged.
    pub fn add_context(&mut self, info: ContextInfo) -> Result<(), StructureError> {
        if self.paths.contains(info.path()) {
            return Err(StructureError::DuplicateContext {
                path: info.path().to_string(),
            });
        }
        self.paths.insert(info.path().to_string());
        self.contexts.push(info);
        Ok(())
    }

    /// Remove a partially-built entry, returning it if present.
    pub fn remove_context(&mut self, path: &str) -> Option<ContextInfo> {
        if !self.paths.remove(path) {
            return None;
        }
        let index = self.contexts.iter().position(|c| c.path() == path)?;
        Some(self.contexts.remove(index))
    }

    pub fn context(&self, path: &str) -> Option<&ContextInfo> {
        self.contexts.iter().find(|c| c.path() == path)
    }

    pub fn context_mut(&mut self, path: &str) -> Option<&mut ContextInfo> {
        self.contexts.iter_mut().find(|c| c.path() == path)
    }

    /// Contexts in discovery order; the root context (path "") first when
    /// present.
    pub fn contexts(&self) -> &[ContextInfo] {
        &self.contexts
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
