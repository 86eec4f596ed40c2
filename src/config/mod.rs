// ABOUTME: Structure resolver configuration, loadable from YAML.
// ABOUTME: Replaces global suffix/filter registries with an explicit value.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_FILENAME: &str = "gantry.yml";
pub const CONFIG_FILENAME_ALT: &str = "gantry.yaml";

const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration driving the built-in structure recognizers.
///
/// No global suffix or metadata-directory registries: everything the
/// recognizers consult (descriptor suffix sets, metadata directory names,
/// recursion cap) is an explicit value here, passed into the resolver at
/// construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureConfig {
    /// Directory names searched for descriptors, in priority order.
    #[serde(default = "default_metadata_paths")]
    pub metadata_paths: Vec<String>,

    /// Leaf-name suffixes treated as deployment descriptors.
    #[serde(default = "default_descriptor_suffixes")]
    pub descriptor_suffixes: Vec<String>,

    /// Node-name suffixes treated as nested archives worth recursing into.
    #[serde(default = "default_archive_suffixes")]
    pub archive_suffixes: Vec<String>,

    /// Child names skipped entirely during discovery.
    #[serde(default)]
    pub ignored_names: Vec<String>,

    /// Recursion cap guarding against malformed or self-referential
    /// container nesting.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_metadata_paths() -> Vec<String> {
    vec!["meta-inf".to_string()]
}

fn default_descriptor_suffixes() -> Vec<String> {
    vec![".xml".to_string()]
}

fn default_archive_suffixes() -> Vec<String> {
    vec![
        ".ear".to_string(),
        ".jar".to_string(),
        ".rar".to_string(),
        ".sar".to_string(),
        ".war".to_string(),
        ".zip".to_string(),
    ]
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            metadata_paths: default_metadata_paths(),
            descriptor_suffixes: default_descriptor_suffixes(),
            archive_suffixes: default_archive_suffixes(),
            ignored_names: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StructureConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: StructureConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        if self.metadata_paths.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidConfig("metadata_paths entries cannot be empty".to_string()));
        }
        for suffix in self.descriptor_suffixes.iter().chain(self.archive_suffixes.iter()) {
            if !suffix.starts_with('.') || suffix.len() < 2 {
                return Err(Error::InvalidConfig(format!(
                    "suffix must start with '.' and name an extension: {suffix:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn is_archive_name(&self, name: &str) -> bool {
        self.archive_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    pub fn is_descriptor_name(&self, name: &str) -> bool {
        self.descriptor_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_names.iter().any(|n| n == name)
    }
}
