// ABOUTME: Validated deployment unit name with path-like segments.
// ABOUTME: The last segment is the unit's simple name.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitNameError {
    #[error("unit name cannot be empty")]
    Empty,

    #[error("unit name cannot start or end with '/'")]
    DanglingSeparator,

    #[error("unit name cannot contain empty segments")]
    EmptySegment,

    #[error("invalid character in unit name: {0:?}")]
    InvalidChar(char),
}

/// Name of a deployment unit.
///
/// Top-level units carry the name they were registered under; nested units
/// and components append `/`-separated segments, so `app.ear/lib/util.jar`
/// has the simple name `util.jar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitName(String);

impl UnitName {
    pub fn new(value: &str) -> Result<Self, UnitNameError> {
        if value.is_empty() {
            return Err(UnitNameError::Empty);
        }

        if value.starts_with('/') || value.ends_with('/') {
            return Err(UnitNameError::DanglingSeparator);
        }

        if value.split('/').any(str::is_empty) {
            return Err(UnitNameError::EmptySegment);
        }

        for c in value.chars() {
            if c.is_control() {
                return Err(UnitNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the name.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Child name scoped under this one; the segment is validated like
    /// any other.
    pub fn child(&self, segment: &str) -> Result<Self, UnitNameError> {
        Self::new(&format!("{}/{}", self.0, segment))
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for UnitName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        UnitName::new(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_is_last_segment() {
        let name = UnitName::new("app.ear/lib/util.jar").unwrap();
        assert_eq!(name.simple_name(), "util.jar");
    }

    #[test]
    fn top_level_simple_name_is_whole_name() {
        let name = UnitName::new("app.ear").unwrap();
        assert_eq!(name.simple_name(), "app.ear");
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(UnitName::new(""), Err(UnitNameError::Empty)));
    }

    #[test]
    fn rejects_dangling_separator() {
        assert!(matches!(
            UnitName::new("/app.ear"),
            Err(UnitNameError::DanglingSeparator)
        ));
        assert!(matches!(
            UnitName::new("app.ear/"),
            Err(UnitNameError::DanglingSeparator)
        ));
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(matches!(
            UnitName::new("app.ear//x"),
            Err(UnitNameError::EmptySegment)
        ));
    }

    #[test]
    fn child_appends_segment() {
        let parent = UnitName::new("app.ear").unwrap();
        let child = parent.child("sub.war").unwrap();
        assert_eq!(child.as_str(), "app.ear/sub.war");
        assert_eq!(child.simple_name(), "sub.war");
    }
}
