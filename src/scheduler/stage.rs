// ABOUTME: Totally ordered, user-extensible sequence of named stages.
// ABOUTME: Custom stages insert between built-ins by relative position.

use super::error::SchedulerError;

pub const PARSE: &str = "parse";
pub const POST_PARSE: &str = "post-parse";
pub const DESCRIBE: &str = "describe";
pub const CLASSLOADER: &str = "classloader";
pub const POST_CLASSLOADER: &str = "post-classloader";
pub const REAL: &str = "real";
pub const INSTALLED: &str = "installed";

/// The ordered stage sequence. Stages are identified by name and compared
/// by position, so custom stages can slot in anywhere.
#[derive(Debug, Clone)]
pub struct Stages {
    names: Vec<String>,
}

impl Stages {
    /// The built-in pipeline:
    /// parse → post-parse → describe → classloader → post-classloader →
    /// real → installed.
    pub fn builtin() -> Self {
        Self {
            names: [
                PARSE,
                POST_PARSE,
                DESCRIBE,
                CLASSLOADER,
                POST_CLASSLOADER,
                REAL,
                INSTALLED,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Numeric position of a stage; the scheduling order key.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn insert_after(&mut self, anchor: &str, name: &str) -> Result<(), SchedulerError> {
        self.insert_at_offset(anchor, name, 1)
    }

    pub fn insert_before(&mut self, anchor: &str, name: &str) -> Result<(), SchedulerError> {
        self.insert_at_offset(anchor, name, 0)
    }

    fn insert_at_offset(
        &mut self,
        anchor: &str,
        name: &str,
        offset: usize,
    ) -> Result<(), SchedulerError> {
        if self.index_of(name).is_some() {
            return Err(SchedulerError::DuplicateStage(name.to_string()));
        }
        let anchor_index = self
            .index_of(anchor)
            .ok_or_else(|| SchedulerError::UnknownStage(anchor.to_string()))?;
        self.names.insert(anchor_index + offset, name.to_string());
        Ok(())
    }
}

impl Default for Stages {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_order_is_fixed() {
        let stages = Stages::builtin();
        assert_eq!(stages.index_of(PARSE), Some(0));
        assert_eq!(stages.index_of(INSTALLED), Some(6));
        assert!(stages.index_of(CLASSLOADER) < stages.index_of(POST_CLASSLOADER));
    }

    #[test]
    fn custom_stage_inserts_between_builtins() {
        let mut stages = Stages::builtin();
        stages.insert_after(DESCRIBE, "aop").unwrap();
        assert_eq!(
            stages.index_of("aop").unwrap(),
            stages.index_of(DESCRIBE).unwrap() + 1
        );
        assert!(stages.index_of("aop") < stages.index_of(CLASSLOADER));

        stages.insert_before(PARSE, "pre-parse").unwrap();
        assert_eq!(stages.index_of("pre-parse"), Some(0));
    }

    #[test]
    fn unknown_anchor_and_duplicate_are_errors() {
        let mut stages = Stages::builtin();
        assert!(matches!(
            stages.insert_after("nope", "x"),
            Err(SchedulerError::UnknownStage(_))
        ));
        assert!(matches!(
            stages.insert_after(PARSE, DESCRIBE),
            Err(SchedulerError::DuplicateStage(_))
        ));
    }
}
