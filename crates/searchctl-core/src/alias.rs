//! Alias state.

use serde::{Deserialize, Serialize};

/// The engine's read/write alias targets at a point in time.
///
/// A healthy system has both sequences resolve to a single, identical index;
/// the control plane never assumes this and always reads both explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasState {
    #[serde(rename = "readTargets")]
    pub read_targets: Vec<String>,
    #[serde(rename = "writeTargets")]
    pub write_targets: Vec<String>,
}

impl AliasState {
    #[must_use]
    pub fn new(read_targets: Vec<String>, write_targets: Vec<String>) -> Self {
        Self {
            read_targets,
            write_targets,
        }
    }

    /// True iff both read and write targets resolve to exactly `[index]`.
    #[must_use]
    pub fn points_only_to(&self, index: &str) -> bool {
        self.read_targets == [index.to_string()] && self.write_targets == [index.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_only_to_requires_both_sequences_exact() {
        let state = AliasState::new(vec!["docs_v2".into()], vec!["docs_v2".into()]);
        assert!(state.points_only_to("docs_v2"));
        assert!(!state.points_only_to("docs_v1"));
    }

    #[test]
    fn points_only_to_false_when_write_has_extra_target() {
        let state = AliasState::new(
            vec!["docs_v2".into()],
            vec!["docs_v2".into(), "docs_v3".into()],
        );
        assert!(!state.points_only_to("docs_v2"));
    }
}
