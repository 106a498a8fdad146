//! Aggregate registry statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of registry contents
///
/// Map keys are the wire names of the type enums (`data_fetch`, `TEXT`, ...)
/// so the snapshot serializes the same way references do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of cataloged artifacts
    pub total_artifacts: usize,
    /// Number of distinct producing tasks
    pub unique_tasks: usize,
    /// Count per artifact type
    pub by_artifact_type: BTreeMap<String, usize>,
    /// Count per media type
    pub by_media_type: BTreeMap<String, usize>,
}

impl RegistryStats {
    /// Count for one artifact type wire name (zero if absent)
    #[inline]
    #[must_use]
    pub fn count_of_type(&self, artifact_type: &str) -> usize {
        self.by_artifact_type.get(artifact_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_type_counts_zero() {
        let stats = RegistryStats::default();
        assert_eq!(stats.count_of_type("plot"), 0);
    }
}
