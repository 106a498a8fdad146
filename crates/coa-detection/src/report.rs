//! Outcome counts for a detection pass

use coa_artifact::Artifact;
use serde::Serialize;
use std::ops::AddAssign;

/// What a detection pass did
///
/// Reports from several passes can be merged with `+=`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Artifacts as stored by the registry
    pub registered: Vec<Artifact>,
    /// Candidates already cataloged (or otherwise not eligible)
    pub skipped: usize,
    /// Candidates that could not be processed
    pub failed: usize,
}

impl DetectionReport {
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Report for a pass that failed as a whole
    #[inline]
    #[must_use]
    pub fn failure() -> Self {
        Self {
            failed: 1,
            ..Self::default()
        }
    }

    /// Number of artifacts registered
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.registered.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.skipped == 0 && self.failed == 0
    }
}

impl AddAssign for DetectionReport {
    fn add_assign(&mut self, other: Self) {
        self.registered.extend(other.registered);
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}
