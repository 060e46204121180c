//! Timestamp-based staleness check.

use std::fs;
use std::path::Path;

/// Outcome of comparing a source file with its build target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDecision {
    Rebuild,
    UpToDate,
}

impl BuildDecision {
    pub fn is_rebuild(self) -> bool {
        self == Self::Rebuild
    }
}

/// Decide whether `target` has to be built from `source`.
///
/// A missing target or a missing source both mean `Rebuild`; a missing source
/// then fails in the copy or transcode step. Otherwise the target is rebuilt
/// only when the source modification time is strictly later.
pub fn decide(source: &Path, target: &Path) -> BuildDecision {
    let Some(target_meta) = fs::metadata(target).ok().filter(|m| m.is_file()) else {
        return BuildDecision::Rebuild;
    };
    let Some(source_meta) = fs::metadata(source).ok().filter(|m| m.is_file()) else {
        return BuildDecision::Rebuild;
    };

    match (source_meta.modified(), target_meta.modified()) {
        (Ok(source_time), Ok(target_time)) if source_time <= target_time => {
            BuildDecision::UpToDate
        }
        _ => BuildDecision::Rebuild,
    }
}

/// Shorthand for `decide(..).is_rebuild()`
pub fn needs_rebuild(source: &Path, target: &Path) -> bool {
    decide(source, target).is_rebuild()
}
