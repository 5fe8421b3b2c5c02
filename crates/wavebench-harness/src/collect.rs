//! Sequential score collection pipeline.
//!
//! For one treatment: discover its patch files, and for each feature
//! apply the patch to the shared worktree, run the acceptance tests, parse
//! the JUnit report, and revert the worktree - strictly one feature at a
//! time, with the revert running unconditionally after every attempt so the
//! next feature always starts from the pinned state.

use std::path::{Path, PathBuf};

use wavebench_score::{parse_report_file, TieredScore, TreatmentId};

use crate::error::HarnessError;
use crate::runner::AcceptanceRunner;
use crate::store::ScoreStore;
use crate::worktree::Worktree;

/// Patch file path for one treatment x feature under the data directory.
#[must_use]
pub fn patch_path(data_dir: &Path, treatment_id: &TreatmentId, feature_id: &str) -> PathBuf {
    data_dir
        .join("patches")
        .join(format!("treatment-{treatment_id}"))
        .join(format!("{feature_id}.patch"))
}

/// Drives the apply / test / parse / revert cycle for a treatment.
pub struct ScoreCollector<R> {
    data_dir: PathBuf,
    store: ScoreStore,
    runner: R,
}

impl<R: AcceptanceRunner> ScoreCollector<R> {
    /// Collector rooted at an explicit data directory.
    ///
    /// Patches are discovered under `{data_dir}/patches/treatment-{id}/`,
    /// reports land in `{data_dir}/scores/tmp/`, and results persist via a
    /// [`ScoreStore`] over the same root.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, runner: R) -> Self {
        let data_dir = data_dir.into();
        let store = ScoreStore::new(data_dir.clone());
        Self {
            data_dir,
            store,
            runner,
        }
    }

    /// Store this collector persists through.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    /// Collect scores for every feature of `treatment_id` that has a patch.
    ///
    /// Per patch file (sorted by filename for determinism):
    /// 1. A zero-byte patch means "feature not attempted" - skipped before
    ///    any git invocation.
    /// 2. A patch that fails its dry-run (or real) application is skipped;
    ///    no score, no error.
    /// 3. The acceptance runner executes; if it left no report (crashed
    ///    before producing output) the feature is skipped silently. A
    ///    malformed report is logged and skipped, keeping scores already
    ///    collected in this run.
    /// 4. The worktree is reverted after every attempt, on success and
    ///    failure alike, before the next patch is touched.
    ///
    /// Non-empty results are persisted (overwriting the treatment's prior
    /// record) and returned; an empty run returns an empty list without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Propagates subprocess-invocation and revert failures; apply
    /// failures and unusable reports are skips, not errors.
    pub fn collect(
        &self,
        treatment_id: &TreatmentId,
        worktree: &Worktree,
    ) -> Result<Vec<TieredScore>, HarnessError> {
        let patches = self.discover_patches(treatment_id)?;
        if patches.is_empty() {
            tracing::info!(treatment = %treatment_id, "no patches to score");
            return Ok(Vec::new());
        }

        let mut scores = Vec::new();
        for patch in &patches {
            let feature_id = patch
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();

            let len = std::fs::metadata(patch)
                .map_err(|source| HarnessError::Io {
                    path: patch.clone(),
                    source,
                })?
                .len();
            if len == 0 {
                tracing::debug!(feature_id, "zero-byte patch, feature not attempted");
                continue;
            }

            if !worktree.apply_patch(patch)? {
                tracing::info!(feature_id, "patch did not apply, skipping feature");
                // Failed real application can leave partial edits behind.
                worktree.revert()?;
                continue;
            }

            let attempt = self.run_and_parse(&feature_id, treatment_id, worktree);
            // Revert runs before the outcome is inspected so the worktree
            // is clean for the next feature even when the attempt failed.
            worktree.revert()?;

            match attempt {
                Ok(Some(score)) => scores.push(score),
                Ok(None) => {}
                Err(HarnessError::Score(e)) if e.is_malformed() => {
                    tracing::warn!(feature_id, error = %e, "unusable test report, skipping feature");
                }
                Err(e) => return Err(e),
            }
        }

        if scores.is_empty() {
            tracing::info!(treatment = %treatment_id, "collection produced no scores");
        } else {
            self.store.save(&scores, treatment_id)?;
        }
        Ok(scores)
    }

    fn run_and_parse(
        &self,
        feature_id: &str,
        treatment_id: &TreatmentId,
        worktree: &Worktree,
    ) -> Result<Option<TieredScore>, HarnessError> {
        let report_path = self
            .data_dir
            .join("scores")
            .join("tmp")
            .join(format!("{feature_id}.xml"));
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| HarnessError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // A report left over from an earlier run must not be mistaken for
        // this run's output.
        if report_path.exists() {
            std::fs::remove_file(&report_path).map_err(|source| HarnessError::Io {
                path: report_path.clone(),
                source,
            })?;
        }

        self.runner.run(feature_id, worktree.path(), &report_path)?;

        if !report_path.exists() {
            tracing::warn!(feature_id, "runner produced no report, skipping feature");
            return Ok(None);
        }

        let score = parse_report_file(&report_path, feature_id, treatment_id.clone())?;
        Ok(Some(score))
    }

    fn discover_patches(&self, treatment_id: &TreatmentId) -> Result<Vec<PathBuf>, HarnessError> {
        let patch_dir = self
            .data_dir
            .join("patches")
            .join(format!("treatment-{treatment_id}"));
        if !patch_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&patch_dir).map_err(|source| HarnessError::Io {
            path: patch_dir.clone(),
            source,
        })?;

        let mut patches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| HarnessError::Io {
                path: patch_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "patch") {
                patches.push(path);
            }
        }
        patches.sort();
        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_path_follows_convention() {
        let path = patch_path(Path::new("/data"), &TreatmentId::from("0a"), "F3");
        assert_eq!(
            path,
            Path::new("/data/patches/treatment-0a/F3.patch")
        );
    }

    #[test]
    fn numeric_treatment_path() {
        let path = patch_path(Path::new("/data"), &TreatmentId::from(2u32), "F1");
        assert_eq!(path, Path::new("/data/patches/treatment-2/F1.patch"));
    }
}
