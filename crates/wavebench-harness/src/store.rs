//! Score persistence.
//!
//! One JSON document per treatment under `{data_dir}/scores/`, named
//! `treatment-{id}.json`, holding the treatment's full score list. Saves
//! are whole-record overwrites; there is no merge or partial update. The
//! data directory is explicit configuration - no default path is resolved
//! at load time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use wavebench_score::{TieredScore, TreatmentId};

use crate::error::HarnessError;

static RECORD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^treatment-(.+)\.json$").expect("record name regex"));

/// Flat per-treatment score persistence rooted at an explicit data dir.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    data_dir: PathBuf,
}

impl ScoreStore {
    /// Store rooted at `data_dir`; records live in `{data_dir}/scores/`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Directory holding the score records.
    #[must_use]
    pub fn scores_dir(&self) -> PathBuf {
        self.data_dir.join("scores")
    }

    /// Record path for one treatment.
    #[must_use]
    pub fn record_path(&self, treatment_id: &TreatmentId) -> PathBuf {
        self.scores_dir().join(format!("treatment-{treatment_id}.json"))
    }

    /// Persist a treatment's scores, overwriting any prior record.
    ///
    /// Creates the storage directory if absent. Returns the record path.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Io`] on directory-creation or write failure.
    pub fn save(
        &self,
        scores: &[TieredScore],
        treatment_id: &TreatmentId,
    ) -> Result<PathBuf, HarnessError> {
        let dir = self.scores_dir();
        std::fs::create_dir_all(&dir).map_err(|source| HarnessError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = self.record_path(treatment_id);
        let json = serde_json::to_string_pretty(scores).map_err(|e| HarnessError::CorruptRecord {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|source| HarnessError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            treatment = %treatment_id,
            n_scores = scores.len(),
            path = %path.display(),
            "scores saved"
        );
        Ok(path)
    }

    /// Load one treatment's scores.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ScoresNotFound`] when no record exists (expected
    /// absence, callers branch on it), [`HarnessError::CorruptRecord`]
    /// when the record exists but does not parse or violates
    /// `passed <= total`.
    pub fn load(&self, treatment_id: &TreatmentId) -> Result<Vec<TieredScore>, HarnessError> {
        let path = self.record_path(treatment_id);
        if !path.exists() {
            return Err(HarnessError::ScoresNotFound {
                treatment_id: treatment_id.to_string(),
                path,
            });
        }
        read_record(&path)
    }

    /// Load every persisted treatment record, keyed by treatment id as a
    /// string.
    ///
    /// Returns an empty map when the storage directory itself does not
    /// exist. Files not matching the record naming convention are ignored.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Io`] on directory-read failure,
    /// [`HarnessError::CorruptRecord`] for a matching record that does not
    /// parse.
    pub fn load_all(&self) -> Result<BTreeMap<String, Vec<TieredScore>>, HarnessError> {
        let dir = self.scores_dir();
        if !dir.is_dir() {
            return Ok(BTreeMap::new());
        }

        let entries = std::fs::read_dir(&dir).map_err(|source| HarnessError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut result = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| HarnessError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(caps) = RECORD_NAME.captures(&name) else {
                continue;
            };
            let treatment_id = caps[1].to_string();
            result.insert(treatment_id, read_record(&entry.path())?);
        }
        Ok(result)
    }
}

fn read_record(path: &Path) -> Result<Vec<TieredScore>, HarnessError> {
    let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scores: Vec<TieredScore> =
        serde_json::from_str(&text).map_err(|e| HarnessError::CorruptRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if let Some(bad) = scores.iter().find(|s| !s.is_consistent()) {
        return Err(HarnessError::CorruptRecord {
            path: path.to_path_buf(),
            reason: format!(
                "feature {} has a tier with passed > total",
                bad.feature_id
            ),
        });
    }
    Ok(scores)
}
