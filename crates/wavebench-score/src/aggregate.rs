//! Per-treatment summary statistics over stored scores.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ScoreError;
use crate::score::{TieredScore, TreatmentId, WeightMap};

/// Summary of one treatment's composite scores.
///
/// Derived fresh from stored [`TieredScore`] lists on request, never
/// persisted. An empty score list is a valid state (treatment not yet
/// scored) and yields the all-zero summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentSummary {
    /// Treatment the scores belong to; `None` when no scores exist yet
    pub treatment_id: Option<TreatmentId>,
    /// Number of features scored
    pub n_features: usize,
    /// Mean composite across features
    pub mean_composite: f64,
    /// Lowest feature composite
    pub min_composite: f64,
    /// Highest feature composite
    pub max_composite: f64,
    /// Composite per feature id
    pub per_feature: BTreeMap<String, f64>,
}

impl TreatmentSummary {
    fn empty() -> Self {
        Self {
            treatment_id: None,
            n_features: 0,
            mean_composite: 0.0,
            min_composite: 0.0,
            max_composite: 0.0,
            per_feature: BTreeMap::new(),
        }
    }
}

/// Summarize one treatment's scores under the given weights.
///
/// # Errors
///
/// Propagates [`ScoreError::MissingWeight`] from composite scoring.
pub fn summarize_treatment(
    scores: &[TieredScore],
    weights: &WeightMap,
) -> Result<TreatmentSummary, ScoreError> {
    let Some(first) = scores.first() else {
        return Ok(TreatmentSummary::empty());
    };

    let mut per_feature = BTreeMap::new();
    for score in scores {
        per_feature.insert(score.feature_id.clone(), score.composite(weights)?);
    }

    let composites: Vec<f64> = per_feature.values().copied().collect();
    #[allow(clippy::cast_precision_loss)]
    let mean = composites.iter().sum::<f64>() / composites.len() as f64;
    let min = composites.iter().copied().fold(f64::INFINITY, f64::min);
    let max = composites.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(TreatmentSummary {
        treatment_id: Some(first.treatment_id.clone()),
        n_features: scores.len(),
        mean_composite: mean,
        min_composite: min,
        max_composite: max,
        per_feature,
    })
}

/// Summarize every treatment in a loaded score collection.
///
/// # Errors
///
/// Propagates [`ScoreError::MissingWeight`] from composite scoring.
pub fn summarize_all(
    all_scores: &BTreeMap<String, Vec<TieredScore>>,
    weights: &WeightMap,
) -> Result<BTreeMap<String, TreatmentSummary>, ScoreError> {
    let mut summaries = BTreeMap::new();
    for (treatment_id, scores) in all_scores {
        summaries.insert(treatment_id.clone(), summarize_treatment(scores, weights)?);
    }
    Ok(summaries)
}
