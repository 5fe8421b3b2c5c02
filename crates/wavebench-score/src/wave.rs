//! Second-wave decision gate.
//!
//! After a full wave of the experiment, the gate looks at how much the
//! treatments' mean composites disagree. High inter-treatment variance
//! (coefficient of variation above a configured threshold) means the
//! treatment dimensions matter and a second wave is worth running.

use std::collections::BTreeMap;

use crate::aggregate::summarize_all;
use crate::error::ScoreError;
use crate::score::{TieredScore, WeightMap};

/// Outcome of the second-wave evaluation.
///
/// The reasoning string is the experiment's only human-facing decision
/// artifact; it always carries the computed CV, the threshold, and the
/// min/mean/max/SD of the treatment means so it can stand alone in a
/// report.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveDecision {
    /// Whether a second wave is recommended
    pub recommend: bool,
    /// Self-contained explanation of the decision
    pub reasoning: String,
}

/// Evaluate whether a second experimental wave is warranted.
///
/// Computes each treatment's mean composite, then the coefficient of
/// variation (population SD over grand mean) of those means. Recommends a
/// second wave iff `cv > cv_threshold` (strict: exactly at threshold does
/// not recommend). With no treatments scored, or a grand mean of exactly
/// zero, the gate declines with an explanatory message instead of failing.
///
/// # Errors
///
/// Propagates [`ScoreError::MissingWeight`] from composite scoring.
pub fn evaluate_second_wave(
    all_scores: &BTreeMap<String, Vec<TieredScore>>,
    weights: &WeightMap,
    cv_threshold: f64,
) -> Result<WaveDecision, ScoreError> {
    if all_scores.is_empty() {
        return Ok(WaveDecision {
            recommend: false,
            reasoning: format!(
                "No treatment scores available - insufficient data for a wave 2 \
                 decision. CV threshold: {cv_threshold:.2}."
            ),
        });
    }

    let summaries = summarize_all(all_scores, weights)?;
    let means: Vec<f64> = summaries.values().map(|s| s.mean_composite).collect();

    #[allow(clippy::cast_precision_loss)]
    let n = means.len() as f64;
    let grand_mean = means.iter().sum::<f64>() / n;
    if grand_mean == 0.0 {
        return Ok(WaveDecision {
            recommend: false,
            reasoning: format!(
                "All treatments scored 0.0 - no variance to analyze. \
                 CV threshold: {cv_threshold:.2}."
            ),
        });
    }

    let variance = means.iter().map(|m| (m - grand_mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    let cv = std / grand_mean;

    let recommend = cv > cv_threshold;
    let action = if recommend {
        "RECOMMEND wave 2"
    } else {
        "DO NOT recommend wave 2"
    };
    let relation = if recommend { ">" } else { "<=" };
    let min = means.iter().copied().fold(f64::INFINITY, f64::min);
    let max = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    tracing::debug!(cv, cv_threshold, grand_mean, std, "wave 2 gate evaluated");

    Ok(WaveDecision {
        recommend,
        reasoning: format!(
            "{action}. CV = {cv:.4} ({relation} threshold {cv_threshold:.2}). \
             Mean composite across {} treatments: {grand_mean:.4} \
             (min={min:.4}, max={max:.4}, SD={std:.4}).",
            means.len()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::TieredScore;
    use crate::tier::Tier;

    fn weights() -> WeightMap {
        WeightMap::from([
            (Tier::T1, 0.25),
            (Tier::T2, 0.25),
            (Tier::T3, 0.25),
            (Tier::T4, 0.25),
        ])
    }

    /// Score whose composite under equal weights is `passed / 4`.
    fn uniform_score(treatment: &str, passed: u32) -> TieredScore {
        TieredScore {
            t1_passed: passed.min(1),
            t1_total: 1,
            t2_passed: passed.saturating_sub(1).min(1),
            t2_total: 1,
            t3_passed: passed.saturating_sub(2).min(1),
            t3_total: 1,
            t4_passed: passed.saturating_sub(3).min(1),
            t4_total: 1,
            ..TieredScore::empty("F1", treatment)
        }
    }

    #[test]
    fn no_scores_declines_with_explanation() {
        let decision = evaluate_second_wave(&BTreeMap::new(), &weights(), 0.10).unwrap();
        assert!(!decision.recommend);
        assert!(decision.reasoning.contains("insufficient data"));
        assert!(decision.reasoning.contains("0.10"));
    }

    #[test]
    fn all_zero_means_declines_without_dividing() {
        let mut all = BTreeMap::new();
        all.insert("0a".to_string(), vec![uniform_score("0a", 0)]);
        all.insert("1".to_string(), vec![uniform_score("1", 0)]);
        let decision = evaluate_second_wave(&all, &weights(), 0.10).unwrap();
        assert!(!decision.recommend);
        assert!(decision.reasoning.contains("no variance to analyze"));
    }

    #[test]
    fn identical_treatments_have_zero_cv() {
        let mut all = BTreeMap::new();
        all.insert("0a".to_string(), vec![uniform_score("0a", 2)]);
        all.insert("1".to_string(), vec![uniform_score("1", 2)]);
        let decision = evaluate_second_wave(&all, &weights(), 0.10).unwrap();
        assert!(!decision.recommend);
        assert!(decision.reasoning.contains("CV = 0.0000"));
    }

    #[test]
    fn divergent_treatments_trigger_recommendation() {
        // Means 1.0 and 0.0: grand mean 0.5, SD 0.5, CV 1.0 > 0.10.
        let mut all = BTreeMap::new();
        all.insert("0a".to_string(), vec![uniform_score("0a", 4)]);
        all.insert("1".to_string(), vec![uniform_score("1", 0)]);
        let decision = evaluate_second_wave(&all, &weights(), 0.10).unwrap();
        assert!(decision.recommend);
        assert!(decision.reasoning.contains("RECOMMEND wave 2"));
        assert!(decision.reasoning.contains("CV = 1.0000"));
        assert!(decision.reasoning.contains("SD=0.5000"));
    }

    #[test]
    fn cv_exactly_at_threshold_does_not_recommend() {
        // Means 0.75 and 0.25: grand mean 0.5, SD 0.25, CV 0.5.
        let mut all = BTreeMap::new();
        all.insert("0a".to_string(), vec![uniform_score("0a", 3)]);
        all.insert("1".to_string(), vec![uniform_score("1", 1)]);
        let decision = evaluate_second_wave(&all, &weights(), 0.5).unwrap();
        assert!(!decision.recommend);
        let decision = evaluate_second_wave(&all, &weights(), 0.49).unwrap();
        assert!(decision.recommend);
    }

    #[test]
    fn reasoning_is_self_contained() {
        let mut all = BTreeMap::new();
        all.insert("0a".to_string(), vec![uniform_score("0a", 3)]);
        all.insert("1".to_string(), vec![uniform_score("1", 1)]);
        let decision = evaluate_second_wave(&all, &weights(), 0.10).unwrap();
        for needle in ["CV =", "threshold", "min=", "max=", "SD=", "2 treatments"] {
            assert!(
                decision.reasoning.contains(needle),
                "missing {needle:?} in {:?}",
                decision.reasoning
            );
        }
    }

    #[test]
    fn missing_weight_propagates() {
        let mut all = BTreeMap::new();
        all.insert("0a".to_string(), vec![uniform_score("0a", 2)]);
        let mut w = weights();
        w.remove(&Tier::T1);
        assert!(evaluate_second_wave(&all, &w, 0.10).is_err());
    }
}
