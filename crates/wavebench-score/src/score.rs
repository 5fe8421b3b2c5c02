//! Tiered score records and composite scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::tier::Tier;

/// Per-tier weights for composite scoring, keyed by [`Tier`].
///
/// Sourced from external configuration (keys `"t1".."t4"`); the external
/// config is expected to make the weights sum to 1.0, but nothing here
/// requires that structurally.
pub type WeightMap = BTreeMap<Tier, f64>;

/// Identifier of a treatment. The experiment labels treatments either by
/// number (`1`) or by string (`"2a"`), and both forms appear in persisted
/// records, so the distinction is kept rather than normalized away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreatmentId {
    /// Numeric label
    Number(u32),
    /// String label such as `"2a"`
    Label(String),
}

impl std::fmt::Display for TreatmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreatmentId::Number(n) => write!(f, "{n}"),
            TreatmentId::Label(s) => f.write_str(s),
        }
    }
}

impl From<u32> for TreatmentId {
    fn from(n: u32) -> Self {
        TreatmentId::Number(n)
    }
}

impl From<&str> for TreatmentId {
    fn from(s: &str) -> Self {
        TreatmentId::Label(s.to_string())
    }
}

impl From<String> for TreatmentId {
    fn from(s: String) -> Self {
        TreatmentId::Label(s)
    }
}

/// Tiered acceptance test outcome for one feature under one treatment.
///
/// Produced once by the report parser, immutable thereafter, persisted as
/// part of a treatment's score list. Field layout matches the on-disk
/// record format (`t1_passed`, `t1_total`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredScore {
    /// Feature identifier, e.g. `"F3"`
    pub feature_id: String,
    /// Treatment the patch under test came from
    pub treatment_id: TreatmentId,
    /// T1 tests passed
    #[serde(default)]
    pub t1_passed: u32,
    /// T1 tests total
    #[serde(default)]
    pub t1_total: u32,
    /// T2 tests passed
    #[serde(default)]
    pub t2_passed: u32,
    /// T2 tests total
    #[serde(default)]
    pub t2_total: u32,
    /// T3 tests passed
    #[serde(default)]
    pub t3_passed: u32,
    /// T3 tests total
    #[serde(default)]
    pub t3_total: u32,
    /// T4 tests passed
    #[serde(default)]
    pub t4_passed: u32,
    /// T4 tests total
    #[serde(default)]
    pub t4_total: u32,
}

impl TieredScore {
    /// Create an all-zero score for a feature/treatment pair.
    #[must_use]
    pub fn empty(feature_id: impl Into<String>, treatment_id: impl Into<TreatmentId>) -> Self {
        Self {
            feature_id: feature_id.into(),
            treatment_id: treatment_id.into(),
            t1_passed: 0,
            t1_total: 0,
            t2_passed: 0,
            t2_total: 0,
            t3_passed: 0,
            t3_total: 0,
            t4_passed: 0,
            t4_total: 0,
        }
    }

    /// `(passed, total)` for a tier.
    #[inline]
    #[must_use]
    pub fn tier_counts(&self, tier: Tier) -> (u32, u32) {
        match tier {
            Tier::T1 => (self.t1_passed, self.t1_total),
            Tier::T2 => (self.t2_passed, self.t2_total),
            Tier::T3 => (self.t3_passed, self.t3_total),
            Tier::T4 => (self.t4_passed, self.t4_total),
        }
    }

    pub(crate) fn tier_counts_mut(&mut self, tier: Tier) -> (&mut u32, &mut u32) {
        match tier {
            Tier::T1 => (&mut self.t1_passed, &mut self.t1_total),
            Tier::T2 => (&mut self.t2_passed, &mut self.t2_total),
            Tier::T3 => (&mut self.t3_passed, &mut self.t3_total),
            Tier::T4 => (&mut self.t4_passed, &mut self.t4_total),
        }
    }

    /// Pass rate for a tier, as a fraction in `[0.0, 1.0]`.
    ///
    /// A tier with zero tests scores exactly `0.0`. An absent tier must not
    /// inflate results, so the policy deflates rather than treating the
    /// tier as perfect or undefined.
    #[must_use]
    pub fn tier_score(&self, tier: Tier) -> f64 {
        let (passed, total) = self.tier_counts(tier);
        if total > 0 {
            f64::from(passed) / f64::from(total)
        } else {
            0.0
        }
    }

    /// Weighted composite score: `Σ tier_score(t) × weights[t]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::MissingWeight`] if any tier has no entry in
    /// `weights`. A missing weight is a configuration bug; defaulting it to
    /// zero would silently corrupt every composite derived from it.
    pub fn composite(&self, weights: &WeightMap) -> Result<f64, ScoreError> {
        let mut total = 0.0;
        for tier in Tier::ALL {
            let weight = weights
                .get(&tier)
                .copied()
                .ok_or(ScoreError::MissingWeight(tier))?;
            total += self.tier_score(tier) * weight;
        }
        Ok(total)
    }

    /// Check the structural invariant `passed <= total` for every tier.
    ///
    /// Parser-produced scores hold this by construction; records loaded
    /// from disk should be checked before use.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        Tier::ALL
            .iter()
            .all(|&t| self.tier_counts(t).0 <= self.tier_counts(t).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_weights() -> WeightMap {
        WeightMap::from([
            (Tier::T1, 0.15),
            (Tier::T2, 0.35),
            (Tier::T3, 0.30),
            (Tier::T4, 0.20),
        ])
    }

    fn full_marks(feature: &str) -> TieredScore {
        TieredScore {
            t1_passed: 3,
            t1_total: 3,
            t2_passed: 5,
            t2_total: 5,
            t3_passed: 3,
            t3_total: 3,
            t4_passed: 2,
            t4_total: 2,
            ..TieredScore::empty(feature, "0a")
        }
    }

    #[test]
    fn perfect_score_composites_to_one() {
        let score = full_marks("F1");
        assert!((score.composite(&default_weights()).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_passes_composite_to_zero() {
        let score = TieredScore {
            t1_total: 3,
            t2_total: 5,
            t3_total: 3,
            t4_total: 2,
            ..TieredScore::empty("F1", "0a")
        };
        assert_eq!(score.composite(&default_weights()).unwrap(), 0.0);
    }

    #[test]
    fn empty_tier_scores_zero_not_nan() {
        let score = TieredScore::empty("F1", 1u32);
        for tier in Tier::ALL {
            let s = score.tier_score(tier);
            assert_eq!(s, 0.0);
            assert!(!s.is_nan());
        }
    }

    #[test]
    fn weighted_combination() {
        let score = TieredScore {
            t1_passed: 3,
            t1_total: 3,
            t2_passed: 3,
            t2_total: 5,
            t3_passed: 2,
            t3_total: 3,
            t4_passed: 1,
            t4_total: 2,
            ..TieredScore::empty("F1", "0a")
        };
        let expected = 0.15 + 0.6 * 0.35 + (2.0 / 3.0) * 0.30 + 0.5 * 0.20;
        assert!((score.composite(&default_weights()).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn spec_example_composite() {
        // 3/3 T1, 1/2 T2, zero T3/T4 under the default weights.
        let score = TieredScore {
            t1_passed: 3,
            t1_total: 3,
            t2_passed: 1,
            t2_total: 2,
            ..TieredScore::empty("F1", "0a")
        };
        let composite = score.composite(&default_weights()).unwrap();
        assert!((composite - 0.325).abs() < 1e-9);
    }

    #[test]
    fn missing_weight_is_an_error() {
        let mut weights = default_weights();
        weights.remove(&Tier::T3);
        let err = full_marks("F1").composite(&weights).unwrap_err();
        assert!(matches!(err, ScoreError::MissingWeight(Tier::T3)));
    }

    #[test]
    fn treatment_id_serde_is_untagged() {
        let n: TreatmentId = serde_json::from_str("3").unwrap();
        assert_eq!(n, TreatmentId::Number(3));
        let s: TreatmentId = serde_json::from_str("\"2a\"").unwrap();
        assert_eq!(s, TreatmentId::Label("2a".to_string()));
        assert_eq!(serde_json::to_string(&n).unwrap(), "3");
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"2a\"");
    }

    #[test]
    fn record_roundtrip_is_field_exact() {
        let score = full_marks("F7");
        let json = serde_json::to_string(&score).unwrap();
        let back: TieredScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, score);
    }

    #[test]
    fn consistency_check() {
        assert!(full_marks("F1").is_consistent());
        let bad = TieredScore {
            t2_passed: 4,
            t2_total: 2,
            ..TieredScore::empty("F1", 1u32)
        };
        assert!(!bad.is_consistent());
    }
}
