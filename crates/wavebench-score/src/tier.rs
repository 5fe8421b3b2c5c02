//! Acceptance test tiers and classname-based classification.
//!
//! Acceptance suites name their test classes by tier (`TestT1Basic`,
//! `TestT2EdgeCases`, `TestT3Quality`, `TestT4Smoke`). Classification is
//! plain substring containment against one marker per tier; testcases whose
//! classname matches no marker belong to no tier and are excluded from all
//! counts.

use serde::{Deserialize, Serialize};

/// Ordinal quality tier for acceptance tests.
///
/// T1 covers basic correctness, T4 full integration smoke tests.
/// Serializes as `"t1".."t4"`, matching the external weight-config keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Basic correctness
    T1,
    /// Edge cases
    T2,
    /// Quality (dtype preservation, performance, etc.)
    T3,
    /// Integration smoke
    T4,
}

/// Classname markers, one per tier, checked in declaration order.
const TIER_MARKERS: [(&str, Tier); 4] = [
    ("TestT1", Tier::T1),
    ("TestT2", Tier::T2),
    ("TestT3", Tier::T3),
    ("TestT4", Tier::T4),
];

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 4] = [Tier::T1, Tier::T2, Tier::T3, Tier::T4];

    /// Classify a testcase classname into a tier.
    ///
    /// First match wins, checked T1 through T4. The markers are mutually
    /// exclusive substrings, so the order is immaterial in practice but
    /// fixed for determinism. Returns `None` for classnames outside the
    /// tiered acceptance suites.
    #[must_use]
    pub fn classify(classname: &str) -> Option<Tier> {
        TIER_MARKERS
            .iter()
            .find(|(marker, _)| classname.contains(marker))
            .map(|&(_, tier)| tier)
    }

    /// Stable lowercase key (`"t1".."t4"`), as used in weight configs and
    /// persisted records.
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Tier::T1 => "t1",
            Tier::T2 => "t2",
            Tier::T3 => "t3",
            Tier::T4 => "t4",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_tier() {
        assert_eq!(
            Tier::classify("tests.acceptance.test_f1_serde.TestT1Basic"),
            Some(Tier::T1)
        );
        assert_eq!(
            Tier::classify("tests.acceptance.test_f1_serde.TestT2EdgeCases"),
            Some(Tier::T2)
        );
        assert_eq!(
            Tier::classify("tests.acceptance.test_f1_serde.TestT3Quality"),
            Some(Tier::T3)
        );
        assert_eq!(
            Tier::classify("tests.acceptance.test_f1_serde.TestT4Smoke"),
            Some(Tier::T4)
        );
    }

    #[test]
    fn unknown_classname_has_no_tier() {
        assert_eq!(Tier::classify("tests.unit.test_config.TestFoo"), None);
        assert_eq!(Tier::classify(""), None);
    }

    #[test]
    fn keys_are_stable() {
        let keys: Vec<&str> = Tier::ALL.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn serde_roundtrip_uses_lowercase_keys() {
        let json = serde_json::to_string(&Tier::T2).unwrap();
        assert_eq!(json, "\"t2\"");
        let tier: Tier = serde_json::from_str("\"t4\"").unwrap();
        assert_eq!(tier, Tier::T4);
    }

    #[test]
    fn display_matches_key() {
        assert_eq!(Tier::T3.to_string(), "t3");
    }
}
