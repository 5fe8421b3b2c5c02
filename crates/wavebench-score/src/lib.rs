//! Wavebench Score - tiered acceptance scoring core
//!
//! Pure scoring math for the treatment experiment:
//! - Classifies acceptance testcases into quality tiers (T1 basic through
//!   T4 smoke) by classname markers
//! - Parses JUnit XML reports into per-feature [`TieredScore`]s, in
//!   single-feature and cumulative (multi-feature) modes
//! - Computes weighted composite scores and per-treatment summaries
//! - Runs the variance-based second-wave decision gate
//!
//! Everything here operates on in-memory data (plus optional file-reading
//! conveniences); git and test-runner side effects live in
//! `wavebench-harness`.
//!
//! # Example
//!
//! ```
//! use wavebench_score::{parse_report, Tier, WeightMap};
//!
//! let xml = r#"<testsuites><testsuite tests="2">
//!     <testcase classname="t.TestT1Basic" name="a"/>
//!     <testcase classname="t.TestT2EdgeCases" name="b">
//!       <failure>assert</failure>
//!     </testcase>
//! </testsuite></testsuites>"#;
//!
//! let score = parse_report(xml, "F1", "0a")?;
//! assert_eq!(score.t1_passed, 1);
//!
//! let weights = WeightMap::from([
//!     (Tier::T1, 0.15),
//!     (Tier::T2, 0.35),
//!     (Tier::T3, 0.30),
//!     (Tier::T4, 0.20),
//! ]);
//! assert!((score.composite(&weights)? - 0.15).abs() < 1e-9);
//! # Ok::<(), wavebench_score::ScoreError>(())
//! ```

#![warn(unreachable_pub)]

pub mod aggregate;
pub mod error;
pub mod report;
pub mod score;
pub mod tier;
pub mod wave;

// Re-exports for convenience
pub use aggregate::{summarize_all, summarize_treatment, TreatmentSummary};
pub use error::ScoreError;
pub use report::{
    extract_feature_id, parse_cumulative, parse_cumulative_file, parse_report, parse_report_file,
};
pub use score::{TieredScore, TreatmentId, WeightMap};
pub use tier::Tier;
pub use wave::{evaluate_second_wave, WaveDecision};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
