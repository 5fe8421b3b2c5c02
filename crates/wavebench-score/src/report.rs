//! JUnit XML report parsing.
//!
//! The external test runner emits one JUnit-style XML document per run.
//! Every `<testcase>` carries a `classname` attribute used for tier
//! classification (and, in cumulative reports, feature attribution); a
//! nested `<failure>` or `<error>` element marks the case as failed.
//!
//! Two traversal modes:
//! - single-feature: the whole report belongs to one known feature;
//! - cumulative: one combined report spans several features, and each
//!   testcase is attributed via a feature token embedded in its classname
//!   (`test_f3_...` → `F3`).
//!
//! A document that fails to parse is a hard error; there is no partial
//! recovery at this layer.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScoreError;
use crate::score::{TieredScore, TreatmentId};
use crate::tier::Tier;

/// Feature token inside a classname: an `f` followed by digits, delimited
/// by non-alphanumerics (`tests.acceptance.test_f3_enum.TestT1Basic`).
/// Case-insensitive; the extracted id is normalized to uppercase.
static FEATURE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])f([0-9]+)(?:[^a-z0-9]|$)").expect("feature token regex")
});

/// Extract the normalized feature id (`"F3"`) from a testcase classname.
#[must_use]
pub fn extract_feature_id(classname: &str) -> Option<String> {
    FEATURE_TOKEN
        .captures(classname)
        .map(|caps| format!("F{}", &caps[1]))
}

/// Parse a single-feature JUnit report into one [`TieredScore`].
///
/// Testcases whose classname matches no tier marker are skipped. A case
/// counts as passed when it has neither a `<failure>` nor an `<error>`
/// child.
///
/// # Errors
///
/// [`ScoreError::MalformedReport`] if the document is not well-formed XML.
pub fn parse_report(
    xml: &str,
    feature_id: &str,
    treatment_id: impl Into<TreatmentId>,
) -> Result<TieredScore, ScoreError> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut score = TieredScore::empty(feature_id, treatment_id);

    for case in testcases(&doc) {
        let classname = case.attribute("classname").unwrap_or("");
        let Some(tier) = Tier::classify(classname) else {
            continue;
        };
        record_case(&mut score, tier, case_passed(case));
    }

    Ok(score)
}

/// Parse a cumulative JUnit report spanning several features.
///
/// Testcases are attributed to features by the token extracted from their
/// classname; cases with no token are dropped entirely rather than
/// attributed to any feature. Tier counts accumulate independently per
/// feature. The result is sorted lexicographically ascending by feature id
/// (fine for single-digit portfolios; `"F10"` would sort before `"F2"`).
///
/// # Errors
///
/// [`ScoreError::MalformedReport`] if the document is not well-formed XML.
pub fn parse_cumulative(
    xml: &str,
    treatment_id: impl Into<TreatmentId>,
) -> Result<Vec<TieredScore>, ScoreError> {
    let treatment_id = treatment_id.into();
    let doc = roxmltree::Document::parse(xml)?;
    let mut by_feature: BTreeMap<String, TieredScore> = BTreeMap::new();

    for case in testcases(&doc) {
        let classname = case.attribute("classname").unwrap_or("");
        let Some(feature_id) = extract_feature_id(classname) else {
            continue;
        };
        let Some(tier) = Tier::classify(classname) else {
            continue;
        };
        let score = by_feature
            .entry(feature_id.clone())
            .or_insert_with(|| TieredScore::empty(feature_id, treatment_id.clone()));
        record_case(score, tier, case_passed(case));
    }

    Ok(by_feature.into_values().collect())
}

/// Read and parse a single-feature report file.
///
/// # Errors
///
/// [`ScoreError::ReportIo`] if the file cannot be read, otherwise as
/// [`parse_report`].
pub fn parse_report_file(
    path: &Path,
    feature_id: &str,
    treatment_id: impl Into<TreatmentId>,
) -> Result<TieredScore, ScoreError> {
    let xml = read_report(path)?;
    parse_report(&xml, feature_id, treatment_id)
}

/// Read and parse a cumulative report file.
///
/// # Errors
///
/// [`ScoreError::ReportIo`] if the file cannot be read, otherwise as
/// [`parse_cumulative`].
pub fn parse_cumulative_file(
    path: &Path,
    treatment_id: impl Into<TreatmentId>,
) -> Result<Vec<TieredScore>, ScoreError> {
    let xml = read_report(path)?;
    parse_cumulative(&xml, treatment_id)
}

fn read_report(path: &Path) -> Result<String, ScoreError> {
    std::fs::read_to_string(path).map_err(|source| ScoreError::ReportIo {
        path: path.to_path_buf(),
        source,
    })
}

fn testcases<'a, 'input: 'a>(
    doc: &'a roxmltree::Document<'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    doc.root()
        .descendants()
        .filter(|n| n.has_tag_name("testcase"))
}

fn case_passed(case: roxmltree::Node<'_, '_>) -> bool {
    !case
        .children()
        .any(|c| c.has_tag_name("failure") || c.has_tag_name("error"))
}

fn record_case(score: &mut TieredScore, tier: Tier, passed: bool) {
    let (passed_count, total_count) = score.tier_counts_mut(tier);
    *total_count += 1;
    if passed {
        *passed_count += 1;
    }
}
