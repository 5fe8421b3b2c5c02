//! Error types for the scoring core.
//!
//! The variants separate "corrupt input" from "bad configuration" so callers
//! can branch without string-matching messages:
//! - a malformed report document is unrecoverable at this layer and aborts
//!   the parse,
//! - a weight map missing a tier key is a configuration bug and must surface
//!   loudly rather than default to zero.

use crate::tier::Tier;

/// Main error type for the scoring core.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Test report document could not be parsed.
    #[error("malformed test report: {0}")]
    MalformedReport(String),

    /// Test report file could not be read.
    #[error("failed to read test report {}: {source}", .path.display())]
    ReportIo {
        /// Path to the report file
        path: std::path::PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Weight map has no entry for a tier that is present in a score.
    #[error("no weight configured for tier {0}")]
    MissingWeight(Tier),
}

impl ScoreError {
    /// Check if the error indicates corrupt report data.
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedReport(_))
    }

    /// Check if the error indicates a configuration problem.
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::MissingWeight(_))
    }
}

impl From<roxmltree::Error> for ScoreError {
    fn from(err: roxmltree::Error) -> Self {
        Self::MalformedReport(err.to_string())
    }
}
