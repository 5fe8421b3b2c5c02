//! Error types for the collection harness.
//!
//! Expected absences (no score record yet, no patch directory) get their
//! own variants so callers can branch on them without touching the
//! unrecoverable cases (corrupt records, git spawn failures).

use std::path::PathBuf;

use wavebench_score::ScoreError;

/// Main error type for the harness crate.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// No persisted scores exist for the requested treatment.
    #[error("no scores found for treatment {treatment_id} at {}", .path.display())]
    ScoresNotFound {
        /// Treatment that was requested
        treatment_id: String,
        /// Record path that was checked
        path: PathBuf,
    },

    /// A persisted score record exists but does not deserialize, or holds
    /// counts violating `passed <= total`.
    #[error("corrupt score record at {}: {reason}", .path.display())]
    CorruptRecord {
        /// Record path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A git or test-runner subprocess could not be spawned.
    #[error("failed to invoke {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A git command ran but exited nonzero in a context where that is not
    /// a plain boolean outcome (revert, rev-parse, status).
    #[error("git {args} failed in {}: {stderr}", .worktree.display())]
    Git {
        /// Arguments the command was run with
        args: String,
        /// Worktree the command ran against
        worktree: PathBuf,
        /// Captured stderr
        stderr: String,
    },

    /// Filesystem error outside subprocess handling.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Error from the pure scoring layer.
    #[error(transparent)]
    Score(#[from] ScoreError),
}

impl HarnessError {
    /// Check if the error is an expected "nothing there yet" absence.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ScoresNotFound { .. })
    }
}
