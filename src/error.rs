//! Error types for the analysis engine.

use thiserror::Error;

/// Failures returned by engine operations.
///
/// Every variant is recoverable: the caller may retry with corrected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("An analysis is already in progress. Please complete it or reset before starting a new one.")]
    AlreadyInProgress,

    #[error("Please provide a problem statement to analyze.")]
    EmptyProblem,

    #[error("No analysis in progress. Please start an analysis first.")]
    NoAnalysisInProgress,

    #[error("Not waiting for an answer. The analysis may be complete.")]
    NotWaitingForAnswer,

    #[error("Please provide a meaningful answer.")]
    EmptyAnswer,

    #[error("No analysis to export.")]
    NoAnalysisToExport,

    /// The engine state is inconsistent. Indicates a bug, not bad input.
    #[error("Internal error: {0}")]
    InternalStateError(String),
}

impl AnalysisError {
    /// Returns true for engine bugs as opposed to caller mistakes.
    pub fn is_internal(&self) -> bool {
        matches!(self, AnalysisError::InternalStateError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_internal() {
        assert!(AnalysisError::InternalStateError("level 3".to_string()).is_internal());
        assert!(!AnalysisError::EmptyAnswer.is_internal());
        assert!(!AnalysisError::AlreadyInProgress.is_internal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AnalysisError::NoAnalysisToExport.to_string(),
            "No analysis to export."
        );
        assert!(AnalysisError::InternalStateError("level 2".to_string())
            .to_string()
            .contains("level 2"));
    }
}
