//! Assessment error types.
//!
//! Every failure here is local to a single call. The caller (bot or API
//! layer) decides whether to prompt the learner again, retry, or report.

use thiserror::Error;
use uuid::Uuid;

use crate::assessment::AssessmentStatus;
use crate::level::CefrLevel;

/// Errors returned by assessment operations.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The assessment is not in the status the operation requires.
    #[error("cannot {operation} assessment {id}: status is {status}")]
    InvalidState {
        id: Uuid,
        status: AssessmentStatus,
        operation: &'static str,
    },

    /// The question is not part of the assessment's selection.
    #[error("question {0} is not part of this assessment")]
    UnknownQuestion(String),

    /// The submitted option index is outside the question's options.
    #[error("option {index} is out of range for question {question_id} ({options} options)")]
    InvalidOption {
        question_id: String,
        index: usize,
        options: usize,
    },

    /// Completion was requested before every question was answered.
    #[error("assessment incomplete: {answered}/{total} questions answered")]
    Incomplete { answered: usize, total: usize },

    /// Two selected questions share an id, so answers could not tell them apart.
    #[error("duplicate question id in selection: {0}")]
    DuplicateQuestion(String),

    /// The pool could not produce a valid selection (empty, or fewer than two levels).
    #[error("question pool too small: selection covers {} level(s)", .levels.len())]
    PoolTooSmall { levels: Vec<CefrLevel> },

    /// No assessment with the given id exists.
    #[error("assessment not found: {0}")]
    NotFound(Uuid),

    /// A score outside [0, 1] was passed to level determination.
    #[error("invalid score {0}: must be between 0.0 and 1.0")]
    InvalidScore(f64),

    /// Selection or threshold configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The persistence layer failed.
    #[error("store error: {0}")]
    Store(String),
}

impl AssessmentError {
    /// Returns `true` if the same call may succeed when repeated unchanged.
    ///
    /// Only store failures qualify; everything else is a property of the
    /// request or of the assessment's state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssessmentError::Store(_))
    }
}

/// Non-fatal conditions raised while selecting questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionWarning {
    /// A level had fewer questions than the configured minimum; all of them were used.
    #[error("level {level} has {available} question(s), {required} required; using all available")]
    InsufficientPool {
        level: CefrLevel,
        available: usize,
        required: usize,
    },
}

pub type Result<T, E = AssessmentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_errors_are_retryable() {
        assert!(AssessmentError::Store("connection reset".into()).is_retryable());
        assert!(!AssessmentError::UnknownQuestion("q1".into()).is_retryable());
        assert!(!AssessmentError::Incomplete {
            answered: 1,
            total: 2
        }
        .is_retryable());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = AssessmentError::InvalidOption {
            question_id: "q7".into(),
            index: 5,
            options: 3,
        };
        assert_eq!(
            err.to_string(),
            "option 5 is out of range for question q7 (3 options)"
        );

        let warning = SelectionWarning::InsufficientPool {
            level: CefrLevel::C2,
            available: 1,
            required: 2,
        };
        assert!(warning.to_string().contains("level C2 has 1 question(s)"));
    }
}
