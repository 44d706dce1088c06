//! The assessment session and its lifecycle.
//!
//! ```text
//! in_progress ──complete──▶ completed
//!      │
//!      └──────abandon─────▶ abandoned
//! ```
//!
//! Both end states are terminal. An assessment owns a snapshot of the
//! questions it was created with, so later edits to the bank never change
//! a finished result.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AssessmentError, Result};
use crate::level::CefrLevel;
use crate::model::AssessmentQuestion;
use crate::scoring::{weighted_score, LevelThresholds};

/// Where an assessment is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl AssessmentStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AssessmentStatus::InProgress)
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentStatus::InProgress => write!(f, "in_progress"),
            AssessmentStatus::Completed => write!(f, "completed"),
            AssessmentStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Whether completion needs every question answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Completion fails with [`AssessmentError::Incomplete`] until all questions are answered.
    #[default]
    RequireAll,
    /// Unanswered questions are scored as incorrect against the full weight.
    AllowPartial,
}

/// A recorded response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    pub question_id: String,
    pub option_index: usize,
    pub answered_at: DateTime<Utc>,
}

/// The scored result of a completed assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    /// Summed weight of correct answers.
    pub score: f64,
    /// `score` divided by the total selected weight.
    pub normalized_score: f64,
    pub resulting_level: CefrLevel,
}

/// One placement session for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: String,
    selected_questions: Vec<AssessmentQuestion>,
    answers: Vec<RecordedAnswer>,
    score: Option<f64>,
    normalized_score: Option<f64>,
    resulting_level: Option<CefrLevel>,
    status: AssessmentStatus,
    pub started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Assessment {
    /// Start a new in-progress assessment over `questions`.
    ///
    /// Fails with [`AssessmentError::PoolTooSmall`] unless the questions
    /// span at least two levels, and with [`AssessmentError::DuplicateQuestion`]
    /// if two questions share an id.
    pub fn new(user_id: impl Into<String>, questions: Vec<AssessmentQuestion>) -> Result<Self> {
        let mut ids = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !ids.insert(q.id.as_str())) {
            return Err(AssessmentError::DuplicateQuestion(dup.id.clone()));
        }

        let mut levels: Vec<CefrLevel> = questions.iter().map(|q| q.level).collect();
        levels.sort();
        levels.dedup();
        if levels.len() < 2 {
            return Err(AssessmentError::PoolTooSmall { levels });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            selected_questions: questions,
            answers: Vec::new(),
            score: None,
            normalized_score: None,
            resulting_level: None,
            status: AssessmentStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
        })
    }

    pub fn status(&self) -> AssessmentStatus {
        self.status
    }

    pub fn selected_questions(&self) -> &[AssessmentQuestion] {
        &self.selected_questions
    }

    /// Answers in response order.
    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<usize> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| a.option_index)
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn normalized_score(&self) -> Option<f64> {
        self.normalized_score
    }

    pub fn resulting_level(&self) -> Option<CefrLevel> {
        self.resulting_level
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// The completed result, if any.
    pub fn outcome(&self) -> Option<AssessmentOutcome> {
        Some(AssessmentOutcome {
            score: self.score?,
            normalized_score: self.normalized_score?,
            resulting_level: self.resulting_level?,
        })
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.answers.len(), self.selected_questions.len())
    }

    pub fn is_fully_answered(&self) -> bool {
        self.answers.len() == self.selected_questions.len()
    }

    /// First unanswered question in presentation order.
    pub fn next_question(&self) -> Option<&AssessmentQuestion> {
        self.selected_questions
            .iter()
            .find(|q| self.answer_for(&q.id).is_none())
    }

    fn require_in_progress(&self, operation: &'static str) -> Result<()> {
        if self.status != AssessmentStatus::InProgress {
            return Err(AssessmentError::InvalidState {
                id: self.id,
                status: self.status,
                operation,
            });
        }
        Ok(())
    }

    /// Record (or overwrite) the answer to one selected question.
    pub fn record_answer(&mut self, question_id: &str, option_index: usize) -> Result<()> {
        self.require_in_progress("answer")?;

        let question = self
            .selected_questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AssessmentError::UnknownQuestion(question_id.to_string()))?;

        if !question.has_option(option_index) {
            return Err(AssessmentError::InvalidOption {
                question_id: question_id.to_string(),
                index: option_index,
                options: question.options.len(),
            });
        }

        let now = Utc::now();
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
        {
            Some(existing) => {
                existing.option_index = option_index;
                existing.answered_at = now;
            }
            None => self.answers.push(RecordedAnswer {
                question_id: question_id.to_string(),
                option_index,
                answered_at: now,
            }),
        }
        Ok(())
    }

    /// Score the assessment and move it to `completed`.
    pub fn complete(
        &mut self,
        thresholds: &LevelThresholds,
        policy: CompletionPolicy,
    ) -> Result<AssessmentOutcome> {
        self.require_in_progress("complete")?;

        if policy == CompletionPolicy::RequireAll && !self.is_fully_answered() {
            let (answered, total) = self.progress();
            return Err(AssessmentError::Incomplete { answered, total });
        }

        let answers: HashMap<&str, usize> = self
            .answers
            .iter()
            .map(|a| (a.question_id.as_str(), a.option_index))
            .collect();
        let weighted = weighted_score(&self.selected_questions, &answers);
        let normalized_score = weighted.normalized();
        let resulting_level = thresholds.determine_level(normalized_score)?;

        self.score = Some(weighted.earned);
        self.normalized_score = Some(normalized_score);
        self.resulting_level = Some(resulting_level);
        self.completed_at = Some(Utc::now());
        self.status = AssessmentStatus::Completed;

        Ok(AssessmentOutcome {
            score: weighted.earned,
            normalized_score,
            resulting_level,
        })
    }

    /// Move an in-progress assessment to `abandoned`.
    pub fn abandon(&mut self) -> Result<()> {
        self.require_in_progress("abandon")?;
        self.status = AssessmentStatus::Abandoned;
        Ok(())
    }
}
