//! Assessment reports with JSON persistence and retake comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::{Assessment, AssessmentOutcome, AssessmentStatus};
use crate::level::CefrLevel;
use crate::model::QuestionBank;
use crate::statistics::{level_breakdown, skill_breakdown, LevelStats, SkillStats};

/// A complete assessment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// The assessment this report describes.
    pub assessment_id: Uuid,
    pub user_id: String,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the bank the questions came from.
    pub bank: BankSummary,
    pub status: AssessmentStatus,
    /// Score and level; `None` unless completed.
    pub outcome: Option<AssessmentOutcome>,
    pub per_level: Vec<LevelStats>,
    pub per_skill: Vec<SkillStats>,
    /// Every selected question with the learner's response.
    pub answers: Vec<AnswerRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Summary of a question bank (without the questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl From<&QuestionBank> for BankSummary {
    fn from(bank: &QuestionBank) -> Self {
        Self {
            id: bank.id.clone(),
            name: bank.name.clone(),
            question_count: bank.questions.len(),
        }
    }
}

/// One question as presented, with the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub level: CefrLevel,
    pub weight: f64,
    /// Chosen option index, `None` if unanswered.
    pub chosen: Option<usize>,
    pub correct: bool,
}

impl AssessmentReport {
    /// Build a report for `assessment`, drawn from `bank`.
    pub fn new(assessment: &Assessment, bank: &QuestionBank) -> Self {
        let answers = assessment
            .selected_questions()
            .iter()
            .map(|q| {
                let chosen = assessment.answer_for(&q.id);
                AnswerRecord {
                    question_id: q.id.clone(),
                    level: q.level,
                    weight: q.weight,
                    chosen,
                    correct: chosen.is_some_and(|c| q.is_correct(c)),
                }
            })
            .collect();

        Self {
            assessment_id: assessment.id,
            user_id: assessment.user_id.clone(),
            created_at: Utc::now(),
            bank: BankSummary::from(bank),
            status: assessment.status(),
            outcome: assessment.outcome(),
            per_level: level_breakdown(assessment),
            per_skill: skill_breakdown(assessment),
            answers,
            started_at: assessment.started_at,
            completed_at: assessment.completed_at(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Default file name under an output directory.
    ///
    /// Characters of the user id outside `[A-Za-z0-9_-]` become `_`, so the
    /// name never leaves the directory it is joined onto.
    pub fn file_name(&self) -> String {
        let user: String = self
            .user_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{user}-{}.json", self.assessment_id)
    }

    /// One-line result, e.g. `Result: 75.0%, level B2 (independent)`.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Some(o) => format!(
                "Result: {:.1}%, level {} ({})",
                o.normalized_score * 100.0,
                o.resulting_level,
                o.resulting_level.stage()
            ),
            None => format!("Assessment {} is {}", self.assessment_id, self.status),
        }
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## Placement report: {}\n\n", self.user_id));
        md.push_str(&format!("**{}**\n\n", self.summary()));
        md.push_str(&format!(
            "Bank: {} ({} questions)\n\n",
            self.bank.name, self.bank.question_count
        ));

        md.push_str("| Level | Asked | Answered | Correct | Accuracy |\n");
        md.push_str("|-------|-------|----------|---------|----------|\n");
        for s in &self.per_level {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1}% |\n",
                s.level,
                s.asked,
                s.answered,
                s.correct,
                s.accuracy() * 100.0
            ));
        }

        if self.per_skill.len() > 1 {
            md.push_str("\n| Skill | Correct |\n");
            md.push_str("|-------|---------|\n");
            for s in &self.per_skill {
                md.push_str(&format!("| {} | {}/{} |\n", s.skill, s.correct, s.asked));
            }
        }

        md
    }

    /// Compare this report against an earlier one for the same learner.
    ///
    /// Returns `None` unless both reports carry an outcome.
    pub fn compare(&self, baseline: &AssessmentReport) -> Option<LevelComparison> {
        let current = self.outcome?;
        let previous = baseline.outcome?;
        Some(LevelComparison {
            previous_level: previous.resulting_level,
            current_level: current.resulting_level,
            level_delta: current.resulting_level.index() as i32
                - previous.resulting_level.index() as i32,
            score_delta: current.normalized_score - previous.normalized_score,
        })
    }
}

/// Result of comparing two completed reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelComparison {
    pub previous_level: CefrLevel,
    pub current_level: CefrLevel,
    /// Levels gained (positive) or lost (negative).
    pub level_delta: i32,
    /// Change in normalized score.
    pub score_delta: f64,
}

impl LevelComparison {
    pub fn improved(&self) -> bool {
        self.level_delta > 0
    }

    pub fn regressed(&self) -> bool {
        self.level_delta < 0
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let direction = match self.level_delta {
            d if d > 0 => "up",
            d if d < 0 => "down",
            _ => "unchanged",
        };
        format!(
            "**Level:** {} -> {} ({})\n\n**Score change:** {:+.1}%\n",
            self.previous_level,
            self.current_level,
            direction,
            self.score_delta * 100.0
        )
    }
}
