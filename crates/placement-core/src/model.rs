//! Question and question-bank types.
//!
//! Questions are read-only to the engine: the ingestion layer builds them
//! (see [`crate::parser`]) and assessments keep their own snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::level::CefrLevel;

/// A single multiple-choice question used to place a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    /// Unique identifier within the bank.
    pub id: String,
    /// The level this question discriminates.
    pub level: CefrLevel,
    /// Question text shown to the learner.
    pub text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// 0-based index of the correct option.
    pub correct_index: usize,
    /// Scoring weight (positive).
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Skill being tested (grammar, vocabulary, reading, listening).
    #[serde(default)]
    pub skill_type: Option<String>,
}

impl AssessmentQuestion {
    /// Whether `index` selects the correct option.
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }

    /// Whether `index` addresses one of the options.
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}

pub(crate) fn default_weight() -> f64 {
    1.0
}

/// A named collection of assessment questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this bank.
    #[serde(default)]
    pub description: String,
    /// The questions in this bank.
    #[serde(default)]
    pub questions: Vec<AssessmentQuestion>,
}

impl QuestionBank {
    /// Group questions by level, preserving bank order within each level.
    ///
    /// Every level is present in the result, possibly with an empty list.
    pub fn by_level(&self) -> BTreeMap<CefrLevel, Vec<&AssessmentQuestion>> {
        let mut grouped: BTreeMap<CefrLevel, Vec<&AssessmentQuestion>> =
            CefrLevel::ALL.iter().map(|&l| (l, Vec::new())).collect();
        for q in &self.questions {
            grouped.entry(q.level).or_default().push(q);
        }
        grouped
    }

    /// Look up a question by id.
    pub fn get(&self, id: &str) -> Option<&AssessmentQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A question whose correct answer is always option 0 of three.
    pub fn question(id: &str, level: CefrLevel) -> AssessmentQuestion {
        AssessmentQuestion {
            id: id.into(),
            level,
            text: format!("Question {id}"),
            options: vec!["right".into(), "wrong".into(), "also wrong".into()],
            correct_index: 0,
            weight: 1.0,
            skill_type: None,
        }
    }

    /// A bank with `per_level` questions at every level, ids like `b1-0`.
    pub fn bank(per_level: usize) -> QuestionBank {
        let questions = CefrLevel::ALL
            .iter()
            .flat_map(|&level| {
                (0..per_level).map(move |i| {
                    question(&format!("{}-{i}", level.to_string().to_lowercase()), level)
                })
            })
            .collect();
        QuestionBank {
            id: "test-bank".into(),
            name: "Test Bank".into(),
            description: String::new(),
            questions,
        }
    }
}
