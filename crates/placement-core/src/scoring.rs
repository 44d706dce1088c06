//! Weighted scoring and CEFR level determination.
//!
//! A score is the summed weight of correctly answered questions; the
//! normalized score divides that by the total weight of every selected
//! question, answered or not. Levels come from a six-row threshold table of
//! ascending lower bounds, each inclusive.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AssessmentError, Result};
use crate::level::CefrLevel;
use crate::model::AssessmentQuestion;

/// Weighted result of grading a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedScore {
    /// Sum of weights of correctly answered questions.
    pub earned: f64,
    /// Sum of weights of all graded questions.
    pub possible: f64,
}

impl WeightedScore {
    /// `earned / possible`, or 0.0 when nothing could be earned.
    pub fn normalized(&self) -> f64 {
        if self.possible <= 0.0 {
            return 0.0;
        }
        (self.earned / self.possible).clamp(0.0, 1.0)
    }
}

/// Grade `answers` (question id → chosen option) against `questions`.
///
/// Unanswered questions contribute to `possible` but not to `earned`.
/// Answers for ids outside `questions` are ignored.
pub fn weighted_score(
    questions: &[AssessmentQuestion],
    answers: &HashMap<&str, usize>,
) -> WeightedScore {
    let mut earned = 0.0;
    let mut possible = 0.0;
    for q in questions {
        possible += q.weight;
        if answers
            .get(q.id.as_str())
            .is_some_and(|&choice| q.is_correct(choice))
        {
            earned += q.weight;
        }
    }
    WeightedScore { earned, possible }
}

/// Lower bounds of each level's score range, in level order.
///
/// The table partitions [0, 1]: the first bound is 0.0, bounds strictly
/// ascend, and the top level extends to 1.0 inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelBound>", into = "Vec<LevelBound>")]
pub struct LevelThresholds {
    lower_bounds: [f64; 6],
}

/// One row of a threshold table as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelBound {
    pub level: CefrLevel,
    pub min_score: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            lower_bounds: [0.0, 0.20, 0.40, 0.60, 0.80, 0.95],
        }
    }
}

impl LevelThresholds {
    /// Build a table from lower bounds for A1..C2.
    pub fn new(lower_bounds: [f64; 6]) -> Result<Self> {
        if let Some(bad) = lower_bounds.iter().find(|b| !b.is_finite()) {
            return Err(AssessmentError::InvalidConfig(format!(
                "thresholds must be finite numbers, got {bad}"
            )));
        }
        if lower_bounds[0] != 0.0 {
            return Err(AssessmentError::InvalidConfig(format!(
                "A1 threshold must be 0.0, got {}",
                lower_bounds[0]
            )));
        }
        for pair in lower_bounds.windows(2) {
            if pair[1] <= pair[0] {
                return Err(AssessmentError::InvalidConfig(format!(
                    "thresholds must strictly ascend: {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        if lower_bounds[5] > 1.0 {
            return Err(AssessmentError::InvalidConfig(format!(
                "C2 threshold must not exceed 1.0, got {}",
                lower_bounds[5]
            )));
        }
        Ok(Self { lower_bounds })
    }

    /// Six equal-width ranges over [0, 1].
    pub fn evenly_spaced() -> Self {
        let mut lower_bounds = [0.0; 6];
        for (i, bound) in lower_bounds.iter_mut().enumerate() {
            *bound = i as f64 / 6.0;
        }
        Self { lower_bounds }
    }

    /// Lower bound for `level`.
    pub fn min_score(&self, level: CefrLevel) -> f64 {
        self.lower_bounds[level.index()]
    }

    /// Score range `[min, max)` for `level`; the top level's max is 1.0 inclusive.
    pub fn range(&self, level: CefrLevel) -> (f64, f64) {
        let max = level
            .next()
            .map(|next| self.min_score(next))
            .unwrap_or(1.0);
        (self.min_score(level), max)
    }

    /// Map a normalized score to its level.
    pub fn determine_level(&self, score: f64) -> Result<CefrLevel> {
        if !(0.0..=1.0).contains(&score) {
            return Err(AssessmentError::InvalidScore(score));
        }
        let level = CefrLevel::ALL
            .iter()
            .rev()
            .find(|&&level| score >= self.min_score(level))
            .copied()
            .unwrap_or(CefrLevel::A1);
        Ok(level)
    }
}

impl TryFrom<Vec<LevelBound>> for LevelThresholds {
    type Error = AssessmentError;

    fn try_from(rows: Vec<LevelBound>) -> Result<Self> {
        if rows.len() != CefrLevel::ALL.len() {
            return Err(AssessmentError::InvalidConfig(format!(
                "expected {} threshold rows, got {}",
                CefrLevel::ALL.len(),
                rows.len()
            )));
        }
        let mut lower_bounds = [f64::NAN; 6];
        for row in &rows {
            lower_bounds[row.level.index()] = row.min_score;
        }
        if let Some(missing) = CefrLevel::ALL
            .iter()
            .find(|l| lower_bounds[l.index()].is_nan())
        {
            return Err(AssessmentError::InvalidConfig(format!(
                "no threshold given for {missing}"
            )));
        }
        Self::new(lower_bounds)
    }
}

impl From<LevelThresholds> for Vec<LevelBound> {
    fn from(t: LevelThresholds) -> Self {
        CefrLevel::ALL
            .iter()
            .map(|&level| LevelBound {
                level,
                min_score: t.min_score(level),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::question;

    fn weighted(id: &str, weight: f64, correct_index: usize) -> AssessmentQuestion {
        AssessmentQuestion {
            weight,
            correct_index,
            ..question(id, CefrLevel::B1)
        }
    }

    #[test]
    fn weighted_answers() {
        let questions = vec![
            weighted("q1", 1.0, 0),
            weighted("q2", 2.0, 1),
            weighted("q3", 1.5, 2),
        ];
        let answers = HashMap::from([("q1", 0), ("q2", 1), ("q3", 1)]);
        let score = weighted_score(&questions, &answers);
        assert_eq!(score.earned, 3.0);
        assert_eq!(score.possible, 4.5);
        assert!((score.normalized() - 3.0 / 4.5).abs() < 1e-9);
    }

    #[test]
    fn missing_answers_count_as_wrong() {
        let questions = vec![weighted("q1", 1.0, 0), weighted("q2", 1.0, 1)];
        let answers = HashMap::from([("q1", 0)]);
        assert_eq!(weighted_score(&questions, &answers).normalized(), 0.5);
    }

    #[test]
    fn stray_answers_are_ignored() {
        let questions = vec![weighted("q1", 1.0, 0)];
        let answers = HashMap::from([("q1", 0), ("elsewhere", 0)]);
        let score = weighted_score(&questions, &answers);
        assert_eq!(score.earned, 1.0);
        assert_eq!(score.possible, 1.0);
    }

    #[test]
    fn zero_possible_weight_is_zero() {
        let score = weighted_score(&[], &HashMap::new());
        assert_eq!(score.normalized(), 0.0);
    }

    #[test]
    fn default_threshold_boundaries() {
        let t = LevelThresholds::default();
        let cases = [
            (0.0, CefrLevel::A1),
            (0.15, CefrLevel::A1),
            (0.20, CefrLevel::A2),
            (0.39, CefrLevel::A2),
            (0.40, CefrLevel::B1),
            (0.60, CefrLevel::B2),
            (0.75, CefrLevel::B2),
            (0.80, CefrLevel::C1),
            (0.94, CefrLevel::C1),
            (0.95, CefrLevel::C2),
            (1.0, CefrLevel::C2),
        ];
        for (score, expected) in cases {
            assert_eq!(
                t.determine_level(score).unwrap(),
                expected,
                "score {score} should map to {expected}"
            );
        }
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let t = LevelThresholds::default();
        assert!(matches!(
            t.determine_level(-0.1),
            Err(AssessmentError::InvalidScore(_))
        ));
        assert!(t.determine_level(1.01).is_err());
        assert!(t.determine_level(f64::NAN).is_err());
    }

    #[test]
    fn evenly_spaced_covers_unit_interval() {
        let t = LevelThresholds::evenly_spaced();
        assert_eq!(t.determine_level(0.0).unwrap(), CefrLevel::A1);
        assert_eq!(t.determine_level(0.5).unwrap(), CefrLevel::B2);
        assert_eq!(t.determine_level(1.0).unwrap(), CefrLevel::C2);
        assert_eq!(t.range(CefrLevel::C2).1, 1.0);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        assert!(LevelThresholds::new([0.1, 0.2, 0.4, 0.6, 0.8, 0.95]).is_err());
        assert!(LevelThresholds::new([0.0, 0.4, 0.4, 0.6, 0.8, 0.95]).is_err());
        assert!(LevelThresholds::new([0.0, 0.2, 0.4, 0.6, 0.8, 1.5]).is_err());
    }

    #[test]
    fn thresholds_from_config_rows() {
        let toml_str = r#"
thresholds = [
    { level = "A1", min_score = 0.0 },
    { level = "A2", min_score = 0.1 },
    { level = "B1", min_score = 0.3 },
    { level = "B2", min_score = 0.5 },
    { level = "C1", min_score = 0.7 },
    { level = "C2", min_score = 0.9 },
]
"#;
        #[derive(Deserialize)]
        struct Wrapper {
            thresholds: LevelThresholds,
        }
        let parsed: Wrapper = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.thresholds.min_score(CefrLevel::B2), 0.5);
        assert_eq!(
            parsed.thresholds.determine_level(0.92).unwrap(),
            CefrLevel::C2
        );
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        let nan = LevelThresholds::new([0.0, f64::NAN, 0.4, 0.6, 0.8, 0.95]);
        assert!(matches!(nan, Err(AssessmentError::InvalidConfig(_))));
        let inf = LevelThresholds::new([0.0, 0.2, 0.4, 0.6, 0.8, f64::INFINITY]);
        assert!(inf.is_err());
    }

    #[test]
    fn thresholds_missing_a_level_fail_to_parse() {
        let row = |level, min_score| LevelBound { level, min_score };
        let rows = vec![
            row(CefrLevel::A1, 0.0),
            row(CefrLevel::A1, 0.1),
            row(CefrLevel::B1, 0.3),
            row(CefrLevel::B2, 0.5),
            row(CefrLevel::C1, 0.7),
            row(CefrLevel::C2, 0.9),
        ];
        let err = LevelThresholds::try_from(rows).unwrap_err();
        assert!(err.to_string().contains("A2"));
    }
}
