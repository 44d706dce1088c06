//! Diagnostic question selection.
//!
//! Draws a few questions from every level so a single sitting spans the
//! whole A1–C2 range, then shuffles them for presentation.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{AssessmentError, Result, SelectionWarning};
use crate::level::CefrLevel;
use crate::model::{AssessmentQuestion, QuestionBank};

/// How many questions to draw per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Minimum questions per level; levels below this are used in full with a warning.
    #[serde(default = "default_per_level_min")]
    pub per_level_min: usize,
    /// Maximum questions per level.
    #[serde(default = "default_per_level_max")]
    pub per_level_max: usize,
}

fn default_per_level_min() -> usize {
    2
}

fn default_per_level_max() -> usize {
    3
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            per_level_min: default_per_level_min(),
            per_level_max: default_per_level_max(),
        }
    }
}

impl SelectionConfig {
    /// Reject bounds that cannot produce a selection.
    pub fn validate(&self) -> Result<()> {
        if self.per_level_min == 0 {
            return Err(AssessmentError::InvalidConfig(
                "per_level_min must be at least 1".into(),
            ));
        }
        if self.per_level_min > self.per_level_max {
            return Err(AssessmentError::InvalidConfig(format!(
                "per_level_min ({}) exceeds per_level_max ({})",
                self.per_level_min, self.per_level_max
            )));
        }
        Ok(())
    }

    /// Random source for selection: seeded when reproducibility is needed.
    pub fn rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// The outcome of selecting questions from a bank.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Questions in presentation order.
    pub questions: Vec<AssessmentQuestion>,
    /// Levels that could not meet the per-level minimum.
    pub warnings: Vec<SelectionWarning>,
}

impl Selection {
    /// Distinct levels represented, lowest first.
    pub fn levels(&self) -> Vec<CefrLevel> {
        let mut levels: Vec<CefrLevel> = self.questions.iter().map(|q| q.level).collect();
        levels.sort();
        levels.dedup();
        levels
    }

    /// Whether every level reached the per-level minimum.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Select a balanced diagnostic set from `bank`.
///
/// For each level a target count is drawn uniformly from
/// `[per_level_min, per_level_max]` and that many distinct questions are
/// sampled. Levels holding fewer than `per_level_min` questions contribute
/// everything they have and raise [`SelectionWarning::InsufficientPool`].
/// A question id that appears more than once in the bank is only considered
/// at its first occurrence.
pub fn select_questions<R: Rng + ?Sized>(
    bank: &QuestionBank,
    config: &SelectionConfig,
    rng: &mut R,
) -> Result<Selection> {
    config.validate()?;

    let mut questions = Vec::new();
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for (level, pool) in bank.by_level() {
        let pool: Vec<&AssessmentQuestion> = pool
            .into_iter()
            .filter(|q| {
                let first = seen.insert(q.id.as_str());
                if !first {
                    tracing::warn!(question_id = %q.id, %level, "duplicate question id, skipped");
                }
                first
            })
            .collect();
        let target = rng.gen_range(config.per_level_min..=config.per_level_max);

        if pool.len() < config.per_level_min {
            tracing::warn!(
                %level,
                available = pool.len(),
                required = config.per_level_min,
                "not enough questions for level, using all available"
            );
            warnings.push(SelectionWarning::InsufficientPool {
                level,
                available: pool.len(),
                required: config.per_level_min,
            });
        }

        let take = target.min(pool.len());
        questions.extend(pool.choose_multiple(rng, take).map(|&q| q.clone()));
    }

    questions.shuffle(rng);

    Ok(Selection {
        questions,
        warnings,
    })
}
