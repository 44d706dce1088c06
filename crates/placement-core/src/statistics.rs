//! Per-level and per-skill breakdowns of an assessment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assessment::Assessment;
use crate::level::CefrLevel;

/// How a learner did on the questions of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    pub level: CefrLevel,
    /// Questions of this level in the selection.
    pub asked: usize,
    pub answered: usize,
    pub correct: usize,
    /// Weight of correctly answered questions.
    pub earned_weight: f64,
    /// Weight of all selected questions at this level.
    pub possible_weight: f64,
}

impl LevelStats {
    /// Fraction of this level's weight earned, 0.0 when nothing was asked.
    pub fn accuracy(&self) -> f64 {
        if self.possible_weight <= 0.0 {
            0.0
        } else {
            self.earned_weight / self.possible_weight
        }
    }
}

/// Correct answers per skill tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillStats {
    /// Skill tag, or `"untagged"`.
    pub skill: String,
    pub asked: usize,
    pub correct: usize,
}

/// Breakdown for every level present in the selection, in level order.
pub fn level_breakdown(assessment: &Assessment) -> Vec<LevelStats> {
    let mut per_level: BTreeMap<CefrLevel, LevelStats> = BTreeMap::new();

    for q in assessment.selected_questions() {
        let stats = per_level.entry(q.level).or_insert_with(|| LevelStats {
            level: q.level,
            asked: 0,
            answered: 0,
            correct: 0,
            earned_weight: 0.0,
            possible_weight: 0.0,
        });
        stats.asked += 1;
        stats.possible_weight += q.weight;

        if let Some(choice) = assessment.answer_for(&q.id) {
            stats.answered += 1;
            if q.is_correct(choice) {
                stats.correct += 1;
                stats.earned_weight += q.weight;
            }
        }
    }

    per_level.into_values().collect()
}

/// Breakdown by `skill_type`, sorted by skill name.
pub fn skill_breakdown(assessment: &Assessment) -> Vec<SkillStats> {
    let mut per_skill: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for q in assessment.selected_questions() {
        let entry = per_skill
            .entry(q.skill_type.as_deref().unwrap_or("untagged"))
            .or_default();
        entry.0 += 1;
        if assessment
            .answer_for(&q.id)
            .is_some_and(|choice| q.is_correct(choice))
        {
            entry.1 += 1;
        }
    }

    per_skill
        .into_iter()
        .map(|(skill, (asked, correct))| SkillStats {
            skill: skill.to_string(),
            asked,
            correct,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::bank;

    #[test]
    fn breakdown_counts_per_level() {
        let mut b = bank(2);
        b.questions[0].weight = 3.0; // a1-0
        let mut a = Assessment::new("u", b.questions).unwrap();
        a.record_answer("a1-0", 0).unwrap();
        a.record_answer("a1-1", 1).unwrap();
        a.record_answer("c2-0", 0).unwrap();

        let stats = level_breakdown(&a);
        assert_eq!(stats.len(), 6);
        assert_eq!(stats[0].level, CefrLevel::A1);
        assert_eq!(stats[0].asked, 2);
        assert_eq!(stats[0].answered, 2);
        assert_eq!(stats[0].correct, 1);
        assert_eq!(stats[0].earned_weight, 3.0);
        assert_eq!(stats[0].possible_weight, 4.0);
        assert!((stats[0].accuracy() - 0.75).abs() < 1e-9);

        let c2 = &stats[5];
        assert_eq!(c2.level, CefrLevel::C2);
        assert_eq!((c2.answered, c2.correct), (1, 1));

        let b1 = &stats[2];
        assert_eq!(b1.answered, 0);
        assert_eq!(b1.accuracy(), 0.0);
    }

    #[test]
    fn skills_default_to_untagged() {
        let mut b = bank(2);
        b.questions[0].skill_type = Some("grammar".into());
        let mut a = Assessment::new("u", b.questions).unwrap();
        a.record_answer("a1-0", 0).unwrap();

        let skills = skill_breakdown(&a);
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].skill, "grammar");
        assert_eq!((skills[0].asked, skills[0].correct), (1, 1));
        assert_eq!(skills[1].skill, "untagged");
        assert_eq!(skills[1].asked, 11);
    }
}
