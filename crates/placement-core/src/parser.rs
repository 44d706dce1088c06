//! TOML question-bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::level::CefrLevel;
use crate::model::{default_weight, AssessmentQuestion, QuestionBank};
use crate::sheet::normalize_options;

/// On-disk layout of a bank file.
#[derive(Debug, Serialize, Deserialize)]
pub struct TomlBankFile {
    pub bank: TomlBankHeader,
    #[serde(default)]
    pub questions: Vec<TomlQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlBankHeader {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlQuestion {
    pub id: String,
    pub level: String,
    pub text: String,
    pub options: TomlOptions,
    pub correct_index: usize,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_type: Option<String>,
}

/// Options as a proper array, or as one delimited string copied from a sheet.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TomlOptions {
    List(Vec<String>),
    Delimited(String),
}

impl From<&QuestionBank> for TomlBankFile {
    fn from(bank: &QuestionBank) -> Self {
        Self {
            bank: TomlBankHeader {
                id: bank.id.clone(),
                name: bank.name.clone(),
                description: bank.description.clone(),
            },
            questions: bank
                .questions
                .iter()
                .map(|q| TomlQuestion {
                    id: q.id.clone(),
                    level: q.level.to_string(),
                    text: q.text.clone(),
                    options: TomlOptions::List(q.options.clone()),
                    correct_index: q.correct_index,
                    weight: q.weight,
                    skill_type: q.skill_type.clone(),
                })
                .collect(),
        }
    }
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let level: CefrLevel = q
                .level
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            let options = match q.options {
                TomlOptions::List(list) => list,
                TomlOptions::Delimited(raw) => normalize_options(&raw).ok_or_else(|| {
                    anyhow::anyhow!("question {}: could not parse options {:?}", q.id, raw)
                })?,
            };

            Ok(AssessmentQuestion {
                id: q.id,
                level,
                text: q.text,
                options,
                correct_index: q.correct_index,
                weight: q.weight,
                skill_type: q.skill_type,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Serialize a bank to TOML in the same layout [`parse_bank_str`] reads.
pub fn bank_to_toml(bank: &QuestionBank) -> Result<String> {
    toml::to_string_pretty(&TomlBankFile::from(bank)).context("failed to serialize bank")
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or merge every bank in a directory into one pool.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    if !path.is_dir() {
        return parse_bank(path);
    }
    let banks = load_bank_directory(path)?;
    anyhow::ensure!(
        !banks.is_empty(),
        "no question banks found in {}",
        path.display()
    );
    let name = banks
        .iter()
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    Ok(QuestionBank {
        id: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "merged".into()),
        name,
        description: String::new(),
        questions: banks.into_iter().flat_map(|b| b.questions).collect(),
    })
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The bank works but selection will be degraded or a question looks odd.
    Warning,
    /// The question cannot be graded correctly.
    Error,
}

/// A finding from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub severity: Severity,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn error(question_id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(question_id.to_string()),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(question_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.map(str::to_string),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Validate a bank for common issues.
///
/// `per_level_min` is the selection minimum; levels below it are reported
/// because selection will run degraded for them.
pub fn validate_bank(bank: &QuestionBank, per_level_min: usize) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning::error(
                &q.id,
                format!("duplicate question ID: {}", q.id),
            ));
        }
    }

    for q in &bank.questions {
        if q.options.len() < 2 {
            warnings.push(ValidationWarning::error(
                &q.id,
                format!("needs at least 2 options, has {}", q.options.len()),
            ));
        }
        if !q.has_option(q.correct_index) {
            warnings.push(ValidationWarning::error(
                &q.id,
                format!(
                    "correct_index {} is out of range for {} options",
                    q.correct_index,
                    q.options.len()
                ),
            ));
        }
        if !(q.weight.is_finite() && q.weight > 0.0) {
            warnings.push(ValidationWarning::error(
                &q.id,
                format!("weight must be positive, got {}", q.weight),
            ));
        }
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning::warning(Some(&q.id), "question text is empty"));
        }
        if q.options.iter().any(|o| o.trim().is_empty()) {
            warnings.push(ValidationWarning::warning(Some(&q.id), "contains an empty option"));
        }
    }

    for (level, pool) in bank.by_level() {
        if pool.len() < per_level_min {
            warnings.push(ValidationWarning::warning(
                None,
                format!(
                    "level {level} has {} question(s), selection wants at least {per_level_min}",
                    pool.len()
                ),
            ));
        }
    }

    warnings
}

/// Whether any finding makes the bank unusable for grading.
pub fn has_errors(warnings: &[ValidationWarning]) -> bool {
    warnings.iter().any(|w| w.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[bank]
id = "core"
name = "Core Placement"
description = "A small bank"

[[questions]]
id = "a1-be"
level = "A1"
text = "She ___ a teacher."
options = ["am", "is", "are"]
correct_index = 1
skill_type = "grammar"

[[questions]]
id = "c2-idiom"
level = "c2"
text = "To 'take something with a pinch of salt' means to..."
options = "believe it fully | be sceptical about it | add flavour"
correct_index = 1
weight = 2.0
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("core.toml")).unwrap();
        assert_eq!(bank.id, "core");
        assert_eq!(bank.questions.len(), 2);
        assert_eq!(bank.questions[0].level, CefrLevel::A1);
        assert_eq!(bank.questions[0].weight, 1.0);
        assert_eq!(bank.questions[0].skill_type.as_deref(), Some("grammar"));
        assert_eq!(
            bank.questions[1].options,
            vec!["believe it fully", "be sceptical about it", "add flavour"]
        );
        assert_eq!(bank.questions[1].level, CefrLevel::C2);
        assert_eq!(bank.questions[1].weight, 2.0);
    }

    #[test]
    fn parse_unknown_level_fails() {
        let toml = r#"
[bank]
id = "bad"
name = "Bad"

[[questions]]
id = "q1"
level = "D9"
text = "?"
options = ["a", "b"]
correct_index = 0
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("D9"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("core.toml")).unwrap();
        let text = bank_to_toml(&bank).unwrap();
        let again = parse_bank_str(&text, &PathBuf::from("again.toml")).unwrap();
        assert_eq!(again.questions, bank.questions);
    }

    #[test]
    fn validate_reports_broken_questions() {
        let mut bank = parse_bank_str(VALID_TOML, &PathBuf::from("core.toml")).unwrap();
        bank.questions[0].correct_index = 7;
        bank.questions[1].weight = 0.0;
        let dup = bank.questions[0].clone();
        bank.questions.push(dup);

        let warnings = validate_bank(&bank, 2);
        assert!(has_errors(&warnings));
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("out of range")));
        assert!(warnings.iter().any(|w| w.message.contains("weight")));
    }

    #[test]
    fn validate_flags_thin_levels_as_warnings() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("core.toml")).unwrap();
        let warnings = validate_bank(&bank, 2);
        assert!(!has_errors(&warnings));
        let thin: Vec<_> = warnings
            .iter()
            .filter(|w| w.message.starts_with("level "))
            .collect();
        assert_eq!(thin.len(), 6);
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("core.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "nope = [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "core");

        let merged = load_bank(dir.path()).unwrap();
        assert_eq!(merged.questions.len(), 2);
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(load_bank(Path::new("/definitely/not/here.toml")).is_err());
    }
}
