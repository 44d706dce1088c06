//! The `placement score` command.
//!
//! The answer sheet is a JSON object mapping question ids to 0-based option
//! indices. The assessment consists of exactly the questions on the sheet.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use placement_core::assessment::Assessment;
use placement_core::config::load_config_from;
use placement_core::report::AssessmentReport;

use super::{level_table, load_gradable_bank};

pub fn execute(
    bank_path: PathBuf,
    answers_path: PathBuf,
    user: String,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = load_gradable_bank(&bank_path, config.selection.per_level_min)?;

    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let sheet: BTreeMap<String, usize> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?;

    let questions = sheet
        .keys()
        .map(|id| {
            bank.get(id)
                .cloned()
                .with_context(|| format!("question {id} is not in bank {}", bank.id))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut assessment = Assessment::new(user, questions)?;
    for (question_id, &index) in &sheet {
        assessment.record_answer(question_id, index)?;
    }
    assessment.complete(&config.thresholds, config.completion)?;

    let report = AssessmentReport::new(&assessment, &bank);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => {
            println!("{}", report.summary());
            println!("{}", level_table(&report));
        }
    }

    Ok(())
}
