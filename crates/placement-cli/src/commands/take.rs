//! The `placement take` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use placement_core::assessment::{Assessment, AssessmentOutcome};
use placement_core::config::load_config_from;
use placement_core::engine::{AssessmentEngine, AssessmentObserver};
use placement_core::error::SelectionWarning;
use placement_core::report::AssessmentReport;
use placement_core::store::MemoryStore;

use super::{level_table, load_gradable_bank};

/// Console lifecycle reporter.
struct ConsoleObserver;

impl AssessmentObserver for ConsoleObserver {
    fn on_started(&self, assessment: &Assessment, warnings: &[SelectionWarning]) {
        eprintln!(
            "Starting assessment with {} questions.",
            assessment.selected_questions().len()
        );
        for w in warnings {
            eprintln!("  note: {w}");
        }
    }

    fn on_abandoned(&self, assessment: &Assessment) {
        let (answered, total) = assessment.progress();
        eprintln!("Assessment abandoned after {answered}/{total} answers.");
    }

    fn on_completed(&self, _: &Assessment, outcome: &AssessmentOutcome) {
        eprintln!(
            "Assessment complete: {} ({})",
            outcome.resulting_level,
            outcome.resulting_level.stage()
        );
    }
}

/// What the learner typed at a prompt.
#[derive(Debug, PartialEq)]
enum Reply {
    /// 0-based option index.
    Choice(usize),
    Quit,
    Invalid,
}

fn parse_reply(line: &str, options: usize) -> Reply {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Reply::Quit;
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Reply::Choice(n - 1),
        _ => Reply::Invalid,
    }
}

pub async fn execute(
    bank_path: PathBuf,
    user: String,
    seed: Option<u64>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if seed.is_some() {
        config.seed = seed;
    }
    let output = output.or_else(|| config.output_dir.clone());

    let bank = load_gradable_bank(&bank_path, config.selection.per_level_min)?;
    let bank = Arc::new(bank);
    let engine = AssessmentEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::clone(&bank),
        config.to_engine_config(),
    )?
    .with_observer(Arc::new(ConsoleObserver));

    let started = engine.start_assessment(&user).await?;
    let id = started.assessment.id;
    let questions = started.assessment.selected_questions().to_vec();
    let total = questions.len();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for (i, question) in questions.iter().enumerate() {
        println!("\nQuestion {}/{} [{}]", i + 1, total, question.level);
        println!("{}", question.text);
        for (n, option) in question.options.iter().enumerate() {
            println!("  {}) {}", n + 1, option);
        }

        loop {
            println!("Answer 1-{} (q to quit):", question.options.len());
            let Some(line) = lines.next_line().await.context("failed to read answer")? else {
                engine.abandon_assessment(id).await?;
                anyhow::bail!("input ended before the assessment was finished");
            };
            match parse_reply(&line, question.options.len()) {
                Reply::Choice(index) => {
                    engine.record_answer(id, &question.id, index).await?;
                    break;
                }
                Reply::Quit => {
                    engine.abandon_assessment(id).await?;
                    println!("Assessment abandoned.");
                    return Ok(());
                }
                Reply::Invalid => {
                    println!("Please enter a number between 1 and {}.", question.options.len())
                }
            }
        }
    }

    engine.complete_assessment(id).await?;
    let assessment = engine.get(id).await?;
    let report = AssessmentReport::new(&assessment, &bank);

    println!("\n{}", report.summary());
    println!("{}", level_table(&report));

    if let Some(dir) = output {
        let path = dir.join(report.file_name());
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
