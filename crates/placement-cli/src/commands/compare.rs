//! The `placement compare` command.

use std::path::PathBuf;

use anyhow::Result;

use placement_core::report::AssessmentReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = AssessmentReport::load_json(&baseline_path)?;
    let current = AssessmentReport::load_json(&current_path)?;

    if baseline.user_id != current.user_id {
        tracing::warn!(
            "comparing reports for different users: {} and {}",
            baseline.user_id,
            current.user_id
        );
    }

    let Some(comparison) = current.compare(&baseline) else {
        anyhow::bail!("both reports must be for completed assessments");
    };

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            println!(
                "Level: {} -> {} ({:+} level(s))",
                comparison.previous_level, comparison.current_level, comparison.level_delta
            );
            println!("Score change: {:+.1}%", comparison.score_delta * 100.0);
        }
    }

    if fail_on_regression && comparison.regressed() {
        std::process::exit(1);
    }

    Ok(())
}
