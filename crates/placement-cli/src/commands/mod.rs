pub mod compare;
pub mod import;
pub mod init;
pub mod score;
pub mod take;
pub mod thresholds;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use placement_core::model::QuestionBank;
use placement_core::parser::{self, has_errors, Severity, ValidationWarning};
use placement_core::report::AssessmentReport;

/// Load a bank and refuse to continue if any question cannot be graded.
pub(crate) fn load_gradable_bank(path: &Path, per_level_min: usize) -> Result<QuestionBank> {
    let bank = parser::load_bank(path)?;
    let warnings = parser::validate_bank(&bank, per_level_min);
    print_warnings(&warnings);
    anyhow::ensure!(
        !has_errors(&warnings),
        "question bank {} has invalid questions; run `placement validate` for details",
        path.display()
    );
    Ok(bank)
}

pub(crate) fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        let label = match w.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        eprintln!("{prefix} {label}: {}", w.message);
    }
}

/// Per-level breakdown as a table.
pub(crate) fn level_table(report: &AssessmentReport) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Level", "Asked", "Answered", "Correct", "Accuracy"]);
    for s in &report.per_level {
        table.add_row(vec![
            Cell::new(s.level),
            Cell::new(s.asked),
            Cell::new(s.answered),
            Cell::new(s.correct),
            Cell::new(format!("{:.1}%", s.accuracy() * 100.0)),
        ]);
    }
    table
}
