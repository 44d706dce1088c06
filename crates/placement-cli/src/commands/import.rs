//! The `placement import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use placement_core::model::QuestionBank;
use placement_core::parser::bank_to_toml;
use placement_core::sheet::{import_rows, load_sheet_export};

pub fn execute(sheet_path: PathBuf, output: PathBuf, id: String, name: String) -> Result<()> {
    let values = load_sheet_export(&sheet_path)?;
    let import = import_rows(&values.values);

    for missing in &import.missing_headers {
        eprintln!("  WARNING: missing header '{missing}'");
    }
    for rejected in &import.rejected {
        eprintln!("  row {}: {}", rejected.row, rejected.reason);
    }

    anyhow::ensure!(
        !import.questions.is_empty(),
        "no usable questions in {}",
        sheet_path.display()
    );

    let bank = QuestionBank {
        id,
        name,
        description: format!("Imported from {}", sheet_path.display()),
        questions: import.questions,
    };

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, bank_to_toml(&bank)?)
        .with_context(|| format!("failed to write bank to {}", output.display()))?;

    println!(
        "Imported {} question(s), skipped {} row(s) -> {}",
        bank.questions.len(),
        import.rejected.len(),
        output.display()
    );
    Ok(())
}
