//! The `placement validate` command.

use std::path::PathBuf;

use anyhow::Result;

use placement_core::config::load_config_from;
use placement_core::parser::{self, has_errors};

use super::print_warnings;

pub fn execute(bank_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let banks = if bank_path.is_dir() {
        parser::load_bank_directory(&bank_path)?
    } else {
        vec![parser::parse_bank(&bank_path)?]
    };

    let mut total_warnings = 0;
    let mut invalid_banks = 0;

    for bank in &banks {
        println!("Bank: {} ({} questions)", bank.name, bank.questions.len());
        for (level, pool) in bank.by_level() {
            println!("  {level}: {}", pool.len());
        }

        let warnings = parser::validate_bank(bank, config.selection.per_level_min);
        print_warnings(&warnings);
        if has_errors(&warnings) {
            invalid_banks += 1;
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} finding(s).");
    }

    anyhow::ensure!(
        invalid_banks == 0,
        "{invalid_banks} question bank(s) contain invalid questions"
    );
    Ok(())
}
