//! The `placement thresholds` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use placement_core::config::load_config_from;
use placement_core::level::CefrLevel;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Level", "From", "To", "Stage"]);

    for level in CefrLevel::ALL {
        let (from, to) = config.thresholds.range(level);
        let to = if level == CefrLevel::C2 {
            format!("{:.0}% (incl.)", to * 100.0)
        } else {
            format!("{:.0}%", to * 100.0)
        };
        table.add_row(vec![
            Cell::new(level),
            Cell::new(format!("{:.0}%", from * 100.0)),
            Cell::new(to),
            Cell::new(level.stage()),
        ]);
    }

    println!("{table}");
    Ok(())
}
