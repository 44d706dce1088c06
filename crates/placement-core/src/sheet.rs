//! Import of question rows exported from a spreadsheet.
//!
//! Content authors maintain the bank as a sheet with a header row:
//!
//! ```text
//! row_id | level | question_text | answer_options | correct_answer | weight | skill_type
//! ```
//!
//! Header lookup is case-insensitive and column order does not matter.
//! Rows that fail validation are skipped and reported, never fatal.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::level::CefrLevel;
use crate::model::AssessmentQuestion;

/// Headers the importer looks for.
pub const EXPECTED_HEADERS: [&str; 7] = [
    "row_id",
    "level",
    "question_text",
    "answer_options",
    "correct_answer",
    "weight",
    "skill_type",
];

/// The `values` payload of a spreadsheet range export.
#[derive(Debug, Deserialize)]
pub struct SheetValues {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// A row that was skipped during import.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    /// 1-based sheet row number (the header is row 1).
    pub row: usize,
    pub reason: String,
}

/// Result of importing a sheet.
#[derive(Debug, Default)]
pub struct SheetImport {
    pub questions: Vec<AssessmentQuestion>,
    pub rejected: Vec<RowRejection>,
    /// Expected headers that were absent.
    pub missing_headers: Vec<String>,
}

/// Read a JSON range export (`{"values": [[...], ...]}`) from disk.
pub fn load_sheet_export(path: &Path) -> Result<SheetValues> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sheet export: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse sheet export: {}", path.display()))
}

/// Convert sheet rows into questions. The first row must be the header.
pub fn import_rows(values: &[Vec<String>]) -> SheetImport {
    let mut import = SheetImport::default();

    let Some((header, rows)) = values.split_first() else {
        tracing::warn!("sheet export has no rows");
        return import;
    };

    let header_map: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    for expected in EXPECTED_HEADERS {
        if !header_map.contains_key(expected) {
            tracing::warn!("missing header '{}'", expected);
            import.missing_headers.push(expected.to_string());
        }
    }

    for (offset, row) in rows.iter().enumerate() {
        let row_number = offset + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match parse_row(row, &header_map, row_number) {
            Ok(question) => import.questions.push(question),
            Err(reason) => {
                tracing::warn!("row {}: {}", row_number, reason);
                import.rejected.push(RowRejection {
                    row: row_number,
                    reason,
                });
            }
        }
    }

    tracing::info!(
        imported = import.questions.len(),
        rejected = import.rejected.len(),
        "sheet import finished"
    );
    import
}

fn parse_row(
    row: &[String],
    header_map: &HashMap<String, usize>,
    row_number: usize,
) -> Result<AssessmentQuestion, String> {
    let cell = |name: &str| cell_value(row, header_map, name);

    let level = cell("level");
    let text = cell("question_text");
    let raw_options = cell("answer_options");
    let correct = cell("correct_answer");
    if level.is_empty() || text.is_empty() || raw_options.is_empty() || correct.is_empty() {
        return Err("missing required fields".into());
    }

    let level: CefrLevel = level.parse()?;

    let options = normalize_options(raw_options)
        .filter(|o| o.len() >= 2)
        .ok_or_else(|| "need at least 2 answer options".to_string())?;

    let correct_index: usize = correct
        .parse()
        .map_err(|_| format!("invalid correct_answer '{correct}', must be an integer"))?;
    if correct_index >= options.len() {
        return Err(format!(
            "correct_answer {correct_index} out of range for {} options",
            options.len()
        ));
    }

    let weight = match cell("weight") {
        "" => 1.0,
        raw => match raw.parse::<f64>() {
            Ok(w) if w > 0.0 && w.is_finite() => w,
            Ok(w) => return Err(format!("weight must be positive, got {w}")),
            Err(_) => {
                tracing::warn!("row {}: invalid weight '{}', using 1.0", row_number, raw);
                1.0
            }
        },
    };

    let id = match cell("row_id") {
        "" => format!("row-{row_number}"),
        id => id.to_string(),
    };
    let skill_type = Some(cell("skill_type"))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(AssessmentQuestion {
        id,
        level,
        text: text.to_string(),
        options,
        correct_index,
        weight,
        skill_type,
    })
}

fn cell_value<'a>(row: &'a [String], header_map: &HashMap<String, usize>, name: &str) -> &'a str {
    header_map
        .get(name)
        .and_then(|&i| row.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// Split a single-cell option list into options.
///
/// Formats are tried in order: JSON array, `|`-delimited, `;`-delimited,
/// quoted CSV, then plain commas. Every delimited format needs at least two
/// non-empty options to match.
pub fn normalize_options(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with('[') {
        return match serde_json::from_str::<Vec<String>>(raw) {
            Ok(options) => Some(options),
            Err(e) => {
                tracing::debug!("options look like JSON but do not parse: {}", e);
                None
            }
        };
    }

    for delimiter in ['|', ';'] {
        if raw.contains(delimiter) {
            let options = split_trimmed(raw, delimiter);
            if options.len() >= 2 {
                return Some(options);
            }
        }
    }

    if raw.contains('"') {
        let options = split_quoted_csv(raw);
        if options.len() >= 2 {
            return Some(options);
        }
    }

    let options = split_trimmed(raw, ',');
    (options.len() >= 2).then_some(options)
}

fn split_trimmed(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma split that respects double quotes, with `""` as an escaped quote.
fn split_quoted_csv(raw: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn options_json_array() {
        assert_eq!(
            normalize_options(r#"["a, b", "c"]"#).unwrap(),
            vec!["a, b", "c"]
        );
        assert!(normalize_options("[not json").is_none());
    }

    #[test]
    fn options_pipe_beats_comma() {
        assert_eq!(
            normalize_options("Yes, I do | No, I don't").unwrap(),
            vec!["Yes, I do", "No, I don't"]
        );
    }

    #[test]
    fn options_semicolon() {
        assert_eq!(normalize_options("go; went; gone").unwrap(), vec!["go", "went", "gone"]);
    }

    #[test]
    fn options_quoted_csv() {
        assert_eq!(
            normalize_options(r#""well, then","so ""quoted""",plain"#).unwrap(),
            vec!["well, then", "so \"quoted\"", "plain"]
        );
    }

    #[test]
    fn options_comma_fallback_and_single_option() {
        assert_eq!(normalize_options("a,b , c").unwrap(), vec!["a", "b", "c"]);
        assert!(normalize_options("only").is_none());
        assert!(normalize_options("  ").is_none());
        // A lone pipe option falls through to the comma split.
        assert!(normalize_options("x|").is_none());
    }

    #[test]
    fn import_valid_and_invalid_rows() {
        let values = vec![
            row(&[
                "Row_ID",
                "Level",
                "Question_Text",
                "Answer_Options",
                "Correct_Answer",
                "Weight",
                "Skill_Type",
            ]),
            row(&["q1", "A1", "I ___ happy.", "am|is|are", "0", "", "grammar"]),
            row(&["q2", "B2", "Pick one", "x,y", "3", "1", ""]),
            row(&["", "", "", "", "", "", ""]),
            row(&["q3", "Z9", "Bad level", "x|y", "0", "1", ""]),
            row(&["q4", "C1", "Heavy", "x;y", "1", "2.5", ""]),
            row(&["q5", "C1", "Neg", "x;y", "1", "-1", ""]),
            row(&["q6", "A2", "Odd weight", "x;y", "1", "heavy", ""]),
        ];

        let import = import_rows(&values);
        let ids: Vec<&str> = import.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q4", "q6"]);
        assert_eq!(import.questions[0].weight, 1.0);
        assert_eq!(import.questions[0].skill_type.as_deref(), Some("grammar"));
        assert_eq!(import.questions[1].weight, 2.5);
        assert_eq!(import.questions[2].weight, 1.0);

        let rejected_rows: Vec<usize> = import.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rejected_rows, vec![3, 5, 7]);
        assert!(import.missing_headers.is_empty());
    }

    #[test]
    fn import_without_row_id_uses_row_number() {
        let values = vec![
            row(&["level", "question_text", "answer_options", "correct_answer"]),
            row(&["B1", "Choose", "a|b", "1"]),
        ];
        let import = import_rows(&values);
        assert_eq!(import.questions[0].id, "row-2");
        assert!(import.missing_headers.contains(&"row_id".to_string()));
    }

    #[test]
    fn import_empty_sheet() {
        let import = import_rows(&[]);
        assert!(import.questions.is_empty());
        assert!(import.rejected.is_empty());
    }

    #[test]
    fn load_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"{"range": "Assessment!A:H", "values": [["level"], ["A1"]]}"#,
        )
        .unwrap();
        let values = load_sheet_export(&path).unwrap();
        assert_eq!(values.values.len(), 2);
    }
}
