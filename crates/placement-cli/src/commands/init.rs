//! The `placement init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create placement.toml
    if std::path::Path::new("placement.toml").exists() {
        println!("placement.toml already exists, skipping.");
    } else {
        std::fs::write("placement.toml", SAMPLE_CONFIG)?;
        println!("Created placement.toml");
    }

    // Create example question bank
    std::fs::create_dir_all("question-banks")?;
    let example_path = std::path::Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add questions to question-banks/example.toml (2-3 per level or more)");
    println!("  2. Run: placement validate --bank question-banks/example.toml");
    println!("  3. Run: placement take --bank question-banks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# placement configuration

# require_all: every selected question must be answered before completion.
# allow_partial: unanswered questions count as incorrect.
completion = "require_all"

# Uncomment for reproducible question selection.
# seed = 42

output_dir = "./placement-results"

[selection]
per_level_min = 2
per_level_max = 3

[[thresholds]]
level = "A1"
min_score = 0.0

[[thresholds]]
level = "A2"
min_score = 0.2

[[thresholds]]
level = "B1"
min_score = 0.4

[[thresholds]]
level = "B2"
min_score = 0.6

[[thresholds]]
level = "C1"
min_score = 0.8

[[thresholds]]
level = "C2"
min_score = 0.95
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Placement Bank"
description = "Two questions per CEFR level to get started"

[[questions]]
id = "a1-to-be"
level = "A1"
text = "My name ___ Anna."
options = ["am", "is", "are"]
correct_index = 1
skill_type = "grammar"

[[questions]]
id = "a1-colours"
level = "A1"
text = "The sky is ___."
options = "blue | green | red"
correct_index = 0
skill_type = "vocabulary"

[[questions]]
id = "a2-past-simple"
level = "A2"
text = "Yesterday I ___ to the cinema."
options = ["go", "went", "gone"]
correct_index = 1
skill_type = "grammar"

[[questions]]
id = "a2-prepositions"
level = "A2"
text = "The meeting is ___ Monday."
options = ["in", "on", "at"]
correct_index = 1
skill_type = "grammar"

[[questions]]
id = "b1-present-perfect"
level = "B1"
text = "I ___ here since 2019."
options = ["live", "am living", "have lived"]
correct_index = 2
skill_type = "grammar"

[[questions]]
id = "b1-phrasal"
level = "B1"
text = "Please ___ the form before you leave."
options = ["fill in", "fill on", "fill at"]
correct_index = 0
skill_type = "vocabulary"

[[questions]]
id = "b2-conditional"
level = "B2"
text = "If I ___ more time, I would travel more."
options = ["have", "had", "will have"]
correct_index = 1
skill_type = "grammar"
weight = 1.5

[[questions]]
id = "b2-collocation"
level = "B2"
text = "She ___ a decision after weeks of thought."
options = ["did", "made", "took out"]
correct_index = 1
skill_type = "vocabulary"
weight = 1.5

[[questions]]
id = "c1-inversion"
level = "C1"
text = "___ had I arrived than the phone rang."
options = ["Hardly", "No sooner", "Barely"]
correct_index = 1
skill_type = "grammar"
weight = 2.0

[[questions]]
id = "c1-register"
level = "C1"
text = "Which is the most formal way to ask for help?"
options = ["Give me a hand?", "Could you help?", "I would be grateful for your assistance."]
correct_index = 2
skill_type = "reading"
weight = 2.0

[[questions]]
id = "c2-idiom"
level = "C2"
text = "To 'take something with a pinch of salt' means to..."
options = ["believe it fully", "be sceptical about it", "add flavour to it"]
correct_index = 1
skill_type = "vocabulary"
weight = 2.5

[[questions]]
id = "c2-subjunctive"
level = "C2"
text = "It is essential that he ___ informed immediately."
options = ["is", "be", "was"]
correct_index = 1
skill_type = "grammar"
weight = 2.5
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use placement_core::config::PlacementConfig;
    use placement_core::parser::{parse_bank_str, validate_bank};

    #[test]
    fn sample_config_parses() {
        let config = PlacementConfig::from_toml_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.thresholds, Default::default());
        assert_eq!(config.selection.per_level_max, 3);
    }

    #[test]
    fn example_bank_is_valid() {
        let bank = parse_bank_str(EXAMPLE_BANK, Path::new("example.toml")).unwrap();
        assert_eq!(bank.questions.len(), 12);
        assert!(validate_bank(&bank, 2).is_empty());
    }
}
