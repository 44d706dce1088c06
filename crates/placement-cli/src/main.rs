//! placement CLI: run and grade CEFR placement assessments from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "placement", version, about = "CEFR placement assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an assessment interactively
    Take {
        /// Path to .toml question bank or directory
        #[arg(long)]
        bank: PathBuf,

        /// Learner identifier
        #[arg(long, default_value = "local")]
        user: String,

        /// Fixed selection seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Directory to save the JSON report into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a prepared answer sheet
    Score {
        /// Path to .toml question bank or directory
        #[arg(long)]
        bank: PathBuf,

        /// JSON object mapping question id to chosen option index (0-based)
        #[arg(long)]
        answers: PathBuf,

        /// Learner identifier recorded in the report
        #[arg(long, default_value = "local")]
        user: String,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two assessment reports
    Compare {
        /// Earlier report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Later report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if the level went down
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to question bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Convert a spreadsheet JSON export into a question bank
    Import {
        /// JSON range export with a `values` array, header row first
        #[arg(long)]
        sheet: PathBuf,

        /// Destination .toml file
        #[arg(long)]
        output: PathBuf,

        /// Bank identifier
        #[arg(long, default_value = "imported")]
        id: String,

        /// Bank name
        #[arg(long, default_value = "Imported bank")]
        name: String,
    },

    /// Print the active score-to-level thresholds
    Thresholds {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("placement=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            user,
            seed,
            output,
            config,
        } => commands::take::execute(bank, user, seed, output, config).await,
        Commands::Score {
            bank,
            answers,
            user,
            format,
            config,
        } => commands::score::execute(bank, answers, user, format, config),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Import {
            sheet,
            output,
            id,
            name,
        } => commands::import::execute(sheet, output, id, name),
        Commands::Thresholds { config } => commands::thresholds::execute(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
