//! quizvault CLI: bank management, exam taking and results review.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "quizvault", version, about = "Timed multiple-choice exams with encrypted results")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the data files (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and empty data files
    Init,

    /// Check a question bank file for invalid tests and questions
    Validate {
        /// Bank file (.enc is encrypted, anything else plain JSON)
        #[arg(long)]
        bank: PathBuf,
    },

    /// Merge a question bank file into the current bank
    Import {
        /// Bank file to import
        #[arg(long)]
        from: PathBuf,

        /// What to do with tests whose name is already taken
        #[arg(long, value_enum, default_value = "skip")]
        on_conflict: OnConflict,
    },

    /// Write the current bank to a file
    Export {
        /// Target file (defaults to a timestamped JSON file)
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// List the tests in the bank
    List,

    /// Take a test in the terminal
    Take {
        /// Name of the test
        #[arg(long)]
        test: String,

        /// Student's full name
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        school: String,

        #[arg(long)]
        grade: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Take the test again even if this student already has a result
        #[arg(long)]
        retake: bool,

        /// Show answers in the order they were written
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Show stored results and per-test summaries
    Results {
        /// Only show results of this test
        #[arg(long)]
        test: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete one stored result by its index in `results`
    DeleteResult {
        #[arg(long)]
        index: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OnConflict {
    Skip,
    Override,
    Merge,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OnConflict> for quizvault_core::import::ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        use quizvault_core::import::ConflictPolicy;
        match value {
            OnConflict::Skip => ConflictPolicy::Skip,
            OnConflict::Override => ConflictPolicy::Override,
            OnConflict::Merge => ConflictPolicy::Merge,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizvault=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config;
    let data_dir = cli.data_dir;

    let result = match cli.command {
        Commands::Init => commands::init::execute(config_path, data_dir),
        Commands::Validate { bank } => commands::load_config(config_path, data_dir)
            .and_then(|config| commands::validate::execute(&config, bank)),
        Commands::Import { from, on_conflict } => commands::load_config(config_path, data_dir)
            .and_then(|config| commands::import::execute(&config, from, on_conflict.into())),
        Commands::Export { to } => commands::load_config(config_path, data_dir)
            .and_then(|config| commands::export::execute(&config, to)),
        Commands::List => commands::load_config(config_path, data_dir)
            .and_then(|config| commands::list::execute(&config)),
        Commands::Take {
            test,
            name,
            school,
            grade,
            phone,
            retake,
            no_shuffle,
        } => match commands::load_config(config_path, data_dir) {
            Ok(config) => {
                let student = quizvault_core::model::StudentInfo {
                    name,
                    school,
                    grade,
                    phone,
                };
                commands::take::execute(&config, test, student, retake, no_shuffle).await
            }
            Err(e) => Err(e),
        },
        Commands::Results { test, format } => commands::load_config(config_path, data_dir)
            .and_then(|config| commands::results::execute(&config, test, format)),
        Commands::DeleteResult { index } => commands::load_config(config_path, data_dir)
            .and_then(|config| commands::delete_result::execute(&config, index)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
