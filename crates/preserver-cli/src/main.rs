//! preserver CLI: answer questions about yourself and export the result as
//! a fine-tuning dataset.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::Globals;

#[derive(Parser)]
#[command(
    name = "preserver",
    version,
    about = "Build a personal question-and-answer dataset for LLM fine-tuning"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Question bank directory (overrides config)
    #[arg(long, global = true)]
    questions_dir: Option<PathBuf>,

    /// Answers root directory (overrides config)
    #[arg(long, global = true)]
    answers_dir: Option<PathBuf>,

    /// Exports directory (overrides config)
    #[arg(long, global = true)]
    exports_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and question bank
    Init,

    /// Show question and answer statistics
    Stats {
        /// Username to show progress for
        #[arg(long, short)]
        user: Option<String>,

        /// Per-category breakdown
        #[arg(long, short)]
        verbose: bool,
    },

    /// List question categories
    Categories,

    /// Check question files for common problems
    Validate,

    /// Show the next unanswered question
    Next {
        #[arg(long, short)]
        user: String,

        /// Restrict to one category
        #[arg(long, short)]
        category: Option<String>,

        /// Lowest category and question number first instead of random
        #[arg(long, conflicts_with = "random")]
        sequential: bool,

        /// Random order even if the config says otherwise
        #[arg(long)]
        random: bool,
    },

    /// Record an answer
    Answer {
        #[arg(long, short)]
        user: String,

        #[arg(long, short)]
        category: String,

        /// Question id, e.g. q3
        #[arg(long = "id")]
        question_id: String,

        /// Answer text (read from stdin if omitted)
        #[arg(long, short)]
        text: Option<String>,
    },

    /// Skip a question and show another unanswered one
    Skip {
        #[arg(long, short)]
        user: String,

        /// Question being skipped, as <category>/<id>
        #[arg(long)]
        current: String,

        /// Restrict to one category
        #[arg(long, short)]
        category: Option<String>,

        #[arg(long)]
        sequential: bool,
    },

    /// Export a user's answers
    Export {
        #[arg(long, short)]
        user: String,

        /// Export format: jsonl, conversation, json, markdown
        #[arg(long, short, default_value = "jsonl")]
        format: String,

        /// Output file path (default: exports dir with a timestamped name)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import a complete JSON export into a user's answers
    Import {
        #[arg(long, short)]
        user: String,

        /// JSON file produced by `export --format json`
        file: PathBuf,
    },

    /// Combine every user's answers into one JSON file
    Aggregate {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Dump the question bank as JSON for the static viewer
    QuestionsJson {
        #[arg(long, short, default_value = "questions.json")]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("preserver_core=warn,preserver_report=warn")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let globals = Globals {
        config: cli.config,
        questions_dir: cli.questions_dir,
        answers_dir: cli.answers_dir,
        exports_dir: cli.exports_dir,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Stats { user, verbose } => commands::stats::execute(&globals, user, verbose),
        Commands::Categories => commands::categories::execute(&globals),
        Commands::Validate => commands::validate::execute(&globals),
        Commands::Next {
            user,
            category,
            sequential,
            random,
        } => commands::next::execute(&globals, user, category, sequential, random),
        Commands::Answer {
            user,
            category,
            question_id,
            text,
        } => commands::answer::execute(&globals, user, category, question_id, text),
        Commands::Skip {
            user,
            current,
            category,
            sequential,
        } => commands::skip::execute(&globals, user, current, category, sequential),
        Commands::Export {
            user,
            format,
            output,
        } => commands::export::execute(&globals, user, format, output),
        Commands::Import { user, file } => commands::import::execute(&globals, user, file),
        Commands::Aggregate { output } => commands::aggregate::execute(&globals, output),
        Commands::QuestionsJson { output } => commands::questions_json::execute(&globals, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
