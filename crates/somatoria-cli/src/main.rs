//! somatoria CLI — grade sum-coded answer sheets from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use somatoria_core::engine::MergePolicy;
use somatoria_core::model::LanguageVariant;

mod commands;

#[derive(Parser)]
#[command(name = "somatoria", version, about = "Sum-coded answer-sheet grader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one answer sheet
    Grade {
        /// Path to an exam definition TOML file
        #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
        exam: Option<PathBuf>,

        /// Built-in PSS 2 2025 answer key: ingles or espanhol
        #[arg(long)]
        preset: Option<LanguageVariant>,

        /// Override the number of questions (1-100)
        #[arg(long)]
        questions: Option<usize>,

        /// Text file with the student's answers ("1) 10" per line)
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Answer-sheet photos to read with OCR (files or directories)
        #[arg(long, num_args = 1..)]
        image: Vec<PathBuf>,

        /// Student name or identifier for the report
        #[arg(long)]
        student: Option<String>,

        /// OCR provider name from the config
        #[arg(long)]
        provider: Option<String>,

        /// How detections from several photos are combined: last-wins, first-wins
        #[arg(long)]
        merge: Option<MergePolicy>,

        /// Output format: text, json, html, markdown, all
        #[arg(long, default_value = "text")]
        format: String,

        /// Output directory for report files
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Read answers from answer-sheet photos
    Scan {
        /// Answer-sheet photos (files or directories)
        #[arg(long, num_args = 1.., required = true)]
        image: Vec<PathBuf>,

        /// OCR provider name from the config
        #[arg(long)]
        provider: Option<String>,

        /// How detections from several photos are combined: last-wins, first-wins
        #[arg(long)]
        merge: Option<MergePolicy>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Parse OCR text into detected answers
    Parse {
        /// Text file to parse (reads stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate exam definition TOML files
    Validate {
        /// Path to exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Create starter config and example exam definition
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("somatoria=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            exam,
            preset,
            questions,
            answers,
            image,
            student,
            provider,
            merge,
            format,
            output,
            config,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                exam,
                preset,
                questions,
                answers,
                images: image,
                student,
                provider,
                merge,
                format,
                output,
                config,
            })
            .await
        }
        Commands::Scan {
            image,
            provider,
            merge,
            format,
            config,
        } => commands::scan::execute(image, provider, merge, format, config).await,
        Commands::Parse { input, format } => commands::parse::execute(input, format),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
