mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quizpeek", about = "Answer the quiz question in a screenshot with a vision model")]
struct Cli {
    /// Log debug events
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.toml to the quizpeek data directory
    Init,
    /// Send a prepared screenshot to the model and print the answer
    Answer {
        /// Cropped and downscaled screenshot (png, jpeg or webp)
        image: PathBuf,
        /// Print the normalized answer as JSON
        #[arg(long)]
        json: bool,
        /// Show the answer even below the confidence threshold
        #[arg(long)]
        bypass: bool,
    },
    /// Parse raw model output from a file (or stdin) without calling the API
    Parse {
        /// File with the model's text; reads stdin when omitted
        file: Option<PathBuf>,
        /// Print the normalized answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the config file location and effective settings
    Config,
}

fn main() {
    let cli = Cli::parse();

    let result = commands::init_logging(cli.verbose).and_then(|()| match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Answer { image, json, bypass } => commands::answer::run(&image, json, bypass),
        Commands::Parse { file, json } => commands::parse::run(file.as_deref(), json),
        Commands::Config => commands::config::run(),
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
