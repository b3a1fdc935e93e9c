use anyhow::{Context, Result};
use colored::Colorize;
use quizpeek_core::config::{Config, config_path, quizpeek_dir};

pub fn run() -> Result<()> {
    let dir = quizpeek_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = config_path();
    if path.exists() {
        println!("  {} {}", "Exists".yellow(), path.display());
    } else {
        Config::default().save(&path)?;
        println!("  {} {}", "Created".green(), path.display());
    }

    println!();
    println!(
        "Set {} there (with {}) or export {}.",
        "[api] key".cyan(),
        "save_key = true".cyan(),
        "QUIZPEEK_API_KEY".cyan()
    );
    Ok(())
}
