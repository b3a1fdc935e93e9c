pub mod answer;
pub mod config;
pub mod init;
pub mod parse;

use anyhow::{Context, Result};
use colored::Colorize;
use quizpeek_core::answer::QuizAnswer;
use quizpeek_core::config::{Config, config_path, log_path};
use quizpeek_core::logging;
use quizpeek_core::render::{self, Notice, NoticeColor};

/// Load config (defaults when absent) and install the global subscriber.
pub fn init_logging(verbose: bool) -> Result<()> {
    let config = Config::load(&config_path()).context("loading config for logging")?;
    let file = config.logging.file.then(log_path);
    logging::init(&config.logging, verbose, file.as_deref())?;
    Ok(())
}

/// Print an answer the way the answer dialog lays it out.
pub fn print_answer(answer: &QuizAnswer, elapsed_ms: Option<u128>) {
    println!("{}", answer.question.white().bold());
    for line in render::answer_summary(answer).lines() {
        println!("  {}", line.green());
    }
    println!("  Confidence: {:.2}", answer.confidence);
    if let Some(ms) = elapsed_ms {
        println!("  Inference time: {ms} ms");
    }
}

/// Print a failure notice, honouring `[display] show_notifications`.
pub fn print_notice(notice: &Notice, show_notifications: bool) {
    if !notice.should_show(show_notifications) {
        return;
    }
    let text = match notice.color {
        NoticeColor::Amber => notice.text.yellow().bold(),
        NoticeColor::Red => notice.text.red().bold(),
    };
    if notice.blocking {
        eprintln!("{text}: check [api] key in {}", config_path().display());
    } else {
        eprintln!("{text}");
    }
}
