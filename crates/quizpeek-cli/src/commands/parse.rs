use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quizpeek_core::classify::FailureCategory;
use quizpeek_core::config::{Config, config_path};
use quizpeek_core::parse::parse_response;
use quizpeek_core::render::Notice;

use super::{print_answer, print_notice};

pub fn run(file: Option<&Path>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    match parse_response(&text) {
        Ok(answer) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print_answer(&answer, None);
            }
            Ok(())
        }
        Err(reason) => {
            let config = Config::load(&config_path())?;
            print_notice(
                &Notice::for_category(FailureCategory::Parse),
                config.display.show_notifications,
            );
            anyhow::bail!("{reason}")
        }
    }
}
