use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use colored::Colorize;
use quizpeek_core::backend::OpenRouterBackend;
use quizpeek_core::config::{Config, config_path};
use quizpeek_core::errors::CoreError;
use quizpeek_core::pipeline::{ImagePayload, Pipeline, RequestSettings};
use quizpeek_core::render::{self, Notice};
use quizpeek_core::request::{image_data_url, mime_for_path};
use tracing::info;

use super::{print_answer, print_notice};

pub fn run(image: &Path, json: bool, bypass: bool) -> Result<()> {
    let config = Config::load(&config_path())?;

    let mime = mime_for_path(image).ok_or_else(|| {
        CoreError::Image(format!(
            "unsupported image type: {} (expected png, jpeg or webp)",
            image.display()
        ))
    })?;
    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let payload = ImagePayload {
        data_url: image_data_url(&bytes, mime),
    };

    let backend = OpenRouterBackend::new(&config.api, config.api_key())?;
    let pipeline = Pipeline::new(
        backend,
        RequestSettings {
            model: config.api.model.clone(),
            enable_reasoning: config.api.enable_reasoning,
        },
    );

    info!(image = %image.display(), model = %config.api.model, "starting capture");
    let (tx, rx) = mpsc::channel();
    let worker = pipeline
        .trigger(payload, move |result| {
            let _ = tx.send(result);
        })
        .ok_or(CoreError::Busy)?;
    let result = rx.recv().context("capture worker exited without a result")?;
    let _ = worker.join();

    let answered = match result {
        Ok(answered) => answered,
        Err(category) => {
            print_notice(
                &Notice::for_category(category),
                config.display.show_notifications,
            );
            anyhow::bail!("capture failed ({category})");
        }
    };

    let answer = &answered.answer;
    let elapsed_ms = answered.elapsed.as_millis();
    let show = render::passes_threshold(
        answer.confidence,
        config.display.confidence_threshold,
        bypass || config.display.bypass_confidence,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(answer)?);
    } else if show {
        print_answer(answer, Some(elapsed_ms));
    } else {
        println!(
            "  {} confidence {:.2} is below threshold {:.2} (use --bypass to show)",
            "Hidden:".yellow(),
            answer.confidence,
            config.display.confidence_threshold
        );
    }
    eprintln!("{}", render::status_line(elapsed_ms, answer.confidence).dimmed());
    Ok(())
}
