use anyhow::Result;
use colored::Colorize;
use quizpeek_core::config::{Config, config_path, log_path};

pub fn run() -> Result<()> {
    let path = config_path();
    let config = Config::load(&path)?;

    println!("{}", "quizpeek config".cyan().bold());
    println!();
    println!("  {} {}", "Config:".white(), path.display());
    if config.logging.file {
        println!("  {} {}", "Log file:".white(), log_path().display());
    }
    println!();

    println!("{}", "API".white().bold());
    println!("  {} {}", "Key:".white(), mask_key(&config.api_key()));
    println!("  {} {}", "Model:".white(), config.api.model);
    println!("  {} {}", "Endpoint:".white(), config.api.endpoint);
    println!("  {} {}s", "Timeout:".white(), config.api.timeout_secs);
    println!("  {} {}", "Reasoning:".white(), config.api.enable_reasoning);
    println!();

    println!("{}", "Display".white().bold());
    println!(
        "  {} {:.2}{}",
        "Confidence threshold:".white(),
        config.display.confidence_threshold,
        if config.display.bypass_confidence {
            " (bypassed)".dimmed().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "  {} {}",
        "Notifications:".white(),
        config.display.show_notifications
    );
    println!("  {} {}", "Hotkey:".white(), config.capture.hotkey);
    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 8 => "*".repeat(n),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}
