// Colored terminal output for decisions and configuration.

use colored::Colorize;

use crate::config::Config;
use crate::pipeline::{ValidationDecision, ValidationRequest};

/// Display one decision with the request that produced it.
pub fn display_decision(request: &ValidationRequest, decision: &ValidationDecision) {
    println!(
        "\n{}",
        format!("=== Decision for user {} ===", request.user_id).bold()
    );
    println!("  Category: {}", request.category);
    println!(
        "  Input: {}",
        super::truncate_chars(&request.input, 120).dimmed()
    );

    let verdict = if decision.blocked {
        "BLOCKED".red().bold()
    } else {
        "ALLOWED".green().bold()
    };
    println!("  Verdict: {verdict}");
    println!("  Reason: {}", decision.reason);
    println!("  Confidence: {:.2}", decision.confidence);
}

/// Display the effective configuration, with the API key masked.
pub fn display_config(config: &Config) {
    println!("\n{}", "=== contentgate configuration ===".bold());
    println!("  Moderation endpoint: {}/moderations", config.moderation_base_url);
    println!("  Moderation model: {}", config.moderation_model);
    println!("  API key: {}", config.redacted_api_key());
    println!(
        "  Confidence threshold: > {:.2}",
        config.confidence_threshold
    );
    println!(
        "  Rate limit: {} requests / {}s per user",
        config.rate_limit,
        config.rate_window.as_secs()
    );
    println!(
        "  Moderation timeout: {}s",
        config.moderation_timeout.as_secs()
    );
    match config.sweep_interval {
        Some(interval) => println!("  Idle-user sweep: every {}s", interval.as_secs()),
        None => println!("  Idle-user sweep: {}", "disabled".yellow()),
    }
    println!("  Security log: {}", config.security_log_path.display());
}
