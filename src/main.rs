use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use contentgate::config::Config;
use contentgate::moderation::openai::OpenAiModerationClient;
use contentgate::pipeline::{DecisionEngine, DecisionPolicy, ValidationRequest};
use contentgate::rate_limit::RateLimiter;

/// contentgate: content-validation gateway.
///
/// Rate-limits callers per user, asks a moderation classifier about their
/// text, and answers allow or block.
#[derive(Parser)]
#[command(name = "contentgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 8000)
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Run a single piece of text through the full pipeline
    Check {
        /// The text to validate
        text: String,

        /// User identifier to rate-limit under
        #[arg(long, default_value = "cli")]
        user: String,

        /// Context tag carried with the request
        #[arg(long, default_value = "general")]
        category: String,

        /// Print the decision as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration (API key masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            contentgate::logging::init(Some(&config.security_log_path))?;
            config.require_moderation()?;

            info!(
                model = %config.moderation_model,
                threshold = config.confidence_threshold,
                rate_limit = config.rate_limit,
                window_secs = config.rate_window.as_secs(),
                "Starting contentgate"
            );

            let engine = build_engine(&config)?;
            contentgate::web::run_server(engine, port, &bind, config.sweep_interval).await?;
        }

        Commands::Check {
            text,
            user,
            category,
            json,
        } => {
            contentgate::logging::init(Some(&config.security_log_path))?;
            config.require_moderation()?;

            let engine = build_engine(&config)?;
            let request = ValidationRequest {
                user_id: user,
                input: text,
                category,
            };
            let decision = engine.decide(&request).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                contentgate::output::terminal::display_decision(&request, &decision);
            }
        }

        Commands::Config => {
            contentgate::logging::init(None)?;
            contentgate::output::terminal::display_config(&config);
        }
    }

    Ok(())
}

/// Wire the limiter, the HTTP classifier client and the policy together.
fn build_engine(config: &Config) -> Result<Arc<DecisionEngine>> {
    let client = OpenAiModerationClient::from_config(config)?;
    info!(endpoint = client.endpoint(), "Using OpenAI-compatible moderation API");

    let limiter = Arc::new(RateLimiter::new(config.limits()));
    Ok(Arc::new(DecisionEngine::new(
        limiter,
        Arc::new(client),
        DecisionPolicy::from_config(config),
    )))
}
