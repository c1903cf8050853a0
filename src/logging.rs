// Logging setup — console output plus a dedicated security event log.
//
// Console: human-readable, filtered by RUST_LOG (default contentgate=info).
// Security log: plain text, append-only, and only sees warning-level
// events on the security target (blocked content). It ignores RUST_LOG so
// a quiet console never loses security events.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{Level, Metadata};
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::pipeline::engine::SECURITY_TARGET;

const DEFAULT_FILTER: &str = "contentgate=info,tower_http=info";

/// Install the global subscriber. Pass `None` to skip the security log file
/// (commands that never decide anything).
pub fn init(security_log: Option<&Path>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        );

    let security = match security_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open security log at {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter_fn(is_security_event)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(security)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

/// Warning-or-worse events on the security target.
pub fn is_security_event(metadata: &Metadata<'_>) -> bool {
    metadata.target() == SECURITY_TARGET && *metadata.level() <= Level::WARN
}
