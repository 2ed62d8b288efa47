//! Logging initialization: logs go only to a file (or are dropped), never to the console.
//!
//! Reads `RUST_LOG` (level) and `LOG_FILE` (path) from the env (e.g. via .env). The console is
//! reserved for the conversation.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::log_format::TurnFormat;

/// Installs the global subscriber.
///
/// - **RUST_LOG**: filter, e.g. `info`, `bxlchat=debug`. Default: `info`.
/// - **LOG_FILE**: when set, logs are appended to this file (plain text). When unset, logs
///   are dropped.
///
/// Keep the returned guard alive for the life of the process; dropping it flushes the file.
pub fn init() -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off"));

    let Ok(path) = std::env::var("LOG_FILE") else {
        let sink_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(sink_layer).try_init()?;
        return Ok(None);
    };

    let path = Path::new(&path);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("LOG_FILE has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(TurnFormat::new())
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(file_layer).try_init()?;
    tracing::info!(path = %path.display(), "bxlchat logging to file");
    Ok(Some(guard))
}
