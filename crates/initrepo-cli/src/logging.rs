use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub struct LogOptions<'a> {
    pub verbose: bool,
    /// Skip the console layer; the file is always written.
    pub quiet: bool,
    pub file: &'a Path,
}

/// Keeps the run's subscriber installed. Dropping it uninstalls the subscriber
/// and closes the log file.
pub struct LogGuard {
    _default: tracing::subscriber::DefaultGuard,
}

/// Install logging for this run: append to the log file and, unless quiet,
/// mirror to stderr. `RUST_LOG` overrides the level.
pub fn init(opts: &LogOptions<'_>) -> anyhow::Result<LogGuard> {
    let level = if opts.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(opts.file)
        .with_context(|| format!("failed to open log file {}", opts.file.display()))?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);

    let console_layer = (!opts.quiet).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
    })
}
