//! Tracing setup: console output plus an optional plain-text run log.

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Console filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "datagov=info"
    } else {
        "datagov=warn"
    }
}

/// Layer appending every `datagov` event at info and above to `log_file`,
/// without ANSI colors. That covers one line per fetch attempt (URL with
/// status or transport error) and one per resolved dataset.
///
/// The guard flushes the writer on drop and must outlive the subscriber.
pub fn run_log_layer<S>(
    log_file: &Path,
) -> anyhow::Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let dir = log_file.parent().unwrap_or(Path::new("."));
    let file_name = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path: {}", log_file.display()))?;
    std::fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new("datagov=info"))
        .boxed();

    Ok((layer, guard))
}

/// Install the global subscriber, with the run log when `log_file` is set.
pub fn init(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let Some(log_file) = log_file else {
        tracing_subscriber::registry().with(console_layer).try_init()?;
        return Ok(None);
    };

    let (file_layer, guard) = run_log_layer(log_file)?;
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(Some(guard))
}
