//! Logging for the command-line tool: console output routed around the
//! progress bars, plus a daily rolling log file.

use anyhow::Context;
use configuration::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::{IndicatifFilter, hide_indicatif_span_fields};
use tracing_subscriber::fmt::format::DefaultFields;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins over the configured level when set.
fn env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level}")),
    }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop and must be held until the program exits.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<WorkerGuard> {
    let level = settings.level.as_str();

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(settings.file_prefix.as_str())
        .build(&settings.directory)
        .with_context(|| format!("failed to open log directory {}", settings.directory))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Only spans marked `indicatif.pb_show` (the job progress bars) get a bar.
    let indicatif_layer =
        IndicatifLayer::new().with_span_field_formatter(hide_indicatif_span_fields(DefaultFields::new()));
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_filter(env_filter(level)?);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(env_filter(level)?);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(guard)
}
