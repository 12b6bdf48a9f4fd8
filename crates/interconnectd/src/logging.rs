//! Logging setup
//!
//! Every line carries the prefix
//! `[<LEVEL> <MMDD>-<HH:MM:SS> <pid> <file>:<line>] <message>`, for example
//! `[INFO 0509-17:16:17 18191 supervisor.rs:28] monitoring 2 bfd peers`.
//! Lines go to a daily rotated logfile and optionally to stdout as well.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Level, timestamp, process and source location
//! - AU-8: Time Stamps - Local time on every record
//! - AU-12: Audit Record Generation - All daemon activity goes through this layer

use std::fmt;
use std::path::Path;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{InterconnectError, Result};

/// Line prefix formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePrefix;

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

impl<S, N> FormatEvent<S, N> for LinePrefix
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let file = meta
            .file()
            .and_then(|path| Path::new(path).file_name())
            .and_then(|name| name.to_str())
            .unwrap_or("???");

        write!(
            writer,
            "[{} {} {} {}:{}] ",
            level_name(meta.level()),
            Local::now().format("%m%d-%H:%M:%S"),
            std::process::id(),
            file,
            meta.line().unwrap_or(0)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber described by `config`
///
/// The returned guard flushes the logfile writer when dropped and must be
/// kept alive for the lifetime of the process.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let directory = match config.logfile.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    let file_name = config
        .logfile
        .file_name()
        .ok_or_else(|| {
            InterconnectError::Logging(format!(
                "invalid logfile path {}",
                config.logfile.display()
            ))
        })?
        .to_os_string();

    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LinePrefix)
        .with_ansi(false)
        .with_writer(file_writer);

    let stdout_layer = config.log_to_stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(LinePrefix)
            .with_writer(std::io::stdout)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| InterconnectError::Logging(format!("Failed to set logger: {}", e)))?;

    Ok(guard)
}
