use std::fmt;
use std::fs::OpenOptions;

use thiserror::Error;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{PrettyFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PATH: &str = "/tmp/taskmaster.log";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("init logging error: `{0}`")]
    TryInitError(String),

    #[error("cannot open log file '{0}': {1}")]
    LogFileError(String, #[source] std::io::Error),
}

pub struct Logging;

impl Logging {
    /// Installs two subscriber layers: a stderr diagnostic layer for
    /// operators attached to a terminal (env-filter driven, matching the
    /// teacher's `Logging::try_init`), and an append-only layer at
    /// `/tmp/taskmaster.log` in the literal
    /// `"{timestamp} - {LEVEL} - {message}"` format the log file requires.
    /// The file layer writes through a `tracing_appender` non-blocking
    /// writer; the returned guard must be held for the program's lifetime
    /// or buffered writes are dropped on exit.
    pub fn try_init() -> Result<tracing_appender::non_blocking::WorkerGuard, LoggingError> {
        let env_filter = EnvFilter::builder()
            .with_default_directive(tracing::metadata::LevelFilter::INFO.into())
            .from_env_lossy();

        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .fmt_fields(PrettyFields::new());

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE_PATH)
            .map_err(|e| LoggingError::LogFileError(LOG_FILE_PATH.to_string(), e))?;

        let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .event_format(TaskmasterLogFormat);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| LoggingError::TryInitError(e.to_string()))?;

        Ok(guard)
    }
}

/// Renders one event as `"{timestamp} - {LEVEL} - {message}"`.
struct TaskmasterLogFormat;

impl<S, N> FormatEvent<S, N> for TaskmasterLogFormat
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
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        write!(writer, "{now} - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
