use elt_config::Environment;
use std::io::Error;
use std::io::Write;
use std::sync::OnceLock;
use std::{
    backtrace::{Backtrace, BacktraceStatus},
    panic::PanicHookInfo,
    sync::Once,
};
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, InitError},
};
use tracing_log::{LogTracer, log_tracer::SetLoggerError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber, Registry, fmt, layer::SubscriberExt};

/// JSON field naming the pipeline in file logs.
const PIPELINE_KEY_IN_LOG: &str = "pipeline";

/// Directory rotated log files are written to.
const LOG_DIR: &str = "logs";

/// Number of daily log files kept on disk.
const MAX_LOG_FILES: usize = 5;

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to build rolling file appender: {0}")]
    InitAppender(#[from] InitError),

    #[error("failed to init log tracer: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("an io error occurred: {0}")]
    Io(#[from] Error),
}

/// Keeps buffered file logs alive until dropped.
///
/// Hold on to it for the lifetime of `main`, otherwise records still in the non-blocking writer
/// are lost on exit.
#[must_use]
pub enum LogFlusher {
    Flusher(WorkerGuard),
    NullFlusher,
}

static INIT_TEST_TRACING: Once = Once::new();

/// Enables console tracing in tests when `ENABLE_TRACING` is set:
///
/// ```bash
/// ENABLE_TRACING=1 cargo test test_name
/// ```
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // Without an environment the default is prod, which logs to files.
            Environment::Dev.set();
            let _log_flusher =
                init_tracing("test").expect("Failed to initialize tracing for tests");
        }
    });
}

static PIPELINE_NAME: OnceLock<String> = OnceLock::new();

/// Sets the pipeline name injected into every JSON log entry.
pub fn set_global_pipeline_name(pipeline_name: String) {
    let _ = PIPELINE_NAME.set(pipeline_name);
}

/// Returns the pipeline name injected into JSON log entries, if any.
pub fn get_global_pipeline_name() -> Option<&'static str> {
    PIPELINE_NAME.get().map(|s| s.as_str())
}

/// Writer that adds the pipeline field to JSON log lines that lack it.
struct PipelineInjectingWriter<W> {
    inner: W,
}

impl<W> PipelineInjectingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W> Write for PipelineInjectingWriter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(line) = inject_pipeline_field(buf) {
            // Report the original length so the caller does not retry the remainder.
            self.inner.write_all(line.as_bytes())?;
            return Ok(buf.len());
        }

        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Returns `buf` with the pipeline field added, or `None` when nothing has to change.
fn inject_pipeline_field(buf: &[u8]) -> Option<String> {
    let pipeline_name = get_global_pipeline_name()?;
    let json_str = std::str::from_utf8(buf).ok()?;

    let serde_json::Value::Object(mut map) =
        serde_json::from_str::<serde_json::Value>(json_str).ok()?
    else {
        return None;
    };

    if map.contains_key(PIPELINE_KEY_IN_LOG) {
        return None;
    }

    map.insert(
        PIPELINE_KEY_IN_LOG.to_string(),
        serde_json::Value::String(pipeline_name.to_string()),
    );

    let modified = serde_json::to_string(&map).ok()?;
    if json_str.ends_with('\n') {
        Some(format!("{modified}\n"))
    } else {
        Some(modified)
    }
}

/// Initializes tracing for the application.
///
/// Production-like environments write JSON to daily rotated files, development logs pretty
/// output to the console. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    init_tracing_with_pipeline(app_name, None)
}

/// Like [`init_tracing`], additionally tagging every file log entry with `pipeline_name`.
pub fn init_tracing_with_pipeline(
    app_name: &str,
    pipeline_name: Option<String>,
) -> Result<LogFlusher, TracingError> {
    if let Some(pipeline_name) = pipeline_name {
        set_global_pipeline_name(pipeline_name);
    }

    // Routes records emitted through the `log` crate, e.g. by `tokio-postgres`, into tracing.
    LogTracer::init()?;

    let is_prod = Environment::load()?.is_prod();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_flusher = if is_prod {
        configure_prod_tracing(filter, app_name)?
    } else {
        configure_dev_tracing(filter)?
    };

    set_tracing_panic_hook();

    Ok(log_flusher)
}

fn configure_prod_tracing(filter: EnvFilter, app_name: &str) -> Result<LogFlusher, TracingError> {
    let file_appender = rolling::Builder::new()
        .filename_prefix(app_name)
        .filename_suffix("log")
        .rotation(rolling::Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .build(LOG_DIR)?;

    let (file_appender, guard) = tracing_appender::non_blocking(file_appender);

    let format = fmt::format()
        .with_level(true)
        .with_ansi(false)
        .with_target(false);

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .event_format(format)
            .with_writer(move || PipelineInjectingWriter::new(file_appender.make_writer()))
            .json()
            .with_current_span(true)
            .with_span_list(true),
    );

    set_global_default(subscriber)?;

    Ok(LogFlusher::Flusher(guard))
}

fn configure_dev_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let format = fmt::format()
        .with_level(true)
        .with_ansi(true)
        .pretty()
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let subscriber = FmtSubscriber::builder()
        .event_format(format)
        .with_env_filter(filter)
        .finish();

    set_global_default(subscriber)?;

    Ok(LogFlusher::NullFlusher)
}

/// Logs panics through tracing before handing them to the previous hook, so they end up in the
/// log files and not only on stderr.
fn set_tracing_panic_hook() {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        panic_hook(info);
        prev_hook(info);
    }));
}

fn panic_hook(panic_info: &PanicHookInfo) {
    let backtrace = Backtrace::capture();
    let (backtrace, note) = match backtrace.status() {
        BacktraceStatus::Captured => (Some(backtrace), None),
        BacktraceStatus::Disabled => (
            None,
            Some("run with RUST_BACKTRACE=1 to display backtraces"),
        ),
        BacktraceStatus::Unsupported => {
            (None, Some("backtraces are not supported on this platform"))
        }
        _ => (None, Some("backtrace status is unknown")),
    };

    let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    };

    let location = panic_info.location().map(|location| location.to_string());

    tracing::error!(
        panic.payload = payload,
        payload.location = location,
        panic.backtrace = backtrace.map(tracing::field::display),
        panic.note = note,
        "a panic occurred",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_pipeline_field_into_json_lines() {
        set_global_pipeline_name("elt".to_string());

        let line = inject_pipeline_field(b"{\"level\":\"INFO\",\"message\":\"done\"}\n").unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();

        assert!(line.ends_with('\n'));
        assert_eq!(value["pipeline"], "elt");
        assert_eq!(value["message"], "done");
    }

    #[test]
    fn leaves_other_lines_untouched() {
        set_global_pipeline_name("elt".to_string());

        assert!(inject_pipeline_field(b"not json").is_none());
        assert!(inject_pipeline_field(b"[1, 2]").is_none());
        assert!(inject_pipeline_field(b"{\"pipeline\":\"other\"}").is_none());
    }
}
