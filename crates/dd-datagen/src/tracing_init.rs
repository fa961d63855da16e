use std::fmt::{self as stdfmt, Write as _};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dd_config::{LogFormat, LoggingConfig};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

// ---------------------------------------------------------------------------
// FileFields
// ---------------------------------------------------------------------------

/// Separate field formatter for the file layer, so span fields cached by the
/// stderr layer (which may carry ANSI codes) are not reused in the file.
#[derive(Default)]
struct FileFields(DefaultFields);

impl<'w> FormatFields<'w> for FileFields {
    fn format_fields<R: tracing_subscriber::field::RecordFields>(
        &self,
        writer: Writer<'w>,
        fields: R,
    ) -> stdfmt::Result {
        self.0.format_fields(writer, fields)
    }
}

// ---------------------------------------------------------------------------
// DomainFormat
// ---------------------------------------------------------------------------

/// Plain-text formatter that lifts the `domain` field into a prefix:
///
/// ```text
/// 2026-03-02T09:14:07Z  INFO [gen] task{index=3}: writing archive path="out/archives_03.gz" messages=61234
/// ```
///
/// Events from other crates carry no domain and are printed without one.
struct DomainFormat {
    timer: SystemTime,
}

impl DomainFormat {
    fn new() -> Self {
        Self { timer: SystemTime }
    }
}

/// Wrap `text` in an SGR sequence when the writer supports colour.
fn paint(writer: &mut Writer<'_>, sgr: &str, text: impl stdfmt::Display) -> stdfmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "\x1b[{sgr}m{text}\x1b[0m")
    } else {
        write!(writer, "{text}")
    }
}

fn level_sgr(level: Level) -> &'static str {
    match level {
        Level::ERROR => "31",
        Level::WARN => "33",
        Level::INFO => "32",
        Level::DEBUG => "34",
        Level::TRACE => "35",
    }
}

impl<S, N> FormatEvent<S, N> for DomainFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'w> FormatFields<'w> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let mut now = String::new();
        if self.timer.format_time(&mut Writer::new(&mut now)).is_err() {
            now.push_str("<unknown time>");
        }
        paint(&mut writer, "2", &now)?;

        let level = *event.metadata().level();
        write!(writer, " ")?;
        paint(&mut writer, level_sgr(level), format_args!("{level:>5}"))?;
        write!(writer, " ")?;

        let mut fields = EventFields::default();
        event.record(&mut fields);

        if let Some(domain) = &fields.domain {
            paint(&mut writer, "1;36", format_args!("[{domain}]"))?;
            write!(writer, " ")?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                paint(&mut writer, "1", span.name())?;
                let ext = span.extensions();
                match ext.get::<FormattedFields<N>>() {
                    Some(f) if !f.is_empty() => write!(writer, "{{{f}}}: ")?,
                    _ => write!(writer, "{{}}: ")?,
                }
            }
        }

        write!(writer, "{}", fields.message)?;
        if !fields.rest.is_empty() {
            write!(writer, " ")?;
            paint(&mut writer, "3", &fields.rest)?;
        }
        writeln!(writer)
    }
}

/// Splits an event into its domain, message and everything else.
#[derive(Default)]
struct EventFields {
    domain: Option<String>,
    message: String,
    rest: String,
}

impl EventFields {
    fn push(&mut self, name: &str, value: impl stdfmt::Display) {
        if !self.rest.is_empty() {
            self.rest.push(' ');
        }
        let _ = write!(self.rest, "{name}={value}");
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "domain" => self.domain = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => self.push(name, format_args!("{value:?}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn stdfmt::Debug) {
        match field.name() {
            "domain" => {
                self.domain = Some(format!("{value:?}").trim_matches('"').to_string());
            }
            "message" => {
                let _ = write!(self.message, "{value:?}");
            }
            name => self.push(name, format_args!("{value:?}")),
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field.name(), value);
    }
}

// ---------------------------------------------------------------------------
// init_tracing
// ---------------------------------------------------------------------------

/// `RUST_LOG` when set, otherwise the directives from `[logging]`.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if std::env::var("RUST_LOG").is_ok() {
        return Ok(EnvFilter::from_default_env());
    }
    let directives = config.filter_directives();
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter '{directives}'"))
}

fn resolve_log_file(file: &Path, base_dir: &Path) -> Result<(PathBuf, OsString)> {
    let resolved = if file.is_relative() {
        base_dir.join(file)
    } else {
        file.to_path_buf()
    };
    let name = resolved
        .file_name()
        .with_context(|| format!("log file {} has no file name", resolved.display()))?
        .to_os_string();
    let dir = resolved.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((dir, name))
}

/// Install the global subscriber described by `config`.
///
/// Events go to stderr and, when `config.file` is set, also to that file
/// through a non-blocking writer. Hold the returned guard until exit; dropping
/// it flushes the file writer. A relative `file` resolves against `base_dir`.
pub fn init_tracing(config: &LoggingConfig, base_dir: &Path) -> Result<Option<WorkerGuard>> {
    let json = config.format == LogFormat::Json;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let stderr = fmt::layer().with_writer(std::io::stderr);
    let stderr: BoxedLayer = if json {
        stderr
            .json()
            .with_target(false)
            .with_filter(build_filter(config)?)
            .boxed()
    } else {
        stderr
            .event_format(DomainFormat::new())
            .with_filter(build_filter(config)?)
            .boxed()
    };
    layers.push(stderr);

    let mut guard = None;
    if let Some(file) = &config.file {
        let (dir, name) = resolve_log_file(file, base_dir)?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
        let (writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, name));
        guard = Some(file_guard);

        let file_layer = fmt::layer()
            .fmt_fields(FileFields::default())
            .with_ansi(false)
            .with_writer(writer);
        let file_layer: BoxedLayer = if json {
            file_layer
                .json()
                .with_target(false)
                .with_filter(build_filter(config)?)
                .boxed()
        } else {
            file_layer
                .event_format(DomainFormat::new())
                .with_filter(build_filter(config)?)
                .boxed()
        };
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(guard)
}
