use core::fmt;
use std::fs::OpenOptions;
use std::sync::Once;

use tracing::Level;
use tracing::field::{Field, Visit};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt as tracingfmt};

use crate::gsm_time::MF51;

/// if `cond` is false, logs a warning with your message.
#[macro_export]
macro_rules! assert_warn {
    ($cond:expr, $($arg:tt)+) => {{
        if !$cond {
            tracing::warn!(
                target: module_path!(),
                "assertion warning: `{}` failed: {} at {}:{}",
                stringify!($cond),
                format_args!($($arg)+),
                file!(),
                line!(),
            );
        }
    }};
}

/// Width of the level, frame and location columns
const LOCATION_WIDTH: usize = 64;

/// Picks the `fnr` field the tick context attaches to its events
#[derive(Default)]
struct FnrField(Option<u64>);

impl Visit for FnrField {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "fnr" {
            self.0 = Some(value);
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
}

/// Event formatter with aligned columns:
/// `LEVEL fn/t3 [crate/module] file.rs:line: message`
struct GsmFormatter;

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[34m",
        Level::TRACE => "\x1b[35m",
    }
}

/// Shortens a source path of a workspace crate:
/// `crates/gsm-entities/src/lapdm/datalink.rs` becomes `[entities/lapdm] datalink.rs`
fn short_location(file: &str) -> String {
    let Some((krate, path)) = file.split_once("/src/") else {
        return file.to_string();
    };
    let krate = krate.rsplit('/').next().unwrap_or(krate);
    let krate = krate.strip_prefix("gsm-").unwrap_or(krate);
    match path.rsplit_once('/') {
        Some((dir, name)) => {
            let module = dir.split('/').next().unwrap_or(dir);
            format!("[{}/{}] {}", krate, module, name)
        }
        None => format!("[{}] {}", krate, path),
    }
}

/// Drops `fnr=...` from the rendered fields, it is shown in its own column
fn strip_fnr_field(fields: &mut String) {
    let Some(start) = fields.find("fnr=") else {
        return;
    };
    match fields[start..].find(' ') {
        Some(len) => fields.replace_range(start..start + len + 1, ""),
        None => fields.truncate(start.saturating_sub(1)),
    }
}

impl<S, N> FormatEvent<S, N> for GsmFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: format::Writer<'_>, event: &tracing::Event<'_>) -> fmt::Result {
        let meta = event.metadata();

        let mut fnr = FnrField::default();
        event.record(&mut fnr);
        let frame = match fnr.0 {
            Some(f) => format!("{:>7}/{:<2}", f, f % MF51 as u64),
            None => " ".repeat(10),
        };

        let color = if writer.has_ansi_escapes() { level_color(meta.level()) } else { "" };
        let reset = if color.is_empty() { "" } else { "\x1b[0m" };
        let location = format!(
            "{}{:<5}{} {} {}:{}:",
            color,
            meta.level(),
            reset,
            frame,
            short_location(meta.file().unwrap_or("unknown")),
            meta.line().unwrap_or(0)
        );

        let mut fields = String::new();
        ctx.field_format().format_fields(format::Writer::new(&mut fields), event)?;
        if fnr.0.is_some() {
            strip_fnr_field(&mut fields);
        }

        // Primitives are logged with "->" or "<-" prefixes, pull these left a bit
        let width = if fields.starts_with("->") || fields.starts_with("<-") { LOCATION_WIDTH - 3 } else { LOCATION_WIDTH };
        writeln!(writer, "{:<width$} {}", location, fields, width = width)
    }
}

static INIT_LOG: Once = Once::new();

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    setup_logging(EnvFilter::new("trace"), None);
}

/// Sets up default logging to stdout and optionally, a verbose log file
/// Returns a guard, that needs to be kept alive for logging to file to work
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    let logfile_and_filter = verbose_logfile.map(|file| (file, get_default_logfile_filter()));
    setup_logging(get_default_stdout_filter(), logfile_and_filter)
}

fn directive(s: &'static str) -> tracing_subscriber::filter::Directive {
    s.parse().unwrap_or_else(|e| panic!("bad log directive {}: {}", s, e))
}

pub fn get_default_stdout_filter() -> EnvFilter {
    EnvFilter::new("info")
        // Hide continuous logs from the lower layers
        .add_directive(directive("gsm_entities::messagerouter=warn"))
        .add_directive(directive("gsm_entities::phy=info"))
        .add_directive(directive("gsm_core::msgbuf=warn"))

        // Tick context, logs per frame at trace level
        .add_directive(directive("gsm_entities::l1s=info"))
        .add_directive(directive("gsm_entities::l1=debug"))

        // Data link layer and above
        .add_directive(directive("gsm_entities::lapdm=debug"))
        .add_directive(directive("gsm_entities::timer=info"))
        .add_directive(directive("gsm_l2=debug"))
}

fn get_default_logfile_filter() -> EnvFilter {
    EnvFilter::new("debug")
}

/// Sets up logging to stdout and optionally, a verbose log file.
/// If the log file is in use, returns the guard of its writer thread; keep it alive
/// or logging to file may cease working. Without a log file, returns None.
fn setup_logging(stdout_filter: EnvFilter, outfile: Option<(String, EnvFilter)>) -> Option<WorkerGuard> {
    let file = outfile.and_then(|(path, filter)| match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some((file, filter)),
        Err(e) => {
            eprintln!("Cannot open log file {}: {}, logging to stdout only", path, e);
            None
        }
    });

    let Some((file, file_filter)) = file else {
        INIT_LOG.call_once(|| {
            let stdout_layer = tracingfmt::layer().event_format(GsmFormatter).with_test_writer();
            tracing_subscriber::registry().with(stdout_layer.with_filter(stdout_filter)).init();
        });
        return None;
    };

    let (file_writer, guard) = tracing_appender::non_blocking(file);
    INIT_LOG.call_once(|| {
        let file_layer = tracingfmt::layer().event_format(GsmFormatter).with_writer(file_writer).with_ansi(false);
        let stdout_layer = tracingfmt::layer().event_format(GsmFormatter);

        tracing_subscriber::registry()
            .with(file_layer.with_filter(file_filter))
            .with(stdout_layer.with_filter(stdout_filter))
            .init();
    });
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_location() {
        assert_eq!(short_location("crates/gsm-entities/src/lapdm/datalink.rs"), "[entities/lapdm] datalink.rs");
        assert_eq!(short_location("crates/gsm-core/src/msgbuf.rs"), "[core] msgbuf.rs");
        assert_eq!(short_location("bins/gsm-l2-ms/src/main.rs"), "[l2-ms] main.rs");
        assert_eq!(short_location("main.rs"), "main.rs");
    }

    #[test]
    fn test_strip_fnr_field() {
        let mut fields = "fnr=1234 l1s: tx block".to_string();
        strip_fnr_field(&mut fields);
        assert_eq!(fields, "l1s: tx block");

        let mut fields = "resync fnr=99".to_string();
        strip_fnr_field(&mut fields);
        assert_eq!(fields, "resync");
    }
}
