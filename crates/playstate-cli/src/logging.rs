use crate::commands::run_ui::suspend_spinner;
use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// File filter directive for a verbosity count
fn file_directive(verbose_level: u8) -> &'static str {
    match verbose_level {
        0 => "info,hyper=warn,reqwest=warn",
        // -v: debug, keep connection pool chatter out
        1 => "debug,hyper=warn,reqwest=info",
        _ => "trace",
    }
}

fn console_directive(quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Stderr writer that clears the spinner line before each console event
struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        suspend_spinner(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Verbose append-only log file plus a terse console layer on stderr.
///
/// `RUST_LOG` replaces the file filter; `RUST_LOG_JSON=true` writes the file
/// as JSON lines.
pub fn init_logging(verbose_level: u8, quiet: bool, log_file: &Path) -> Result<()> {
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(file_directive(verbose_level)));

    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or(false);

    let log_dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(log_dir)?;
    let log_filename = log_file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", log_file.display()))?;

    // Never rotates, appends across runs
    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);

    let file_layer = if json {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(file_appender)
            .with_filter(file_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_writer(file_appender)
            .with_filter(file_filter)
            .boxed()
    };

    let console_layer = fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(|| ConsoleWriter)
        .with_filter(EnvFilter::new(console_directive(quiet)))
        .boxed();

    let layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![file_layer, console_layer];
    Registry::default().with(layers).try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives() {
        assert!(file_directive(0).starts_with("info"));
        assert!(file_directive(1).starts_with("debug"));
        assert_eq!(file_directive(5), "trace");
        assert_eq!(console_directive(true), "error");
        assert_eq!(console_directive(false), "warn");
    }

    #[test]
    fn test_default_file_filter_keeps_per_item_events() {
        let subscriber = Registry::default().with(
            fmt::layer()
                .with_writer(io::sink)
                .with_filter(EnvFilter::new(file_directive(0))),
        );
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "playstate_core::backup", tracing::Level::INFO));
            assert!(tracing::enabled!(target: "playstate_core::restore", tracing::Level::INFO));
            assert!(!tracing::enabled!(target: "playstate_core::pager", tracing::Level::DEBUG));
        });
    }
}
