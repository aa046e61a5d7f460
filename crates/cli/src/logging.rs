// Tracing setup: stderr (pretty or JSON) plus an optional rolling file

use crate::settings::LogFormat;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "gpoctl.log";

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "gpoctl=warn",
        1 => "gpoctl=info",
        _ => "gpoctl=debug",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbose`.
///
/// The returned guard flushes the file writer on drop; keep it alive until exit.
pub fn init(format: LogFormat, log_dir: Option<&Path>, verbose: u8) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = match format {
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}
