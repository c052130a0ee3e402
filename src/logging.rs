//! Process-wide `tracing` setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Installs the global subscriber: console output (plain or JSON) plus an
/// optional daily rotating file. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},reingreso={level},tower_http=warn",
            level = config.level
        ))
    });

    // `tracing_appender::rolling::daily` panics if it can't create the initial
    // log file, so writability is checked first.
    let file_layer = config.dir.as_ref().and_then(|log_dir| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Could not create log directory {} ({}), file logging disabled",
                log_dir.display(),
                e
            );
            return None;
        }
        let test_path = log_dir.join(".reingreso_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(log_dir, "reingreso.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the lifetime of the process
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    log_dir.display(),
                    e
                );
                None
            }
        }
    });

    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let file_logging_enabled = file_layer.is_some();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let (true, Some(dir)) = (file_logging_enabled, config.dir.as_ref()) {
        eprintln!("Logging to: {}/reingreso.log", dir.display());
    }
}

/// Minimal logging for one-shot CLI commands
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .try_init();
}
