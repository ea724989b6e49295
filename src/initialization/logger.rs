//! Logger initialization.
//!
//! Installs an `env_logger` backend for the binary. Library code only uses the
//! `log` facade, so embedding applications keep their own logger.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::{Level, LevelFilter};

/// Dependency modules that are chatty below the given level.
const QUIET_MODULES: &[(&str, LevelFilter)] = &[
    ("aws_config", LevelFilter::Warn),
    ("aws_smithy_runtime", LevelFilter::Warn),
    ("aws_sdk_kinesis", LevelFilter::Warn),
    ("hyper", LevelFilter::Info),
];

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first; `level` then applies to this crate and as the
/// default for everything else, while the AWS SDK and HTTP stack stay at
/// warn/info.
///
/// # Arguments
///
/// * `level` - Minimum log level for this crate (overrides `RUST_LOG`)
/// * `format` - Plain coloured lines or one JSON object per line
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=kinesis_producer=debug,aws_smithy_runtime=info kinesis_producer -s events records.txt
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for (module, ceiling) in QUIET_MODULES {
        builder.filter_module(module, (*ceiling).min(level));
    }
    builder.filter_module(env!("CARGO_PKG_NAME"), level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(record.level(), record.target(), &record.args().to_string())
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    record.target().cyan(),
                    paint_level(record.level()),
                    record.args()
                )
            });
        }
    }

    builder.try_init()?;
    Ok(())
}

fn paint_level(level: Level) -> ColoredString {
    let text = level.to_string();
    match level {
        Level::Error => text.red().bold(),
        Level::Warn => text.yellow(),
        Level::Info => text.green(),
        Level::Debug => text.blue(),
        Level::Trace => text.purple(),
    }
}

/// One structured log line: `{"ts":<unix millis>,"level":..,"target":..,"msg":..}`.
fn json_line(level: Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "ts": chrono::Utc::now().timestamp_millis(),
        "level": level.as_str(),
        "target": target,
        "msg": message,
    })
    .to_string()
}
