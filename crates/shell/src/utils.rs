//! Some utilities

use std::path::{Path, PathBuf};

use ftlog::{
    LevelFilter, LoggerGuard,
    appender::{FileAppender, Period},
};
use serde::Serialize;

/// Configures the logger.
///
/// # Errors
///
/// - If a logs directory could not be located/created.
/// - If the logger could not be initialized.
pub fn configure_logger(file_name: &str) -> Result<(LoggerGuard, PathBuf), String> {
    let root_dir = PathBuf::from(".").canonicalize().map_err(|e| e.to_string())?;
    let logs_dir = root_dir.join("logs");
    if !logs_dir.exists() {
        std::fs::create_dir(&logs_dir).map_err(|e| e.to_string())?;
    }
    let log_path = logs_dir.join(file_name);

    let writer = FileAppender::builder().path(&log_path).rotate(Period::Day).build();

    let err_stem = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("Invalid log file name: {file_name}"))?;
    let err_path = log_path.with_file_name(format!("{err_stem}-err"));

    let guard = ftlog::Builder::new()
        // global max log level
        .max_log_level(LevelFilter::Info)
        // define root appender, pass None would write to stderr
        .root(writer)
        // write `Warn` and `Error` logs in ftlog::appender to `err_path` instead of `log_path`
        .filter("ftlog::appender", "ftlog-appender", LevelFilter::Warn)
        .appender("ftlog-appender", FileAppender::new(err_path))
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok((guard, log_path))
}

/// Writes a report as pretty-printed JSON to `out_path`, or to stdout if no path is given.
///
/// # Errors
///
/// - If the report could not be serialized.
/// - If the output file or its parent directory could not be created.
pub fn write_report<T: Serialize>(report: &T, out_path: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
    match out_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| format!("Failed to create parent directory: {e}"))?;
            }
            std::fs::write(path, json).map_err(|e| format!("Failed to write report to {path:?}: {e}"))?;
            ftlog::info!("Wrote report to {path:?}.");
        }
        None => println!("{json}"),
    }
    Ok(())
}
