use env_logger::Builder;
use log::{LevelFilter, SetLoggerError};

pub fn parse_level(log_level: &str) -> Option<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => return None,
    };
    Some(level)
}

/// Installs the global logger. Writes to stderr with second-resolution timestamps.
///
/// Fails when a logger is already installed; the existing one stays in place.
pub fn init_logger(log_level: &str) -> Result<(), SetLoggerError> {
    let level = parse_level(log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', defaulting to 'info'", log_level);
        LevelFilter::Info
    });

    let mut builder = Builder::new();
    builder.filter_level(level).format_timestamp_secs();

    builder.try_init()
}
