//! Logging setup for the fan control daemon

use fern::Dispatch;
use log::LevelFilter;

use crate::config;

/// Setup logging. The `DEBUG` environment toggle sets the base level
/// (debug when on, info otherwise); `-v` flags raise it further.
pub fn setup(verbosity: u8) -> Result<(), fern::InitError> {
    let base = if config::debug_enabled() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let level = match verbosity {
        0 => base,
        1 => base.max(LevelFilter::Debug),
        _ => LevelFilter::Trace,
    };

    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}
