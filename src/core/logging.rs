//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// voxfill::core::logging::init();
/// log::info!("Generative fill ready");
/// ```
pub fn init() {
    // try_init so repeated calls from tests and binaries do not panic
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp_millis()
    .try_init();
}
