//! Logging initialization

/// Filter used when `RUST_LOG` is unset: progress from this crate, warnings
/// from everything else.
pub const DEFAULT_FILTER: &str = "warn,tilesynth=info";

/// Filter used by `--verbose`, which adds per-operation detail (accessors
/// appended, extensions attached).
pub const VERBOSE_FILTER: &str = "warn,tilesynth=debug";

/// Initialize env_logger with [`DEFAULT_FILTER`].
///
/// # Example
/// ```no_run
/// tilesynth::core::logging::init();
/// log::info!("Generator started");
/// ```
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Initialize env_logger, falling back to `filter` when `RUST_LOG` is unset.
///
/// A second call is a no-op, so tests and the binary can both call it.
pub fn init_with_filter(filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}
