//! Logger setup shared by both binaries.

use log::LevelFilter;

/// Initialise `env_logger`.
///
/// Defaults to `info` (`debug` with `verbose`); `RUST_LOG` overrides both.
/// Records are printed bare so device lines read like console output.
pub fn init(verbose: bool) {
    let default = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let _ = env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .format_level(verbose)
        .try_init();
}
