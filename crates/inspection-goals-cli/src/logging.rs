use tracing_subscriber::{fmt, EnvFilter};

/// Initialise stderr logging.
///
/// `RUST_LOG` wins when set (e.g. `RUST_LOG=inspection_goals_core=debug`);
/// otherwise `-v` raises the default from `warn` to `debug`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(verbose)
        .try_init();
}
