//! Tracing setup for the binary

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber; `RUST_LOG` overrides the default filter
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "create_school_student=debug"
    } else {
        "create_school_student=info"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
