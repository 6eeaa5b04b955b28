//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. The filter comes from `RUST_LOG` and
/// defaults to `info`; `json` switches to one JSON object per event.
/// Logs go to stderr so command output on stdout stays machine-readable.
pub(crate) fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Ignore the error when a subscriber is already installed
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
