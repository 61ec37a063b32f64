//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. Diagnostics go to stderr so they
/// never interleave with the chat transcript on stdout; verbosity is
/// controlled with `SUGIL_LOG` (e.g. `SUGIL_LOG=sugil=debug`).
pub fn init() {
    let filter = EnvFilter::try_from_env("SUGIL_LOG")
        .unwrap_or_else(|_| EnvFilter::new("sugil=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
