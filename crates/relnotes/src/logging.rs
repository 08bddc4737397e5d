//! Logging setup
//!
//! Logs always go to stderr so the rendered notes on stdout stay clean.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool, json: bool) {
    let default = if verbose {
        "relnotes=debug,relnotes_core=debug"
    } else {
        "relnotes=info,relnotes_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
