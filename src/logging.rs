//! Diagnostics logging
//!
//! Logs go to stderr so stdout only ever carries rendered results.
//! `RUST_LOG` takes precedence over the verbosity flags.

use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter directive for the chosen verbosity
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize the global tracing subscriber
pub fn init(verbose: bool, quiet: bool, ansi: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "debug");
        assert_eq!(default_directive(true, true), "error");
    }
}
