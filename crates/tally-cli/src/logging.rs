//! Diagnostic logging on stderr

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives for a `-v` count, when no `TALLY_LOG` filter is set
pub fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "tally=debug,warn",
        _ => "tally=trace,debug",
    }
}

/// Install the global subscriber
///
/// `-v` flags take precedence over `filter` (the value of `TALLY_LOG`).
pub fn init(verbose: u8, filter: Option<&str>) {
    let directives = match filter {
        Some(filter) if verbose == 0 => filter,
        _ => default_directives(verbose),
    };
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time();

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directives(0), "warn");
        assert_eq!(default_directives(1), "tally=debug,warn");
        assert_eq!(default_directives(2), "tally=trace,debug");
        assert_eq!(default_directives(9), "tally=trace,debug");
    }

    #[test]
    fn test_directives_parse() {
        for verbose in 0..3 {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }
}
