use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub fn default_directives(verbose: bool, debug: bool) -> String {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    format!("replwatch_cli={level},replwatch_core={level},replwatch_protocol={level}")
}

/// Install the global subscriber. Logs go to stderr; stdout carries only the
/// verdict line.
pub fn init(verbose: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(verbose, debug).into());

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert!(default_directives(false, false).contains("replwatch_core=warn"));
        assert!(default_directives(true, false).contains("replwatch_core=info"));
        assert!(default_directives(true, true).contains("replwatch_protocol=debug"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(false, false);
        init(true, true);
    }
}
