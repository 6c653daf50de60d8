use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is set but does not parse.
pub const DEFAULT_FILTER: &str = "conduit=debug,conduit_core=debug";

/// Development helper: initialize tracing subscriber when `RUST_LOG` is set.
///
/// Tests can call `conduit::dev_tracing::init_tracing()` to see the context's
/// `[CONTEXT]`/`[MEMORY]` logs. This is a no-op when `RUST_LOG` is not set
/// or when a global subscriber is already installed.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
