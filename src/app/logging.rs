use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    init_logging_with_level("info");
}

/// `RUST_LOG` wins over the configured level.
pub fn init_logging_with_level(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg!(debug_assertions) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Uses the caller's trace id when it has one, otherwise mints a fresh one.
pub fn resolve_trace_id(input: Option<String>) -> String {
    input
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_supplied_trace_ids() {
        assert_eq!(resolve_trace_id(Some("trace-7".to_string())), "trace-7");
        let minted = resolve_trace_id(Some("  ".to_string()));
        assert!(uuid::Uuid::parse_str(&minted).is_ok());
        assert_ne!(resolve_trace_id(None), resolve_trace_id(None));
    }
}
