use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins when set; the
/// service itself defaults to info.
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(
        "usage_service=info"
            .parse()
            .unwrap_or_else(|_| "info".parse().unwrap()),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
