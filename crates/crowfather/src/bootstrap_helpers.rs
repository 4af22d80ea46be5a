use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Compact stdout logging; `RUST_LOG` overrides the `info` default.
pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
