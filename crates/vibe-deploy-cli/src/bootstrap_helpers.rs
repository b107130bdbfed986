use tracing_subscriber::EnvFilter;

use crate::cli_args::LogLevel;

/// Installs the process-wide subscriber. `level` is the default directive;
/// `RUST_LOG` can still refine individual targets.
pub(crate) fn init_tracing(level: LogLevel) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.as_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
