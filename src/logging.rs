use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber used by both binaries.
///
/// Stdout stays clean: the tool server speaks JSON-RPC on it and the agent
/// prints its answers there. `RUST_LOG` wins over the default level.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
