use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Progress goes to stderr so stdout stays clean for `inspect` output.
/// `RUST_LOG` overrides the default level.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
