use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

// reqwest and hyper stay at warn unless RUST_LOG asks for more.
const DEFAULT_DIRECTIVES: &str = "info,reqwest=warn,hyper_util=warn";

/// Installs the stderr subscriber. `RUST_LOG` replaces the default directives.
pub fn init() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_DIRECTIVES).context("build default log filter")?,
    };

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))
}
