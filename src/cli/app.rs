use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use crate::config::{load_config, load_local_env_overrides, LoadedConfig};
use crate::logging::init_logging;

pub async fn run() -> Result<()> {
    load_local_env_overrides();
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;
    debug!(
        "Starting OmniTime v{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_DATE")
    );

    let LoadedConfig { settings, path } = load_config(cli.config.as_deref()).await?;
    let ctx = CliContext::new(settings, path);

    match dispatch(&cli, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("Command failed: {}", err);
            Err(err)
        }
    }
}
