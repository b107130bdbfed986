//! Startup preflight and wiring for the bridge process.

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use tokio::sync::watch;
use vibe_deploy_core::RepoAllowlist;
use vibe_deploy_runtime::{run_bridge, BridgeRuntimeConfig, RedisBus, SlackApiClient};

use crate::cli_args::{
    Cli, DEFAULT_BASE_DIR, DEFAULT_COMMAND_LIST, DEFAULT_COMMAND_OUTPUT_CHANNEL,
    DEFAULT_REACTION_CHANNEL, DEFAULT_REACTION_LIST, DEFAULT_REDIS_ADDR, DEFAULT_SLACK_API_BASE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated process settings; nothing is read from the environment after
/// this is built.
pub(crate) struct BridgeSettings {
    pub(crate) redis_addr: String,
    pub(crate) redis_password: Option<String>,
    pub(crate) slack_bot_token: String,
    pub(crate) slack_api_base: String,
    pub(crate) slack_request_timeout_ms: u64,
    pub(crate) base_dir: String,
    pub(crate) reaction_channel: String,
    pub(crate) command_list: String,
    pub(crate) command_output_channel: String,
    pub(crate) reaction_list: String,
    pub(crate) allowed_repos_config: Option<PathBuf>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn or_default(value: String, default: &str) -> String {
    non_blank(Some(value)).unwrap_or_else(|| default.to_string())
}

impl BridgeSettings {
    pub(crate) fn from_cli(cli: Cli) -> Result<Self> {
        let Some(slack_bot_token) = non_blank(cli.slack_bot_token) else {
            bail!("SLACK_BOT_TOKEN environment variable is required");
        };
        Ok(Self {
            redis_addr: or_default(cli.redis_addr, DEFAULT_REDIS_ADDR),
            redis_password: non_blank(cli.redis_password),
            slack_bot_token,
            slack_api_base: or_default(cli.slack_api_base, DEFAULT_SLACK_API_BASE),
            slack_request_timeout_ms: cli.slack_request_timeout_ms,
            base_dir: or_default(cli.base_dir, DEFAULT_BASE_DIR),
            reaction_channel: or_default(cli.reaction_channel, DEFAULT_REACTION_CHANNEL),
            command_list: or_default(cli.command_list, DEFAULT_COMMAND_LIST),
            command_output_channel: or_default(
                cli.command_output_channel,
                DEFAULT_COMMAND_OUTPUT_CHANNEL,
            ),
            reaction_list: or_default(cli.reaction_list, DEFAULT_REACTION_LIST),
            allowed_repos_config: cli
                .allowed_repos_config
                .filter(|path| !path.as_os_str().is_empty()),
        })
    }
}

/// Loads the allowlist, connects to Redis and runs both loops until a
/// termination signal arrives or a feed is lost.
pub(crate) async fn run_bridge_from_settings(settings: BridgeSettings) -> Result<()> {
    let allowlist = RepoAllowlist::load(settings.allowed_repos_config.as_deref())
        .context("failed to load allowed repos configuration")?;
    if allowlist.is_restricted() {
        tracing::info!(
            count = allowlist.repo_count().unwrap_or_default(),
            "repository allowlist enforced"
        );
    } else {
        tracing::info!("repository allowlist disabled, all repositories may deploy");
    }

    let bus = RedisBus::connect(&settings.redis_addr, settings.redis_password.as_deref())
        .await
        .context("failed to connect to redis")?;
    bus.ping().await.context("failed to connect to redis")?;
    tracing::info!(addr = bus.addr(), "connected to redis");

    let slack_client = SlackApiClient::new(
        settings.slack_api_base.clone(),
        settings.slack_bot_token.clone(),
        settings.slack_request_timeout_ms,
    )?;
    let sink = bus.list_sink(settings.command_list.clone(), settings.reaction_list.clone());

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);
    let shutdown = Arc::new(shutdown_tx);
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(()) => {
                tracing::info!("shutting down");
                signal_shutdown.send_replace(true);
            }
            Err(error) => tracing::error!(error = %format!("{error:#}"), "signal handler failed"),
        }
    });

    let config = BridgeRuntimeConfig {
        reaction_channel: settings.reaction_channel,
        command_output_channel: settings.command_output_channel,
        base_dir: settings.base_dir,
        allowlist,
    };
    run_bridge(
        &bus,
        Arc::new(slack_client),
        Arc::new(sink),
        config,
        shutdown,
    )
    .await
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("failed to listen for ctrl-c")?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    Ok(())
}
