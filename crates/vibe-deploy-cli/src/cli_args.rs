use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

pub(crate) const DEFAULT_REDIS_ADDR: &str = "localhost:6379";
pub(crate) const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub(crate) const DEFAULT_BASE_DIR: &str = "/app/repos";
pub(crate) const DEFAULT_REACTION_CHANNEL: &str = "slack-relay-reaction-added";
pub(crate) const DEFAULT_COMMAND_LIST: &str = "poppit-commands";
pub(crate) const DEFAULT_COMMAND_OUTPUT_CHANNEL: &str = "poppit:command-output";
pub(crate) const DEFAULT_REACTION_LIST: &str = "slack_reactions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Minimum severity written to the log.
pub(crate) enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub(crate) fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

/// Case-insensitive; unrecognized values fall back to `info`.
fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    let level = match value.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => LogLevel::Debug,
        "WARN" => LogLevel::Warn,
        "ERROR" => LogLevel::Error,
        _ => LogLevel::Info,
    };
    Ok(level)
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "vibe-deploy-bridge",
    about = "Turns rocket reactions on pull-request messages into deployment commands",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "redis-addr",
        env = "REDIS_ADDR",
        default_value = DEFAULT_REDIS_ADDR,
        help = "Redis address as host:port"
    )]
    pub(crate) redis_addr: String,

    #[arg(
        long = "redis-password",
        env = "REDIS_PASSWORD",
        hide_env_values = true,
        help = "Redis password (empty disables auth)"
    )]
    pub(crate) redis_password: Option<String>,

    #[arg(
        long = "slack-bot-token",
        env = "SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token for Web API (xoxb-...)"
    )]
    pub(crate) slack_bot_token: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "SLACK_API_BASE",
        default_value = DEFAULT_SLACK_API_BASE,
        help = "Slack Web API base URL"
    )]
    pub(crate) slack_api_base: String,

    #[arg(
        long = "slack-request-timeout-ms",
        env = "SLACK_REQUEST_TIMEOUT_MS",
        default_value_t = 0,
        help = "Timeout for Slack Web API requests in milliseconds (0 disables the timeout)"
    )]
    pub(crate) slack_request_timeout_ms: u64,

    #[arg(
        long = "base-dir",
        env = "BASE_DIR",
        default_value = DEFAULT_BASE_DIR,
        help = "Directory under which repositories are checked out on the executor host"
    )]
    pub(crate) base_dir: String,

    #[arg(
        long = "reaction-channel",
        env = "REDIS_PUBSUB_CHANNEL",
        default_value = DEFAULT_REACTION_CHANNEL,
        help = "Pub/sub channel carrying reaction_added events"
    )]
    pub(crate) reaction_channel: String,

    #[arg(
        long = "command-list",
        env = "REDIS_LIST_NAME",
        default_value = DEFAULT_COMMAND_LIST,
        help = "List that deployment commands are pushed onto"
    )]
    pub(crate) command_list: String,

    #[arg(
        long = "command-output-channel",
        env = "REDIS_OUTPUT_CHANNEL",
        default_value = DEFAULT_COMMAND_OUTPUT_CHANNEL,
        help = "Pub/sub channel carrying executor command output"
    )]
    pub(crate) command_output_channel: String,

    #[arg(
        long = "reaction-list",
        env = "REDIS_REACTION_LIST",
        default_value = DEFAULT_REACTION_LIST,
        help = "List that reaction add/remove requests are pushed onto"
    )]
    pub(crate) reaction_list: String,

    #[arg(
        long = "log-level",
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = parse_log_level,
        help = "Minimum log severity: debug, info, warn, error"
    )]
    pub(crate) log_level: LogLevel,

    #[arg(
        long = "allowed-repos-config",
        env = "ALLOWED_REPOS_CONFIG",
        help = "YAML file listing repositories allowed to deploy (unset allows all)"
    )]
    pub(crate) allowed_repos_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_parse_log_level_is_case_insensitive_with_info_fallback() {
        assert_eq!(parse_log_level("debug"), Ok(LogLevel::Debug));
        assert_eq!(parse_log_level("WARN"), Ok(LogLevel::Warn));
        assert_eq!(parse_log_level("Error"), Ok(LogLevel::Error));
        assert_eq!(parse_log_level("verbose"), Ok(LogLevel::Info));
        assert_eq!(parse_log_level(""), Ok(LogLevel::Info));
    }

    #[test]
    fn unit_log_level_maps_to_level_filter() {
        assert_eq!(LogLevel::Debug.as_level_filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::default().as_level_filter(), LevelFilter::INFO);
    }

    #[test]
    fn functional_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "vibe-deploy-bridge",
            "--redis-addr",
            "redis.internal:6380",
            "--slack-bot-token",
            "xoxb-flag",
            "--base-dir",
            "/srv/repos",
            "--reaction-channel",
            "reactions",
            "--command-list",
            "commands",
            "--command-output-channel",
            "output",
            "--reaction-list",
            "reactions-out",
            "--log-level",
            "debug",
            "--allowed-repos-config",
            "/etc/bridge/allowed.yaml",
        ])
        .expect("parse");
        assert_eq!(cli.redis_addr, "redis.internal:6380");
        assert_eq!(cli.slack_bot_token.as_deref(), Some("xoxb-flag"));
        assert_eq!(cli.base_dir, "/srv/repos");
        assert_eq!(cli.reaction_channel, "reactions");
        assert_eq!(cli.command_list, "commands");
        assert_eq!(cli.command_output_channel, "output");
        assert_eq!(cli.reaction_list, "reactions-out");
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(
            cli.allowed_repos_config,
            Some(PathBuf::from("/etc/bridge/allowed.yaml"))
        );
    }
}
