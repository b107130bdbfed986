//! Redis pub/sub feeds and list sinks shared by both bridge loops.

use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use redis::{aio::ConnectionManager, AsyncCommands, IntoConnectionInfo};
use vibe_deploy_core::{DeploymentCommand, StatusMutation};

use super::OutboundSink;

/// Raw payload stream produced by a pub/sub subscription.
pub type PayloadFeed = Pin<Box<dyn Stream<Item = String> + Send>>;

#[derive(Clone)]
/// Shared Redis client plus one multiplexed connection for list pushes.
pub struct RedisBus {
    client: redis::Client,
    manager: ConnectionManager,
    addr: String,
}

impl RedisBus {
    /// Opens the client for `host:port`, authenticating with `password` when
    /// one is given.
    pub async fn connect(addr: &str, password: Option<&str>) -> Result<Self> {
        let mut info = format!("redis://{addr}")
            .into_connection_info()
            .with_context(|| format!("invalid redis address {addr}"))?;
        if let Some(password) = password.filter(|value| !value.is_empty()) {
            info.redis.password = Some(password.to_string());
        }
        let client = redis::Client::open(info)
            .with_context(|| format!("failed to open redis client for {addr}"))?;
        let manager = client
            .get_connection_manager()
            .await
            .with_context(|| format!("failed to connect to redis at {addr}"))?;
        Ok(Self {
            client,
            manager,
            addr: addr.to_string(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .with_context(|| format!("failed to ping redis at {}", self.addr))?;
        Ok(())
    }

    /// Subscribes a dedicated pub/sub connection to `channel`.
    ///
    /// Payloads that are not valid strings are logged and skipped. The
    /// stream ends when the connection is lost.
    pub async fn subscribe(&self, channel: &str) -> Result<PayloadFeed> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .with_context(|| format!("failed to open redis pubsub connection to {}", self.addr))?;
        pubsub
            .subscribe(channel)
            .await
            .with_context(|| format!("failed to subscribe to redis channel {channel}"))?;
        tracing::info!(channel, "subscribed to redis channel");

        let channel = channel.to_string();
        let feed = pubsub.into_on_message().filter_map(move |message| {
            let payload = match message.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(error) => {
                    tracing::error!(channel = %channel, %error, "undecodable pubsub payload");
                    None
                }
            };
            std::future::ready(payload)
        });
        Ok(Box::pin(feed))
    }

    pub fn list_sink(
        &self,
        command_list: impl Into<String>,
        reaction_list: impl Into<String>,
    ) -> RedisListSink {
        RedisListSink {
            manager: self.manager.clone(),
            routes: ListRoutes {
                command_list: command_list.into(),
                reaction_list: reaction_list.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Names of the two outbound lists and the encoding pushed onto each.
struct ListRoutes {
    command_list: String,
    reaction_list: String,
}

impl ListRoutes {
    fn deployment_command(&self, command: &DeploymentCommand) -> Result<(&str, String)> {
        let payload = command
            .to_json()
            .context("failed to encode deployment command")?;
        Ok((&self.command_list, payload))
    }

    fn status_mutation(&self, mutation: &StatusMutation) -> Result<(&str, String)> {
        let payload = mutation
            .to_json()
            .context("failed to encode status mutation")?;
        Ok((&self.reaction_list, payload))
    }
}

#[derive(Clone)]
/// Pushes commands and reaction mutations onto their Redis lists.
pub struct RedisListSink {
    manager: ConnectionManager,
    routes: ListRoutes,
}

impl RedisListSink {
    async fn rpush(&self, list: &str, payload: String) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.rpush::<_, _, ()>(list, payload)
            .await
            .with_context(|| format!("failed to push to redis list {list}"))
    }
}

#[async_trait]
impl OutboundSink for RedisListSink {
    async fn push_deployment_command(&self, command: &DeploymentCommand) -> Result<()> {
        let (list, payload) = self.routes.deployment_command(command)?;
        self.rpush(list, payload).await
    }

    async fn push_status_mutation(&self, mutation: &StatusMutation) -> Result<()> {
        let (list, payload) = self.routes.status_mutation(mutation)?;
        self.rpush(list, payload).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use vibe_deploy_core::{synthesize_deployment_command, MessageRef, PrMetadata};

    use super::*;

    fn routes() -> ListRoutes {
        ListRoutes {
            command_list: "poppit-commands".to_string(),
            reaction_list: "slack_reactions".to_string(),
        }
    }

    #[test]
    fn unit_deployment_commands_route_to_command_list() {
        let metadata = PrMetadata {
            repository: "org/app".to_string(),
            branch: "feat/x".to_string(),
            ..PrMetadata::default()
        };
        let command = synthesize_deployment_command(
            &metadata,
            "/app/repos",
            Some(MessageRef::new("C1", "100.1")),
        );
        let routes = routes();
        let (list, payload) = routes.deployment_command(&command).expect("route");
        assert_eq!(list, "poppit-commands");
        let wire: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(wire["repo"], "org/app");
        assert_eq!(wire["type"], "vibe-deploy");
    }

    #[test]
    fn unit_status_mutations_route_to_reaction_list() {
        let mutation = StatusMutation::mark_in_progress(&MessageRef::new("C1", "100.1"));
        let routes = routes();
        let (list, payload) = routes.status_mutation(&mutation).expect("route");
        assert_eq!(list, "slack_reactions");
        let wire: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(
            wire,
            json!({"reaction": "gear", "channel": "C1", "ts": "100.1", "remove": false})
        );
    }
}
