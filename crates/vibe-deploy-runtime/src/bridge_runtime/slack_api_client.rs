//! Slack Web API client used to resolve the metadata attached to a reacted
//! message.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use vibe_deploy_core::{MessageRef, PrMetadata};

use super::MessageMetadataSource;

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<SlackHistoryMessage>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct SlackHistoryMessage {
    #[serde(default)]
    pub(super) ts: Option<String>,
    #[serde(default)]
    pub(super) metadata: Option<SlackMessageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct SlackMessageMetadata {
    #[serde(default)]
    pub(super) event_type: Option<String>,
    #[serde(default)]
    pub(super) event_payload: Option<Value>,
}

#[derive(Clone)]
/// Minimal Slack Web API client authenticated with a bot token.
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackApiClient {
    /// `request_timeout_ms == 0` leaves requests without a client-side timeout.
    pub fn new(api_base: String, bot_token: String, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("vibe-deploy-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(request_timeout_ms));
        }
        let http = builder.build().context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    /// Fetches the single message at `target.ts` (inclusive), with structured
    /// metadata included.
    pub(super) async fn fetch_message(&self, target: &MessageRef) -> Result<SlackHistoryMessage> {
        let response: SlackConversationHistoryResponse = self
            .request_json(
                "conversations.history",
                self.http
                    .get(format!("{}/conversations.history", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[
                        ("channel", target.channel.as_str()),
                        ("latest", target.ts.as_str()),
                        ("inclusive", "true"),
                        ("limit", "1"),
                        ("include_all_metadata", "true"),
                    ]),
            )
            .await?;

        if !response.ok {
            bail!(
                "slack conversations.history failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        response.messages.into_iter().next().ok_or_else(|| {
            anyhow!(
                "no messages found in channel {} at {}",
                target.channel,
                target.ts
            )
        })
    }

    async fn request_json<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("slack api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .with_context(|| format!("failed to decode slack {operation}"));
        }
        let body = response.text().await.unwrap_or_default();
        bail!(
            "slack api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }
}

#[async_trait]
impl MessageMetadataSource for SlackApiClient {
    async fn resolve_metadata(&self, target: &MessageRef) -> Result<Option<PrMetadata>> {
        let message = self.fetch_message(target).await?;
        let Some(metadata) = message.metadata else {
            return Ok(None);
        };
        tracing::debug!(
            channel = %target.channel,
            ts = message.ts.as_deref().unwrap_or_default(),
            event_type = metadata.event_type.as_deref().unwrap_or_default(),
            "message carries structured metadata"
        );
        Ok(PrMetadata::from_event_payload(metadata.event_payload.as_ref()))
    }
}

fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
