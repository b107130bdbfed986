//! Reflects executor completion back onto the originating Slack message.

use std::sync::Arc;

use async_trait::async_trait;
use vibe_deploy_core::{
    match_completion_notice, CommandKind, CompletionNotice, CompletionVerdict, MessageRef,
    StatusMutation, GO_LIVE_INSTRUCTION,
};

use super::{FeedHandler, OutboundSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Malformed,
    Ignored(CompletionVerdict),
    Unroutable,
    /// Both mutations were attempted; `failed` counts the ones that could
    /// not be published.
    Reflected { target: MessageRef, failed: usize },
}

pub struct CompletionListener {
    sink: Arc<dyn OutboundSink>,
}

impl CompletionListener {
    pub fn new(sink: Arc<dyn OutboundSink>) -> Self {
        Self { sink }
    }

    pub async fn handle_payload(&self, payload: &str) -> CompletionOutcome {
        let notice = match CompletionNotice::from_json(payload) {
            Ok(notice) => notice,
            Err(error) => {
                tracing::error!(%error, "error parsing command output");
                return CompletionOutcome::Malformed;
            }
        };

        let target = match match_completion_notice(&notice) {
            CompletionVerdict::Completed(target) => target,
            CompletionVerdict::Unroutable => {
                tracing::warn!(
                    "command output missing metadata (channel and timestamp required), cannot send reaction"
                );
                return CompletionOutcome::Unroutable;
            }
            verdict => {
                match &verdict {
                    CompletionVerdict::OtherKind { kind } => tracing::debug!(
                        kind = %kind,
                        "ignoring command output type (not {})",
                        CommandKind::VibeDeploy
                    ),
                    CompletionVerdict::OtherInstruction { command } => tracing::debug!(
                        command = %command,
                        "ignoring command (not {GO_LIVE_INSTRUCTION})"
                    ),
                    _ => {}
                }
                return CompletionOutcome::Ignored(verdict);
            }
        };

        tracing::info!(
            channel = %target.channel,
            ts = %target.ts,
            "processing completion for {}",
            CommandKind::VibeDeploy
        );

        let mut failed = 0_usize;
        for mutation in StatusMutation::completion_pair(&target) {
            let action = if mutation.remove { "remove" } else { "add" };
            match self.sink.push_status_mutation(&mutation).await {
                Ok(()) => tracing::info!(
                    channel = %target.channel,
                    ts = %target.ts,
                    action,
                    "published {} reaction",
                    mutation.reaction
                ),
                Err(error) => {
                    failed = failed.saturating_add(1);
                    tracing::error!(
                        channel = %target.channel,
                        ts = %target.ts,
                        action,
                        error = %format!("{error:#}"),
                        "error publishing {} reaction",
                        mutation.reaction
                    );
                }
            }
        }

        CompletionOutcome::Reflected { target, failed }
    }
}

#[async_trait]
impl FeedHandler for CompletionListener {
    async fn handle(&self, payload: &str) {
        self.handle_payload(payload).await;
    }
}
