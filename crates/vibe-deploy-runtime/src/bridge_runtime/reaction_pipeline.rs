//! Turns qualifying rocket reactions into deployment commands.

use std::sync::Arc;

use async_trait::async_trait;
use vibe_deploy_core::{
    filter_reaction_event, synthesize_deployment_command, DeploymentCommand, FilterRejection,
    ReactionEvent, ReactionName, RepoAllowlist, StatusMutation,
};

use super::{FeedHandler, MessageMetadataSource, OutboundSink};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terminal state of a single reaction payload.
pub enum ReactionOutcome {
    Malformed,
    Filtered(FilterRejection),
    ResolveFailed,
    NoMetadata,
    NotAllowed { repository: String },
    PublishFailed,
    Enqueued(DeploymentCommand),
}

pub struct ReactionPipeline {
    metadata_source: Arc<dyn MessageMetadataSource>,
    sink: Arc<dyn OutboundSink>,
    allowlist: RepoAllowlist,
    base_dir: String,
}

impl ReactionPipeline {
    pub fn new(
        metadata_source: Arc<dyn MessageMetadataSource>,
        sink: Arc<dyn OutboundSink>,
        allowlist: RepoAllowlist,
        base_dir: impl Into<String>,
    ) -> Self {
        Self {
            metadata_source,
            sink,
            allowlist,
            base_dir: base_dir.into(),
        }
    }

    pub async fn handle_payload(&self, payload: &str) -> ReactionOutcome {
        let event = match ReactionEvent::from_json(payload) {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(%error, "error parsing reaction event");
                return ReactionOutcome::Malformed;
            }
        };

        let target = match filter_reaction_event(&event) {
            Ok(target) => target,
            Err(rejection) => {
                match &rejection {
                    FilterRejection::SelfTriggered { user } => tracing::info!(
                        user = %user,
                        channel = %event.event.item.channel,
                        ts = %event.event.item.ts,
                        "ignoring {} reaction from bot user",
                        ReactionName::trigger()
                    ),
                    FilterRejection::NotTrigger { reaction } => tracing::debug!(
                        reaction = %reaction,
                        "ignoring reaction (not {})",
                        ReactionName::trigger()
                    ),
                    FilterRejection::NotMessage { item_type } => tracing::debug!(
                        item_type = %item_type,
                        "ignoring item type (not message)"
                    ),
                }
                return ReactionOutcome::Filtered(rejection);
            }
        };

        tracing::info!(
            channel = %target.channel,
            ts = %target.ts,
            "processing {} reaction",
            ReactionName::trigger()
        );

        let metadata = match self.metadata_source.resolve_metadata(&target).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                tracing::debug!(
                    channel = %target.channel,
                    ts = %target.ts,
                    "no pr metadata found in message, skipping"
                );
                return ReactionOutcome::NoMetadata;
            }
            Err(error) => {
                tracing::error!(
                    channel = %target.channel,
                    ts = %target.ts,
                    error = %format!("{error:#}"),
                    "error getting message metadata"
                );
                return ReactionOutcome::ResolveFailed;
            }
        };

        tracing::info!(
            repo = %metadata.repository,
            pr = metadata.pr_number,
            branch = %metadata.branch,
            "found pr metadata"
        );

        if !self.allowlist.is_allowed(&metadata.repository) {
            tracing::info!(
                repo = %metadata.repository,
                "repository is not in the allowed list, ignoring reaction"
            );
            return ReactionOutcome::NotAllowed {
                repository: metadata.repository,
            };
        }

        // The deployment proceeds even when the marker cannot be published.
        let marker = StatusMutation::mark_in_progress(&target);
        match self.sink.push_status_mutation(&marker).await {
            Ok(()) => tracing::info!(
                channel = %target.channel,
                ts = %target.ts,
                "published {} reaction",
                marker.reaction
            ),
            Err(error) => tracing::error!(
                channel = %target.channel,
                ts = %target.ts,
                error = %format!("{error:#}"),
                "error publishing {} reaction",
                marker.reaction
            ),
        }

        let command = synthesize_deployment_command(&metadata, &self.base_dir, Some(target));
        if let Err(error) = self.sink.push_deployment_command(&command).await {
            tracing::error!(
                repo = %command.repo,
                branch = %command.branch,
                error = %format!("{error:#}"),
                "error publishing deployment command"
            );
            return ReactionOutcome::PublishFailed;
        }

        tracing::info!(
            repo = %command.repo,
            branch = %command.branch,
            dir = %command.dir,
            "published deployment command"
        );
        ReactionOutcome::Enqueued(command)
    }
}

#[async_trait]
impl FeedHandler for ReactionPipeline {
    async fn handle(&self, payload: &str) {
        self.handle_payload(payload).await;
    }
}
