//! Bridge runtime: two independent feed loops over a shared outbound sink.
//!
//! The reaction loop consumes `reaction_added` payloads and enqueues
//! deployment commands; the completion loop consumes executor output and
//! flips the in-progress marker to the success marker. Deployment state is
//! never tracked in-process, it lives entirely in the reactions on the
//! Slack message.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures_util::{future::Either, Stream, StreamExt};
use tokio::sync::watch;
use vibe_deploy_core::{DeploymentCommand, MessageRef, PrMetadata, RepoAllowlist, StatusMutation};

mod completion_listener;
mod reaction_pipeline;
mod redis_bus;
mod slack_api_client;

pub use completion_listener::{CompletionListener, CompletionOutcome};
pub use reaction_pipeline::{ReactionOutcome, ReactionPipeline};
pub use redis_bus::{PayloadFeed, RedisBus, RedisListSink};
pub use slack_api_client::SlackApiClient;

#[async_trait]
/// Resolves the pull-request metadata attached to a Slack message.
pub trait MessageMetadataSource: Send + Sync {
    /// `Ok(None)` means the message exists but carries no usable metadata;
    /// transport failures and missing messages are errors.
    async fn resolve_metadata(&self, target: &MessageRef) -> Result<Option<PrMetadata>>;
}

#[async_trait]
/// Outbound queues shared by both loops.
pub trait OutboundSink: Send + Sync {
    async fn push_deployment_command(&self, command: &DeploymentCommand) -> Result<()>;
    async fn push_status_mutation(&self, mutation: &StatusMutation) -> Result<()>;
}

#[async_trait]
/// Per-payload handler driven by [`run_feed_loop`].
pub trait FeedHandler: Send + Sync {
    async fn handle(&self, payload: &str);
}

#[derive(Debug, Clone)]
/// Runtime configuration for the bridge loops.
pub struct BridgeRuntimeConfig {
    pub reaction_channel: String,
    pub command_output_channel: String,
    pub base_dir: String,
    pub allowlist: RepoAllowlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedLoopExit {
    Shutdown,
    FeedClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLoopReport {
    pub processed: usize,
    pub exit: FeedLoopExit,
}

/// Consumes `feed` in arrival order, one payload at a time, until shutdown is
/// signalled or the feed ends. A payload still being handled when shutdown
/// arrives is abandoned.
pub async fn run_feed_loop<S, H>(
    feed_name: &str,
    mut feed: S,
    handler: &H,
    mut shutdown: watch::Receiver<bool>,
) -> FeedLoopReport
where
    S: Stream<Item = String> + Unpin,
    H: FeedHandler + ?Sized,
{
    let mut processed = 0_usize;
    let exit = loop {
        if *shutdown.borrow_and_update() {
            break FeedLoopExit::Shutdown;
        }
        let payload = tokio::select! {
            biased;
            _ = shutdown.changed() => break FeedLoopExit::Shutdown,
            next = feed.next() => match next {
                Some(payload) => payload,
                None => break FeedLoopExit::FeedClosed,
            },
        };
        tracing::debug!(feed = feed_name, "received message");
        tokio::select! {
            biased;
            _ = shutdown.changed() => break FeedLoopExit::Shutdown,
            () = handler.handle(&payload) => {}
        }
        processed = processed.saturating_add(1);
    };

    match exit {
        FeedLoopExit::Shutdown => tracing::info!(feed = feed_name, "feed loop shutting down"),
        FeedLoopExit::FeedClosed => tracing::warn!(feed = feed_name, "feed closed"),
    }
    FeedLoopReport { processed, exit }
}

/// Runs both loops as separate tasks. When either loop stops, shutdown is
/// signalled to the other and both are awaited. A feed that closed on its own
/// is reported as an error.
pub async fn supervise_feed_loops(
    reaction_feed: PayloadFeed,
    completion_feed: PayloadFeed,
    pipeline: Arc<ReactionPipeline>,
    listener: Arc<CompletionListener>,
    shutdown: Arc<watch::Sender<bool>>,
) -> Result<()> {
    let reaction_shutdown = shutdown.subscribe();
    let mut reaction_task = tokio::spawn(async move {
        run_feed_loop("reactions", reaction_feed, pipeline.as_ref(), reaction_shutdown).await
    });
    let completion_shutdown = shutdown.subscribe();
    let mut completion_task = tokio::spawn(async move {
        run_feed_loop(
            "command-output",
            completion_feed,
            listener.as_ref(),
            completion_shutdown,
        )
        .await
    });

    let first = tokio::select! {
        report = &mut reaction_task => Either::Left(report),
        report = &mut completion_task => Either::Right(report),
    };
    shutdown.send_replace(true);
    let (reaction_report, completion_report) = match first {
        Either::Left(report) => (report, completion_task.await),
        Either::Right(report) => (reaction_task.await, report),
    };
    let reaction_report = reaction_report.context("reaction loop task failed")?;
    let completion_report = completion_report.context("completion loop task failed")?;

    tracing::info!(
        reactions = reaction_report.processed,
        completions = completion_report.processed,
        "bridge loops stopped"
    );
    if reaction_report.exit == FeedLoopExit::FeedClosed {
        bail!("reaction feed closed unexpectedly");
    }
    if completion_report.exit == FeedLoopExit::FeedClosed {
        bail!("command output feed closed unexpectedly");
    }
    Ok(())
}

/// Subscribes both feeds on `bus` and runs the bridge until shutdown.
pub async fn run_bridge(
    bus: &RedisBus,
    metadata_source: Arc<dyn MessageMetadataSource>,
    sink: Arc<dyn OutboundSink>,
    config: BridgeRuntimeConfig,
    shutdown: Arc<watch::Sender<bool>>,
) -> Result<()> {
    let reaction_feed = bus.subscribe(&config.reaction_channel).await?;
    let completion_feed = bus.subscribe(&config.command_output_channel).await?;

    let pipeline = Arc::new(ReactionPipeline::new(
        metadata_source,
        Arc::clone(&sink),
        config.allowlist,
        config.base_dir,
    ));
    let listener = Arc::new(CompletionListener::new(sink));

    supervise_feed_loops(reaction_feed, completion_feed, pipeline, listener, shutdown).await
}
