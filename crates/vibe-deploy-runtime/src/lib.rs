//! Bus and Slack plumbing for the reaction-driven deploy bridge.
//!
//! Hosts the reaction pipeline, the completion listener, the Slack Web API
//! metadata client and the Redis feeds/sinks those loops run on.

pub mod bridge_runtime;

pub use bridge_runtime::{
    run_bridge, run_feed_loop, supervise_feed_loops, BridgeRuntimeConfig, CompletionListener,
    CompletionOutcome, FeedHandler, FeedLoopExit, FeedLoopReport, MessageMetadataSource,
    OutboundSink, PayloadFeed, ReactionOutcome, ReactionPipeline, RedisBus, RedisListSink,
    SlackApiClient,
};
