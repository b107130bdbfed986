//! Domain types and pure rules for the reaction-driven deploy bridge.
//!
//! Covers the wire records exchanged over the bus (reaction events, deployment
//! commands, reaction mutations, completion notices), the event filter, the
//! repository allowlist and the command synthesizer. Nothing here performs
//! network I/O.

pub mod allowlist;
pub mod completion_notice;
pub mod deployment_command;
pub mod pr_metadata;
pub mod reaction_event;
pub mod status_mutation;
mod wire;

pub use allowlist::{AllowlistError, RepoAllowlist};
pub use completion_notice::{match_completion_notice, CompletionNotice, CompletionVerdict};
pub use deployment_command::{
    synthesize_deployment_command, CommandKind, DeploymentCommand, MessageRef,
    DEFAULT_BRANCH, GO_LIVE_INSTRUCTION,
};
pub use pr_metadata::PrMetadata;
pub use reaction_event::{
    filter_reaction_event, FilterRejection, ReactionEvent, ReactionName, MESSAGE_ITEM_TYPE,
};
pub use status_mutation::StatusMutation;
