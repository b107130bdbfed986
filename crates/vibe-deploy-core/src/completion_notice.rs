//! Executor output notices and the rule that recognizes a finished deployment.

use serde::{Deserialize, Serialize};

use crate::deployment_command::{CommandKind, MessageRef, GO_LIVE_INSTRUCTION};
use crate::wire::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    #[serde(default)]
    pub metadata: Option<MessageRef>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub command: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
}

impl CompletionNotice {
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionVerdict {
    /// The go-live instruction of a deployment finished for this message.
    Completed(MessageRef),
    OtherKind { kind: String },
    OtherInstruction { command: String },
    /// Matching notice without a usable channel/ts pair.
    Unroutable,
}

pub fn match_completion_notice(notice: &CompletionNotice) -> CompletionVerdict {
    if CommandKind::parse(&notice.kind) != Some(CommandKind::VibeDeploy) {
        return CompletionVerdict::OtherKind {
            kind: notice.kind.clone(),
        };
    }
    if notice.command != GO_LIVE_INSTRUCTION {
        return CompletionVerdict::OtherInstruction {
            command: notice.command.clone(),
        };
    }
    match &notice.metadata {
        Some(target) if !target.channel.is_empty() && !target.ts.is_empty() => {
            CompletionVerdict::Completed(target.clone())
        }
        _ => CompletionVerdict::Unroutable,
    }
}
