//! Reaction add/remove requests consumed by the Slack relay.

use serde::{Deserialize, Serialize};

use crate::deployment_command::MessageRef;
use crate::reaction_event::ReactionName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMutation {
    pub reaction: ReactionName,
    pub channel: String,
    pub ts: String,
    #[serde(default)]
    pub remove: bool,
}

impl StatusMutation {
    pub fn add(reaction: ReactionName, target: &MessageRef) -> Self {
        Self {
            reaction,
            channel: target.channel.clone(),
            ts: target.ts.clone(),
            remove: false,
        }
    }

    pub fn remove(reaction: ReactionName, target: &MessageRef) -> Self {
        Self {
            remove: true,
            ..Self::add(reaction, target)
        }
    }

    /// Marks a message as having a deployment underway.
    pub fn mark_in_progress(target: &MessageRef) -> Self {
        Self::add(ReactionName::in_progress(), target)
    }

    /// The two mutations, in order, that close out a deployment.
    pub fn completion_pair(target: &MessageRef) -> [Self; 2] {
        [
            Self::remove(ReactionName::in_progress(), target),
            Self::add(ReactionName::success(), target),
        ]
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
