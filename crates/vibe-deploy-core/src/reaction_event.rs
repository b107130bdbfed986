//! Inbound `reaction_added` payloads and the rules that decide whether one
//! should start a deployment.

use serde::{Deserialize, Serialize};

use crate::deployment_command::MessageRef;
use crate::wire::null_as_default;

/// Only reactions on plain messages are considered.
pub const MESSAGE_ITEM_TYPE: &str = "message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Reactions the bridge reacts to or publishes.
pub enum ReactionName {
    /// Trigger reaction and, once the deployment finishes, the success marker.
    Rocket,
    /// In-progress marker.
    Gear,
}

impl ReactionName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rocket => "rocket",
            Self::Gear => "gear",
        }
    }

    /// Exact, case-sensitive lookup of a wire reaction name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "rocket" => Some(Self::Rocket),
            "gear" => Some(Self::Gear),
            _ => None,
        }
    }

    /// Reaction that starts the pipeline.
    pub const fn trigger() -> Self {
        Self::Rocket
    }

    /// Reaction left on the message while the executor is working.
    pub const fn in_progress() -> Self {
        Self::Gear
    }

    /// Reaction added once the go-live instruction has completed.
    pub const fn success() -> Self {
        Self::Rocket
    }
}

impl std::fmt::Display for ReactionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionItem {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub item_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionPayload {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reaction: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item: ReactionItem,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Envelope relayed from the Slack Events API onto the reaction feed.
pub struct ReactionEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: ReactionPayload,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authorizations: Vec<Authorization>,
}

impl ReactionEvent {
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Channel and timestamp of the message the reaction was placed on.
    pub fn target(&self) -> MessageRef {
        MessageRef::new(&self.event.item.channel, &self.event.item.ts)
    }

    /// True when the acting user is one of the bot identities this payload
    /// was authorized for, i.e. the bridge reacting to its own message.
    pub fn is_self_triggered(&self) -> bool {
        self.authorizations
            .iter()
            .any(|auth| auth.is_bot && auth.user_id == self.event.user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Why a decoded reaction event was not processed.
pub enum FilterRejection {
    NotTrigger { reaction: String },
    NotMessage { item_type: String },
    SelfTriggered { user: String },
}

impl FilterRejection {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotTrigger { .. } => "reaction_not_trigger",
            Self::NotMessage { .. } => "item_not_message",
            Self::SelfTriggered { .. } => "self_triggered",
        }
    }
}

/// Accepts an event only when it carries the trigger reaction, targets a
/// message, and was not placed by one of the bridge's own bot identities.
pub fn filter_reaction_event(event: &ReactionEvent) -> Result<MessageRef, FilterRejection> {
    if ReactionName::parse(&event.event.reaction) != Some(ReactionName::trigger()) {
        return Err(FilterRejection::NotTrigger {
            reaction: event.event.reaction.clone(),
        });
    }
    if event.event.item.item_type != MESSAGE_ITEM_TYPE {
        return Err(FilterRejection::NotMessage {
            item_type: event.event.item.item_type.clone(),
        });
    }
    if event.is_self_triggered() {
        return Err(FilterRejection::SelfTriggered {
            user: event.event.user.clone(),
        });
    }
    Ok(event.target())
}
