//! Pull-request metadata embedded in a Slack message's `metadata.event_payload`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pr_number: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repository: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pr_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_action: String,
}

impl PrMetadata {
    /// Extracts metadata from a message's structured payload.
    ///
    /// Returns `None` when the payload is absent, empty, not shaped like PR
    /// metadata, or lacks a repository or branch. Foreign metadata posted by
    /// other integrations lands here and is simply ignored.
    pub fn from_event_payload(payload: Option<&Value>) -> Option<Self> {
        let object = payload?.as_object()?;
        if object.is_empty() {
            return None;
        }
        let metadata = match serde_json::from_value::<Self>(Value::Object(object.clone())) {
            Ok(metadata) => metadata,
            Err(error) => {
                tracing::debug!(%error, "message metadata is not pull-request metadata");
                return None;
            }
        };
        metadata.is_deployable().then_some(metadata)
    }

    pub fn is_deployable(&self) -> bool {
        !self.repository.is_empty() && !self.branch.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn functional_from_event_payload_reads_all_fields() {
        let payload = json!({
            "pr_number": 42,
            "repository": "org/app",
            "pr_url": "https://github.com/org/app/pull/42",
            "author": "octocat",
            "branch": "feat/x",
            "event_action": "opened",
        });
        let metadata = PrMetadata::from_event_payload(Some(&payload)).expect("metadata");
        assert_eq!(metadata.pr_number, 42);
        assert_eq!(metadata.repository, "org/app");
        assert_eq!(metadata.branch, "feat/x");
        assert_eq!(metadata.author, "octocat");
        assert_eq!(metadata.event_action, "opened");
    }

    #[test]
    fn unit_only_repository_and_branch_are_required() {
        let payload = json!({"repository": "org/app", "branch": "main"});
        let metadata = PrMetadata::from_event_payload(Some(&payload)).expect("metadata");
        assert_eq!(metadata.pr_number, 0);
        assert!(metadata.pr_url.is_empty());
    }

    #[test]
    fn unit_absent_or_empty_payload_is_no_metadata() {
        assert_eq!(PrMetadata::from_event_payload(None), None);
        assert_eq!(PrMetadata::from_event_payload(Some(&json!({}))), None);
        assert_eq!(PrMetadata::from_event_payload(Some(&Value::Null)), None);
    }

    #[test]
    fn regression_missing_repository_or_branch_is_no_metadata() {
        let no_branch = json!({"repository": "org/app", "branch": ""});
        let no_repo = json!({"branch": "feat/x"});
        assert_eq!(PrMetadata::from_event_payload(Some(&no_branch)), None);
        assert_eq!(PrMetadata::from_event_payload(Some(&no_repo)), None);
    }

    #[test]
    fn regression_foreign_metadata_shape_is_ignored() {
        let payload = json!({"repository": ["not", "a", "string"], "branch": "feat/x"});
        assert_eq!(PrMetadata::from_event_payload(Some(&payload)), None);
        let unrelated = json!({"ticket": "OPS-1"});
        assert_eq!(PrMetadata::from_event_payload(Some(&unrelated)), None);
    }

    #[test]
    fn regression_null_optional_fields_keep_metadata() {
        let payload = json!({
            "pr_number": null,
            "repository": "org/app",
            "pr_url": null,
            "author": null,
            "branch": "feat/x",
            "event_action": null,
        });
        let metadata = PrMetadata::from_event_payload(Some(&payload)).expect("metadata");
        assert_eq!(metadata.pr_number, 0);
        assert_eq!(metadata.repository, "org/app");
        assert_eq!(metadata.branch, "feat/x");
        assert!(metadata.author.is_empty());
    }

    #[test]
    fn regression_null_repository_is_no_metadata() {
        let payload = json!({"repository": null, "branch": "feat/x"});
        assert_eq!(PrMetadata::from_event_payload(Some(&payload)), None);
    }
}
