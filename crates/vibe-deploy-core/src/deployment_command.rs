//! Deployment commands pushed to the executor queue.

use serde::{Deserialize, Serialize};

use crate::pr_metadata::PrMetadata;
use crate::wire::null_as_default;

/// Instruction whose completion marks the deployment as live. Completion
/// notices are correlated against this exact string.
pub const GO_LIVE_INSTRUCTION: &str = "docker compose up -d";

/// Branch the working tree is returned to after a deployment.
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Type tags understood by the executor.
pub enum CommandKind {
    #[serde(rename = "vibe-deploy")]
    VibeDeploy,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VibeDeploy => "vibe-deploy",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "vibe-deploy" => Some(Self::VibeDeploy),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
/// Channel + message timestamp pair used to route completion back to Slack.
pub struct MessageRef {
    #[serde(deserialize_with = "null_as_default")]
    pub channel: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ts: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentCommand {
    pub repo: String,
    pub branch: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub dir: String,
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageRef>,
}

impl DeploymentCommand {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Builds the deployment command for a pull-request branch.
///
/// The working directory is `base_dir/repository`; the repository identifier
/// is used verbatim. The instruction order is fixed: fetch, checkout branch,
/// pull, build, stop, start (go-live), checkout default branch.
pub fn synthesize_deployment_command(
    metadata: &PrMetadata,
    base_dir: &str,
    correlation: Option<MessageRef>,
) -> DeploymentCommand {
    DeploymentCommand {
        repo: metadata.repository.clone(),
        branch: metadata.branch.clone(),
        kind: CommandKind::VibeDeploy,
        dir: format!("{base_dir}/{}", metadata.repository),
        commands: vec![
            "git fetch origin".to_string(),
            format!("git checkout {}", metadata.branch),
            "git pull".to_string(),
            "docker compose build".to_string(),
            "docker compose down".to_string(),
            GO_LIVE_INSTRUCTION.to_string(),
            format!("git checkout {DEFAULT_BRANCH}"),
        ],
        metadata: correlation,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn metadata(repository: &str, branch: &str) -> PrMetadata {
        PrMetadata {
            repository: repository.to_string(),
            branch: branch.to_string(),
            ..PrMetadata::default()
        }
    }

    #[test]
    fn functional_synthesize_builds_ordered_instructions() {
        let command = synthesize_deployment_command(
            &metadata("org/app", "feat/x"),
            "/app/repos",
            Some(MessageRef::new("C1", "100.1")),
        );
        assert_eq!(command.repo, "org/app");
        assert_eq!(command.branch, "feat/x");
        assert_eq!(command.kind, CommandKind::VibeDeploy);
        assert_eq!(command.dir, "/app/repos/org/app");
        assert_eq!(
            command.commands,
            vec![
                "git fetch origin",
                "git checkout feat/x",
                "git pull",
                "docker compose build",
                "docker compose down",
                "docker compose up -d",
                "git checkout main",
            ]
        );
        assert_eq!(command.commands[5], GO_LIVE_INSTRUCTION);
    }

    #[test]
    fn functional_command_wire_shape_matches_executor_contract() {
        let command = synthesize_deployment_command(
            &metadata("org/app", "feat/x"),
            "/app/repos",
            Some(MessageRef::new("C1", "100.1")),
        );
        let value: Value = serde_json::from_str(&command.to_json().expect("encode")).expect("json");
        assert_eq!(value["type"], json!("vibe-deploy"));
        assert_eq!(value["repo"], json!("org/app"));
        assert_eq!(value["dir"], json!("/app/repos/org/app"));
        assert_eq!(value["metadata"], json!({"channel": "C1", "ts": "100.1"}));
        assert_eq!(value["commands"].as_array().map(Vec::len), Some(7));
    }

    #[test]
    fn unit_command_without_correlation_omits_metadata() {
        let command =
            synthesize_deployment_command(&metadata("org/app", "main"), "/srv", None);
        let value: Value = serde_json::from_str(&command.to_json().expect("encode")).expect("json");
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn regression_decoded_command_preserves_instruction_order() {
        let command = synthesize_deployment_command(
            &metadata("org/app", "fix/y"),
            "/app/repos",
            Some(MessageRef::new("C9", "5.5")),
        );
        let decoded: DeploymentCommand =
            serde_json::from_str(&command.to_json().expect("encode")).expect("decode");
        assert_eq!(decoded.commands, command.commands);
        assert_eq!(decoded, command);
    }

    #[test]
    fn unit_command_kind_parse_rejects_unknown_tags() {
        assert_eq!(CommandKind::parse("vibe-deploy"), Some(CommandKind::VibeDeploy));
        assert_eq!(CommandKind::parse("Vibe-Deploy"), None);
        assert_eq!(CommandKind::parse("build"), None);
    }
}
