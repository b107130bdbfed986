use std::{collections::VecDeque, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;
use vibe_deploy_core::{
    DeploymentCommand, MessageRef, PrMetadata, RepoAllowlist, StatusMutation, GO_LIVE_INSTRUCTION,
};
use vibe_deploy_runtime::{
    CompletionListener, CompletionOutcome, MessageMetadataSource, OutboundSink, ReactionOutcome,
    ReactionPipeline,
};

/// Stands in for the Redis lists: keeps both queues as wire JSON.
#[derive(Default)]
struct WireQueues {
    commands: AsyncMutex<VecDeque<String>>,
    reactions: AsyncMutex<Vec<Value>>,
}

#[async_trait]
impl OutboundSink for WireQueues {
    async fn push_deployment_command(&self, command: &DeploymentCommand) -> Result<()> {
        self.commands.lock().await.push_back(command.to_json()?);
        Ok(())
    }

    async fn push_status_mutation(&self, mutation: &StatusMutation) -> Result<()> {
        let value = serde_json::from_str(&mutation.to_json()?)?;
        self.reactions.lock().await.push(value);
        Ok(())
    }
}

struct PrMessages;

#[async_trait]
impl MessageMetadataSource for PrMessages {
    async fn resolve_metadata(&self, target: &MessageRef) -> Result<Option<PrMetadata>> {
        if target.channel != "C1" {
            return Ok(None);
        }
        Ok(Some(PrMetadata {
            pr_number: 3,
            repository: "org/app".to_string(),
            pr_url: "https://github.com/org/app/pull/3".to_string(),
            author: "octocat".to_string(),
            branch: "feat/x".to_string(),
            event_action: "opened".to_string(),
        }))
    }
}

/// Plays the executor: reports each instruction of a dequeued command on the
/// output feed, echoing the command's correlation block.
fn executor_output(command_json: &str) -> Vec<String> {
    let command: Value = serde_json::from_str(command_json).expect("command json");
    command["commands"]
        .as_array()
        .expect("commands array")
        .iter()
        .map(|instruction| {
            json!({
                "metadata": command["metadata"],
                "type": command["type"],
                "command": instruction,
                "output": "ok",
            })
            .to_string()
        })
        .collect()
}

#[tokio::test]
async fn integration_rocket_reaction_round_trips_to_success_marker() {
    let queues = Arc::new(WireQueues::default());
    let pipeline = ReactionPipeline::new(
        Arc::new(PrMessages),
        queues.clone(),
        RepoAllowlist::allow_all(),
        "/app/repos",
    );
    let listener = CompletionListener::new(queues.clone());

    let reaction = json!({
        "event": {
            "type": "reaction_added",
            "user": "U1",
            "reaction": "rocket",
            "item": {"type": "message", "channel": "C1", "ts": "100.1"}
        },
        "authorizations": [{"user_id": "UBOT", "is_bot": true}]
    })
    .to_string();
    assert!(matches!(
        pipeline.handle_payload(&reaction).await,
        ReactionOutcome::Enqueued(_)
    ));

    let command_json = queues
        .commands
        .lock()
        .await
        .pop_front()
        .expect("command enqueued");
    let decoded: DeploymentCommand = serde_json::from_str(&command_json).expect("decode");
    assert_eq!(decoded.dir, "/app/repos/org/app");
    assert_eq!(decoded.commands.len(), 7);

    let mut reflected = 0;
    for output in executor_output(&command_json) {
        let outcome = listener.handle_payload(&output).await;
        if let CompletionOutcome::Reflected { target, failed } = outcome {
            assert_eq!(target, MessageRef::new("C1", "100.1"));
            assert_eq!(failed, 0);
            reflected += 1;
        }
    }
    assert_eq!(reflected, 1, "only the {GO_LIVE_INSTRUCTION} notice reflects");

    let reactions = queues.reactions.lock().await.clone();
    assert_eq!(
        reactions,
        vec![
            json!({"reaction": "gear", "channel": "C1", "ts": "100.1", "remove": false}),
            json!({"reaction": "gear", "channel": "C1", "ts": "100.1", "remove": true}),
            json!({"reaction": "rocket", "channel": "C1", "ts": "100.1", "remove": false}),
        ]
    );
}

#[tokio::test]
async fn integration_bridge_success_reaction_does_not_retrigger_deploy() {
    let queues = Arc::new(WireQueues::default());
    let pipeline = ReactionPipeline::new(
        Arc::new(PrMessages),
        queues.clone(),
        RepoAllowlist::from_repos(["org/app"]),
        "/app/repos",
    );

    // The relay posts the success rocket as the bot user; Slack echoes it back.
    let echoed = json!({
        "event": {
            "type": "reaction_added",
            "user": "UBOT",
            "reaction": "rocket",
            "item": {"type": "message", "channel": "C1", "ts": "100.1"}
        },
        "authorizations": [{"user_id": "UBOT", "is_bot": true}]
    })
    .to_string();
    assert!(matches!(
        pipeline.handle_payload(&echoed).await,
        ReactionOutcome::Filtered(_)
    ));
    assert!(queues.commands.lock().await.is_empty());
    assert!(queues.reactions.lock().await.is_empty());
}
