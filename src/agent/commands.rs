use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// One mutation command from the assistant.
///
/// A closed sum type: every recognized tag has a variant, an unrecognized tag
/// becomes [`Unknown`](AgentCommand::Unknown), and a recognized tag whose
/// fields fail validation becomes [`Invalid`](AgentCommand::Invalid). Parsing
/// never fails per-command — bad input is data, reported downstream as a
/// result string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand {
    CreateCategory { name: String },
    DeleteCategory { id: String },
    RenameCategory { id: String, name: String },
    AssignChannels { channel_ids: Vec<String>, category_id: String },
    Unknown { action: String },
    Invalid { action: String, reason: String },
}

fn actions_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```actions\s*(.*?)```").expect("valid regex"))
}

/// Extract the command batch from a raw assistant reply.
///
/// Commands live in a fenced block labeled `actions` containing a JSON array.
/// No block, or a block that does not parse as a JSON array, means "no
/// actions" — the reply's explanation still flows to the user.
pub fn extract_actions(text: &str) -> Vec<AgentCommand> {
    let Some(caps) = actions_re().captures(text) else {
        return Vec::new();
    };

    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse assistant action block");
            return Vec::new();
        }
    };

    values.iter().map(command_from_value).collect()
}

/// The reply text outside the actions fence, for display.
pub fn extract_explanation(text: &str) -> String {
    actions_re().replace(text, "").trim().to_string()
}

#[derive(Deserialize)]
struct CreatePayload {
    name: String,
}

#[derive(Deserialize)]
struct DeletePayload {
    id: String,
}

#[derive(Deserialize)]
struct RenamePayload {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignPayload {
    channel_ids: Vec<String>,
    category_id: String,
}

/// Validate the tag, then the payload. Order matters: an unknown tag is
/// `Unknown` even if the rest of the object is garbage.
fn command_from_value(value: &serde_json::Value) -> AgentCommand {
    let action = value
        .get("action")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("(missing)")
        .to_string();

    fn typed<T: serde::de::DeserializeOwned>(
        action: &str,
        value: &serde_json::Value,
        build: impl FnOnce(T) -> AgentCommand,
    ) -> AgentCommand {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(payload) => build(payload),
            Err(e) => AgentCommand::Invalid {
                action: action.to_string(),
                reason: e.to_string(),
            },
        }
    }

    match action.as_str() {
        "create_category" => typed(&action, value, |p: CreatePayload| {
            AgentCommand::CreateCategory { name: p.name }
        }),
        "delete_category" => typed(&action, value, |p: DeletePayload| {
            AgentCommand::DeleteCategory { id: p.id }
        }),
        "rename_category" => typed(&action, value, |p: RenamePayload| {
            AgentCommand::RenameCategory {
                id: p.id,
                name: p.name,
            }
        }),
        "assign_channels" => typed(&action, value, |p: AssignPayload| {
            AgentCommand::AssignChannels {
                channel_ids: p.channel_ids,
                category_id: p.category_id,
            }
        }),
        _ => AgentCommand::Unknown { action },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_commands_from_fenced_block() {
        let reply = r#"I'll set that up for you.

```actions
[
  {"action": "create_category", "name": "Woodworking"},
  {"action": "assign_channels", "channelIds": ["UC1", "UC2"], "categoryId": "woodworking"}
]
```"#;

        let commands = extract_actions(reply);
        assert_eq!(
            commands,
            vec![
                AgentCommand::CreateCategory {
                    name: "Woodworking".into()
                },
                AgentCommand::AssignChannels {
                    channel_ids: vec!["UC1".into(), "UC2".into()],
                    category_id: "woodworking".into()
                },
            ]
        );
    }

    #[test]
    fn test_explanation_excludes_the_fence() {
        let reply = "Done!\n\n```actions\n[{\"action\": \"delete_category\", \"id\": \"x\"}]\n```\n";
        assert_eq!(extract_explanation(reply), "Done!");
        // A reply with no fence passes through whole.
        assert_eq!(extract_explanation("Just chatting."), "Just chatting.");
    }

    #[test]
    fn test_no_block_means_no_actions() {
        assert!(extract_actions("No changes needed — everything looks tidy.").is_empty());
    }

    #[test]
    fn test_malformed_json_means_no_actions() {
        let reply = "```actions\n[{\"action\": \"create_category\", \n```";
        assert!(extract_actions(reply).is_empty());
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let reply = r#"```actions
[{"action": "merge_categories", "ids": ["a", "b"]}]
```"#;
        assert_eq!(
            extract_actions(reply),
            vec![AgentCommand::Unknown {
                action: "merge_categories".into()
            }]
        );
    }

    #[test]
    fn test_missing_tag_is_unknown() {
        let reply = r#"```actions
[{"name": "Orphan"}]
```"#;
        assert_eq!(
            extract_actions(reply),
            vec![AgentCommand::Unknown {
                action: "(missing)".into()
            }]
        );
    }

    #[test]
    fn test_recognized_tag_with_bad_fields_is_invalid() {
        let reply = r#"```actions
[{"action": "rename_category", "id": "music"}]
```"#;
        let commands = extract_actions(reply);
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            AgentCommand::Invalid { action, .. } => assert_eq!(action, "rename_category"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }
}
