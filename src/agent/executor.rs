use super::commands::AgentCommand;
use crate::model::{CategoryError, CategorySet};

/// Apply an ordered batch of assistant commands to the category model.
///
/// Commands apply strictly in input order; later commands observe the effects
/// of earlier ones, so `create_category` followed by `assign_channels` to the
/// new id works within one batch. Individual failures (not-found, invalid)
/// become result strings and the batch continues — there is no rollback.
///
/// Returns one human-readable result per command, in input order. Persistence
/// and view refresh are the caller's job, exactly once per batch.
pub fn execute(commands: &[AgentCommand], categories: &mut CategorySet) -> Vec<String> {
    commands
        .iter()
        .map(|command| apply(command, categories))
        .collect()
}

fn apply(command: &AgentCommand, categories: &mut CategorySet) -> String {
    match command {
        AgentCommand::CreateCategory { name } => match categories.ensure(name) {
            Ok(cat) => format!("Created category \"{}\"", cat.name),
            Err(CategoryError::EmptyName) => "Category name cannot be empty".to_string(),
        },

        AgentCommand::DeleteCategory { id } => match categories.delete(id) {
            Some(cat) => format!("Deleted category \"{}\"", cat.name),
            None => format!("Category \"{id}\" not found"),
        },

        AgentCommand::RenameCategory { id, name } => {
            let old_name = match categories.get(id) {
                Some(cat) => cat.name.clone(),
                None => return format!("Category \"{id}\" not found"),
            };
            match categories.rename(id, name) {
                Ok(true) => {
                    let new_name = categories
                        .get(id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default();
                    format!("Renamed \"{old_name}\" to \"{new_name}\"")
                }
                Ok(false) => format!("Category \"{id}\" not found"),
                Err(CategoryError::EmptyName) => "Category name cannot be empty".to_string(),
            }
        }

        AgentCommand::AssignChannels {
            channel_ids,
            category_id,
        } => {
            // Hard referential guard: the target must already exist. The
            // upstream agent is told to create first; this holds regardless.
            let Some(cat) = categories.get(category_id) else {
                return format!("Category \"{category_id}\" not found");
            };
            let cat_name = cat.name.clone();
            for channel_id in channel_ids {
                categories.assign(channel_id, Some(category_id));
            }
            format!(
                "Assigned {} channel(s) to \"{cat_name}\"",
                channel_ids.len()
            )
        }

        AgentCommand::Unknown { action } => format!("Unknown action: {action}"),

        AgentCommand::Invalid { action, reason } => {
            format!("Invalid {action} command: {reason}")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
