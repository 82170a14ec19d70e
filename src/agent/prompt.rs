use crate::model::{CategorySet, Subscription};

/// Build the assistant system prompt from the live category and subscription
/// state, so the model sees real ids and current assignments.
pub fn build_system_prompt(categories: &CategorySet, subscriptions: &[Subscription]) -> String {
    let cat_list = if categories.is_empty() {
        "(none)".to_string()
    } else {
        categories
            .categories
            .iter()
            .map(|c| format!("- \"{}\" (id: {}, {} channels)", c.name, c.id, c.channel_ids.len()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sub_list = if subscriptions.is_empty() {
        "(none)".to_string()
    } else {
        subscriptions
            .iter()
            .map(|s| {
                let label = match categories.find_for_channel(&s.channel_id) {
                    Some(cat) => format!("{} ({})", cat.name, cat.id),
                    None => "Uncategorized".to_string(),
                };
                format!("- {} (id: {}) → {}", s.title, s.channel_id, label)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are an AI assistant that manages video subscription categories for the subdeck app.

Current categories:
{cat_list}

Current subscriptions and their category assignments:
{sub_list}

When the user asks you to manage categories, respond with:
1. A brief human-readable explanation of what you're doing.
2. A JSON action block fenced with ```actions ... ``` containing an array of operations.

Available actions:
- {{"action": "create_category", "name": "Category Name"}}
- {{"action": "delete_category", "id": "category-id"}}
- {{"action": "rename_category", "id": "category-id", "name": "New Name"}}
- {{"action": "assign_channels", "channelIds": ["UC..."], "categoryId": "category-id"}}

Rules:
- Category IDs are lowercase with hyphens (e.g. "woodworking", "diy-home").
- When assigning channels, use the exact channel IDs from the subscription list.
- When moving channels to a new category, create it first if it doesn't exist.
- You can include multiple actions in one block. They execute in order.
- If the user asks a question that doesn't require changes, just answer without an action block.
- Be concise in your explanations."#
    )
}
