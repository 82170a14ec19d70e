//! Integration tests for the category lifecycle: suggestion seeding, manual
//! edits, and assistant command batches composing against one model.
//!
//! These tests exercise the pure core end-to-end — no I/O — verifying that
//! the membership invariant survives arbitrary interleavings of operations.

use subdeck::agent::{execute, extract_actions, extract_explanation, AgentCommand};
use subdeck::model::{CategorySet, Subscription};
use subdeck::suggest::{auto_assign, suggest_category};

fn sub(channel_id: &str, title: &str, topics: &[&str]) -> Subscription {
    Subscription {
        channel_id: channel_id.into(),
        title: title.into(),
        thumbnail: String::new(),
        upload_playlist_id: None,
        topic_ids: topics.iter().map(|t| t.to_string()).collect(),
    }
}

/// Every channel appears in at most one category, full stop.
fn assert_membership_unique(set: &CategorySet) {
    let mut seen = std::collections::HashSet::new();
    for cat in &set.categories {
        for channel in &cat.channel_ids {
            assert!(
                seen.insert(channel.clone()),
                "channel {channel} appears in more than one category"
            );
        }
    }
}

#[test]
fn test_seed_then_reorganize_via_agent() {
    let subs = vec![
        sub("UC-synth", "Synth Tips", &["https://x/y/Electronic_music"]),
        sub("UC-saw", "Saw Dust", &["https://x/y/Woodworking"]),
        sub("UC-cook", "Pan Fried", &["https://x/y/Cooking"]),
        sub("UC-misc", "Misc Vlogs", &["https://x/y/UnknownTopic"]),
    ];

    // Heuristic seeding over a fresh model.
    let mut categories = CategorySet::default();
    auto_assign(&subs, &mut categories);
    assert_membership_unique(&categories);
    assert_eq!(categories.find_for_channel("UC-synth").unwrap().id, "music");
    assert!(categories.find_for_channel("UC-misc").is_none());

    // The assistant reshuffles: new category, move a channel, drop one.
    let reply = r#"Making a workshop category and cleaning up.

```actions
[
  {"action": "create_category", "name": "Workshop"},
  {"action": "assign_channels", "channelIds": ["UC-saw", "UC-misc"], "categoryId": "workshop"},
  {"action": "delete_category", "id": "food-cooking"}
]
```"#;

    let commands = extract_actions(reply);
    let results = execute(&commands, &mut categories);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0], "Created category \"Workshop\"");
    assert_eq!(results[1], "Assigned 2 channel(s) to \"Workshop\"");
    assert_eq!(results[2], "Deleted category \"Food & Cooking\"");

    assert_membership_unique(&categories);
    assert_eq!(categories.find_for_channel("UC-saw").unwrap().id, "workshop");
    assert_eq!(categories.find_for_channel("UC-misc").unwrap().id, "workshop");
    // Deleting the cooking category orphaned its member.
    assert!(categories.find_for_channel("UC-cook").is_none());

    assert_eq!(
        extract_explanation(reply),
        "Making a workshop category and cleaning up."
    );
}

#[test]
fn test_batch_reports_in_order_and_later_commands_see_earlier_effects() {
    let mut categories = CategorySet::default();
    let commands = vec![
        AgentCommand::CreateCategory { name: "X".into() },
        AgentCommand::AssignChannels {
            channel_ids: vec!["c1".into()],
            category_id: "x".into(),
        },
    ];

    let results = execute(&commands, &mut categories);

    assert_eq!(
        results,
        vec![
            "Created category \"X\"".to_string(),
            "Assigned 1 channel(s) to \"X\"".to_string(),
        ]
    );
    assert_eq!(categories.find_for_channel("c1").unwrap().id, "x");
}

#[test]
fn test_referential_guard_survives_mixed_batch() {
    let mut categories = CategorySet::default();
    categories.ensure("Music").unwrap();
    categories.assign("c1", Some("music"));

    let commands = vec![
        AgentCommand::AssignChannels {
            channel_ids: vec!["c1".into()],
            category_id: "nonexistent".into(),
        },
        AgentCommand::RenameCategory {
            id: "music".into(),
            name: "Tunes".into(),
        },
    ];
    let results = execute(&commands, &mut categories);

    assert_eq!(results[0], "Category \"nonexistent\" not found");
    assert_eq!(results[1], "Renamed \"Music\" to \"Tunes\"");
    // The guarded assignment really did nothing.
    assert_eq!(categories.find_for_channel("c1").unwrap().id, "music");
    assert_membership_unique(&categories);
}

#[test]
fn test_ensure_identity_across_agent_and_manual_paths() {
    let mut categories = CategorySet::default();
    categories.ensure("Woodworking").unwrap();

    // The agent "creating" the same category must reuse it.
    execute(
        &[AgentCommand::CreateCategory {
            name: "Woodworking".into(),
        }],
        &mut categories,
    );
    assert_eq!(categories.len(), 1);

    // And id derivation is shared: punctuation noise folds to the same id.
    execute(
        &[AgentCommand::CreateCategory {
            name: "  Woodworking!!".into(),
        }],
        &mut categories,
    );
    assert_eq!(categories.len(), 1);
}

#[test]
fn test_delete_orphans_are_re_suggestible_targets() {
    let subs = vec![sub("UC1", "Gamer", &["https://x/y/Video_game"])];
    let mut categories = CategorySet::default();
    auto_assign(&subs, &mut categories);
    assert_eq!(categories.find_for_channel("UC1").unwrap().id, "gaming");

    categories.delete("gaming");
    assert!(categories.find_for_channel("UC1").is_none());

    // Nothing re-triggers automatically; re-seeding is an explicit call and
    // only applies because the set is empty again.
    auto_assign(&subs, &mut categories);
    assert_eq!(categories.find_for_channel("UC1").unwrap().id, "gaming");
}

#[test]
fn test_suggestion_precedence_matches_channel_topic_order() {
    // The same segments in different orders land in different categories.
    assert_eq!(
        suggest_category(&["https://x/y/Cooking", "https://x/y/Politics"]),
        "Food & Cooking"
    );
    assert_eq!(
        suggest_category(&["https://x/y/Politics", "https://x/y/Cooking"]),
        "Politics"
    );
}

#[test]
fn test_uniqueness_under_long_mixed_sequence() {
    let mut categories = CategorySet::default();
    for name in ["Music", "Gaming", "Sports"] {
        categories.ensure(name).unwrap();
    }

    let channels = ["c1", "c2", "c3", "c4"];
    let targets = [Some("music"), Some("gaming"), Some("sports"), None, Some("ghost")];

    // Deterministic pseudo-random walk over (channel, target) pairs.
    for step in 0..200usize {
        let channel = channels[step % channels.len()];
        let target = targets[(step * 7 + step / 3) % targets.len()];
        categories.assign(channel, target);
        assert_membership_unique(&categories);
    }
}
