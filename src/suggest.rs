//! Topic suggestion engine: maps noisy platform topic identifiers to coarse,
//! human-friendly category names.
//!
//! Topic identifiers are URL-like; only the final path segment carries
//! meaning. A static table folds the ~90 known segments into ~25 category
//! names. The scan is order-sensitive over the input sequence and the first
//! table hit wins; with no hit the result is the `"Uncategorized"` sentinel,
//! which is never materialized as a real category.

use crate::model::{slugify, CategorySet, Subscription, UNCATEGORIZED_NAME};

/// Map one topic path segment to a category name.
fn topic_category(segment: &str) -> Option<&'static str> {
    let name = match segment {
        "Technology" | "Computer_programming" | "Software" | "Computer_science"
        | "Programming_language" | "Artificial_intelligence" | "Machine_learning" => "Software Dev",
        "Politics" | "Society" | "Government" | "Activism" | "Journalism" => "Politics",
        "Woodworking" => "Woodworking",
        "Do_it_yourself" | "Home_improvement" => "DIY & Home",
        "Entertainment" | "Film" | "Television_program" | "Humour" | "Comedy"
        | "Performing_arts" => "Entertainment",
        "Music" | "Hip_hop_music" | "Electronic_music" | "Rock_music" | "Classical_music"
        | "Pop_music" | "Jazz" | "Soul_music" | "Country_music" | "Rhythm_and_blues"
        | "Independent_music" | "Music_of_Asia" | "Music_of_Latin_America" => "Music",
        "Video_game" | "Video_game_culture" | "Action_game" | "Role-playing_video_game" => "Gaming",
        "Sport" | "Association_football" | "Basketball" | "Baseball" | "American_football"
        | "Ice_hockey" | "Tennis" | "Golf" | "Cricket" | "Boxing" | "Mixed_martial_arts"
        | "Motorsport" | "Wrestling" => "Sports",
        "Physical_fitness" | "Health" | "Nutrition" => "Health & Fitness",
        "Cooking" | "Recipe" | "Food" | "Cuisine" => "Food & Cooking",
        "Tourism" => "Travel",
        "Vehicle" | "Automobile" | "Motorcycle" => "Automotive",
        "Knowledge" | "Education" => "Education",
        "Science" | "Physics" | "Mathematics" | "Biology" | "Chemistry" => "Science",
        "Nature" => "Science & Nature",
        "Pet" | "Animal" => "Pets & Animals",
        "Fashion" | "Beauty" | "Lifestyle_(sociology)" => "Lifestyle",
        "Business" | "Finance" | "Entrepreneurship" => "Business & Finance",
        "Military" | "History" => "History & Military",
        "Religion" | "Philosophy" => "Religion & Philosophy",
        _ => return None,
    };
    Some(name)
}

/// Suggest a category name for a channel from its topic identifiers.
///
/// Scans in input order; the first segment with a table entry wins.
pub fn suggest_category<S: AsRef<str>>(topic_ids: &[S]) -> &'static str {
    for topic in topic_ids {
        let segment = topic.as_ref().rsplit('/').next().unwrap_or_default();
        if let Some(name) = topic_category(segment) {
            return name;
        }
    }
    UNCATEGORIZED_NAME
}

/// Batch auto-assignment over a fresh subscription snapshot.
///
/// Ensures a category for every distinct non-sentinel suggestion, then
/// assigns each channel to its suggested category, skipping channels already
/// in place. Returns the number of channels assigned.
///
/// The caller runs this exactly once: the first time a sync produces
/// subscriptions while the category set is empty.
pub fn auto_assign(subs: &[Subscription], categories: &mut CategorySet) -> usize {
    let suggestions: Vec<(&str, &'static str)> = subs
        .iter()
        .map(|s| (s.channel_id.as_str(), suggest_category(&s.topic_ids)))
        .collect();

    for (_, name) in &suggestions {
        if *name != UNCATEGORIZED_NAME {
            // Static table names are never empty; ensure cannot fail here.
            let _ = categories.ensure(name);
        }
    }

    let mut assigned = 0;
    for (channel_id, name) in suggestions {
        if name == UNCATEGORIZED_NAME {
            continue;
        }
        let id = slugify(name);
        let already_member = categories
            .get(&id)
            .is_some_and(|c| c.channel_ids.iter().any(|m| m == channel_id));
        if already_member {
            continue;
        }
        categories.assign(channel_id, Some(&id));
        assigned += 1;
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(channel_id: &str, topics: &[&str]) -> Subscription {
        Subscription {
            channel_id: channel_id.into(),
            title: channel_id.into(),
            thumbnail: String::new(),
            upload_playlist_id: None,
            topic_ids: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_topics_is_uncategorized() {
        let empty: [&str; 0] = [];
        assert_eq!(suggest_category(&empty), "Uncategorized");
    }

    #[test]
    fn test_unknown_topic_is_uncategorized() {
        assert_eq!(
            suggest_category(&["https://x/y/UnknownTopic"]),
            "Uncategorized"
        );
    }

    #[test]
    fn test_first_match_wins_in_input_order() {
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
    fn test_unknown_segments_are_skipped() {
        assert_eq!(
            suggest_category(&["https://x/y/Mystery", "https://x/y/Woodworking"]),
            "Woodworking"
        );
    }

    #[test]
    fn test_only_final_segment_matters() {
        // "Cooking" appears mid-path; the final segment is unknown.
        assert_eq!(
            suggest_category(&["https://x/Cooking/Obscure"]),
            "Uncategorized"
        );
    }

    #[test]
    fn test_auto_assign_creates_distinct_categories() {
        let subs = vec![
            sub("ch-rust", &["https://x/y/Computer_programming"]),
            sub("ch-ml", &["https://x/y/Machine_learning"]),
            sub("ch-cook", &["https://x/y/Recipe"]),
            sub("ch-none", &["https://x/y/UnknownTopic"]),
        ];
        let mut set = CategorySet::default();
        let assigned = auto_assign(&subs, &mut set);

        assert_eq!(assigned, 3);
        // Both programming-adjacent channels fold into one category.
        assert_eq!(set.len(), 2);
        assert_eq!(set.find_for_channel("ch-rust").unwrap().id, "software-dev");
        assert_eq!(set.find_for_channel("ch-ml").unwrap().id, "software-dev");
        assert_eq!(set.find_for_channel("ch-cook").unwrap().id, "food-cooking");
        assert!(set.find_for_channel("ch-none").is_none());
    }

    #[test]
    fn test_auto_assign_skips_existing_membership() {
        let subs = vec![sub("ch1", &["https://x/y/Music"])];
        let mut set = CategorySet::default();
        set.ensure("Music").unwrap();
        set.assign("ch1", Some("music"));

        let assigned = auto_assign(&subs, &mut set);
        assert_eq!(assigned, 0);
        assert_eq!(set.get("music").unwrap().channel_ids, vec!["ch1"]);
    }
}
