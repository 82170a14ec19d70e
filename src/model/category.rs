use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::strip_control_chars;

/// Sentinel id for "no category". Never stored in a [`CategorySet`].
pub const UNCATEGORIZED_ID: &str = "uncategorized";

/// Display name for the uncategorized pseudo-category.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    /// Name was empty, whitespace-only, or contained no usable characters
    /// after sanitization.
    #[error("Category name cannot be empty")]
    EmptyName,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A user-defined grouping of channels.
///
/// The `id` is derived from the name at creation time via [`slugify`] and is
/// stable for the lifetime of the category — renaming changes `name` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "channelIds")]
    pub channel_ids: Vec<String>,
}

/// The category collection: insertion-ordered, unique ids, and the invariant
/// that any channel id appears in at most one category's membership set.
///
/// This is also the persisted document shape:
/// `{"categories":[{"id","name","channelIds":[...]}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    pub categories: Vec<Category>,
}

// ============================================================================
// Id Derivation
// ============================================================================

/// Derive a category id from its display name.
///
/// Lowercased; every run of non-alphanumeric characters collapses to a single
/// `-`; no leading or trailing separator. `"DIY & Home!!"` → `"diy-home"`.
pub fn slugify(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('-');
            }
            pending_sep = false;
            id.push(c);
        } else {
            pending_sep = true;
        }
    }

    id
}

/// Trim and strip control characters from a user- or agent-supplied name.
fn sanitize_name(name: &str) -> Result<String, CategoryError> {
    let cleaned = strip_control_chars(name);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

// ============================================================================
// Operations
// ============================================================================

impl CategorySet {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Look up a category by id.
    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Ensure a category with this name exists, creating it if necessary.
    ///
    /// The id is derived from the sanitized name. If a category with that id
    /// already exists it is returned as-is — its display name is *not*
    /// updated. Repeated calls with names that normalize to the same id are
    /// idempotent.
    pub fn ensure(&mut self, name: &str) -> Result<&Category, CategoryError> {
        let name = sanitize_name(name)?;
        let id = slugify(&name);
        if id.is_empty() {
            return Err(CategoryError::EmptyName);
        }

        match self.categories.iter().position(|c| c.id == id) {
            Some(pos) => Ok(&self.categories[pos]),
            None => {
                self.categories.push(Category {
                    id,
                    name,
                    channel_ids: Vec::new(),
                });
                Ok(self.categories.last().expect("just pushed"))
            }
        }
    }

    /// Find the category a channel belongs to, if any.
    ///
    /// Membership is unique, so the first match in collection order is also
    /// the only match. `None` means the channel is uncategorized.
    pub fn find_for_channel(&self, channel_id: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.channel_ids.iter().any(|id| id == channel_id))
    }

    /// Move a channel into a category, or to uncategorized.
    ///
    /// The channel is first removed from every category, then added to the
    /// target if `category_id` names an existing category and is not the
    /// [`UNCATEGORIZED_ID`] sentinel. Safe to call for a channel that was
    /// never assigned; a dangling target id leaves the channel uncategorized.
    pub fn assign(&mut self, channel_id: &str, category_id: Option<&str>) {
        for cat in &mut self.categories {
            cat.channel_ids.retain(|id| id != channel_id);
        }

        if let Some(target) = category_id {
            if target == UNCATEGORIZED_ID {
                return;
            }
            if let Some(cat) = self.categories.iter_mut().find(|c| c.id == target) {
                cat.channel_ids.push(channel_id.to_owned());
            }
        }
    }

    /// Rename a category in place. The id is stable and not recomputed.
    ///
    /// Returns `Ok(true)` if the category was found, `Ok(false)` otherwise.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<bool, CategoryError> {
        let name = sanitize_name(new_name)?;
        match self.categories.iter_mut().find(|c| c.id == id) {
            Some(cat) => {
                cat.name = name;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete a category, returning it if it existed.
    ///
    /// Member channels are not reassigned anywhere — they simply stop
    /// matching and become uncategorized.
    pub fn delete(&mut self, id: &str) -> Option<Category> {
        let pos = self.categories.iter().position(|c| c.id == id)?;
        Some(self.categories.remove(pos))
    }

    /// All channel ids that currently belong to some category.
    pub fn assigned_channel_ids(&self) -> std::collections::HashSet<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.channel_ids.iter().map(String::as_str))
            .collect()
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
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("DIY & Home!!"), "diy-home");
        assert_eq!(slugify("Woodworking"), "woodworking");
        assert_eq!(slugify("  Food & Cooking  "), "food-cooking");
        assert_eq!(slugify("Hip hop   music"), "hip-hop-music");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_ensure_creates_once() {
        let mut set = CategorySet::default();
        let id = set.ensure("Woodworking").unwrap().id.clone();
        assert_eq!(id, "woodworking");

        // Second call with a name that normalizes to the same id reuses the
        // existing category and does not touch its name.
        let cat = set.ensure("WOODWORKING!").unwrap();
        assert_eq!(cat.name, "Woodworking");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ensure_rejects_empty_names() {
        let mut set = CategorySet::default();
        assert_eq!(set.ensure("").unwrap_err(), CategoryError::EmptyName);
        assert_eq!(set.ensure("   ").unwrap_err(), CategoryError::EmptyName);
        assert_eq!(set.ensure("\x1b[31m\x1b[0m").unwrap_err(), CategoryError::EmptyName);
        assert_eq!(set.ensure("!!!").unwrap_err(), CategoryError::EmptyName);
        assert!(set.is_empty());
    }

    #[test]
    fn test_ensure_sanitizes_name() {
        let mut set = CategorySet::default();
        let cat = set.ensure("  \x1b[31mGaming\x1b[0m  ").unwrap();
        assert!(!cat.name.contains('\x1b'));
        assert!(cat.name.contains("Gaming"));
    }

    #[test]
    fn test_assign_is_exclusive() {
        let mut set = CategorySet::default();
        set.ensure("Music").unwrap();
        set.ensure("Gaming").unwrap();

        set.assign("ch1", Some("music"));
        set.assign("ch1", Some("gaming"));

        assert_eq!(set.find_for_channel("ch1").unwrap().id, "gaming");
        assert!(set.get("music").unwrap().channel_ids.is_empty());
    }

    #[test]
    fn test_assign_uncategorized_clears_membership() {
        let mut set = CategorySet::default();
        set.ensure("Music").unwrap();
        set.assign("ch1", Some("music"));

        set.assign("ch1", Some(UNCATEGORIZED_ID));
        assert!(set.find_for_channel("ch1").is_none());

        set.assign("ch1", Some("music"));
        set.assign("ch1", None);
        assert!(set.find_for_channel("ch1").is_none());
    }

    #[test]
    fn test_assign_dangling_target_leaves_unassigned() {
        let mut set = CategorySet::default();
        set.ensure("Music").unwrap();
        set.assign("ch1", Some("music"));

        // Removing happens before the target lookup, so a bad id drops the
        // channel to uncategorized rather than leaving it where it was.
        set.assign("ch1", Some("no-such-category"));
        assert!(set.find_for_channel("ch1").is_none());
    }

    #[test]
    fn test_assign_never_assigned_channel_is_noop_safe() {
        let mut set = CategorySet::default();
        set.ensure("Music").unwrap();
        set.assign("ghost", None);
        assert!(set.find_for_channel("ghost").is_none());
    }

    #[test]
    fn test_rename_keeps_id() {
        let mut set = CategorySet::default();
        set.ensure("Old Name").unwrap();
        assert!(set.rename("old-name", "Completely Different").unwrap());

        let cat = set.get("old-name").unwrap();
        assert_eq!(cat.name, "Completely Different");
        assert_eq!(cat.id, "old-name");
        assert!(!set.rename("missing", "X").unwrap());
    }

    #[test]
    fn test_delete_orphans_members() {
        let mut set = CategorySet::default();
        set.ensure("Sports").unwrap();
        set.assign("ch1", Some("sports"));
        set.assign("ch2", Some("sports"));

        let removed = set.delete("sports").unwrap();
        assert_eq!(removed.channel_ids.len(), 2);
        assert!(set.find_for_channel("ch1").is_none());
        assert!(set.find_for_channel("ch2").is_none());
        assert!(set.delete("sports").is_none());
    }

    #[test]
    fn test_document_shape_round_trip() {
        let mut set = CategorySet::default();
        set.ensure("DIY & Home").unwrap();
        set.assign("UC123", Some("diy-home"));

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "categories": [
                    {"id": "diy-home", "name": "DIY & Home", "channelIds": ["UC123"]}
                ]
            })
        );

        let back: CategorySet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_document_missing_fields_rejected() {
        let malformed = serde_json::json!({
            "categories": [{"id": "x", "channelIds": []}]
        });
        assert!(serde_json::from_value::<CategorySet>(malformed).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Slugs never carry leading/trailing separators or separator runs.
            #[test]
            fn slug_shape(name in ".*") {
                let slug = slugify(&name);
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
                prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            }

            /// Slugging is idempotent: a slug slugs to itself.
            #[test]
            fn slug_idempotent(name in ".*") {
                let once = slugify(&name);
                prop_assert_eq!(slugify(&once), once);
            }

            /// Any sequence of assigns leaves every channel in at most one category.
            #[test]
            fn membership_unique(ops in proptest::collection::vec((0..5usize, 0..4usize), 0..40)) {
                let names = ["Music", "Gaming", "Sports", "Science"];
                let mut set = CategorySet::default();
                for n in names {
                    set.ensure(n).unwrap();
                }

                for (ch, cat) in ops {
                    let channel = format!("ch{ch}");
                    let target = if cat == 0 { None } else { Some(slugify(names[cat - 1])) };
                    set.assign(&channel, target.as_deref());

                    for i in 0..5usize {
                        let id = format!("ch{i}");
                        let holders = set
                            .categories
                            .iter()
                            .filter(|c| c.channel_ids.iter().any(|c_id| *c_id == id))
                            .count();
                        prop_assert!(holders <= 1, "channel {} held by {} categories", id, holders);
                    }
                }
            }
        }
    }
}
