//! Domain types: the category model and the replaceable sync snapshots.
//!
//! [`CategorySet`] is the single source of truth for categorization and the
//! only mutable structure here. [`Subscription`] and [`Video`] records are
//! owned by the sync pipeline and replaced wholesale on each sync — they are
//! never patched in place.

mod category;
mod subscription;
mod video;

pub use category::{
    slugify, Category, CategoryError, CategorySet, UNCATEGORIZED_ID, UNCATEGORIZED_NAME,
};
pub use subscription::Subscription;
pub use video::{format_duration, format_view_count, parse_iso8601_duration, Video};
