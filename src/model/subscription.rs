use serde::{Deserialize, Serialize};

/// A subscribed channel, merged from the subscription list and the channel
/// detail endpoint. Snapshot data: replaced on sync, never partially mutated.
///
/// `camelCase` serde form matches the cached snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    /// Playlist holding the channel's uploads; absent for channels that have
    /// never published.
    #[serde(default)]
    pub upload_playlist_id: Option<String>,
    /// Raw topic identifiers (URL-like) supplied by the platform.
    #[serde(default)]
    pub topic_ids: Vec<String>,
}
