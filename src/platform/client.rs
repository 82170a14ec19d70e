use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use super::auth::{AuthError, AuthSession};
use crate::model::Video;

/// Detail batch endpoints accept at most this many ids per call.
const MAX_IDS_PER_BATCH: usize = 50;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum FetchError {
    /// Token expired before or during the call; the operation aborts.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Network-level error (DNS, connection, TLS, body decode).
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with a non-2xx status code.
    #[error("API error: status {0}")]
    HttpStatus(u16),
}

// ============================================================================
// Fetched Record Types
// ============================================================================

/// One row of the user's subscription list.
#[derive(Debug, Clone)]
pub struct SubscriptionSummary {
    pub channel_id: String,
    pub title: String,
    pub thumbnail: String,
}

/// Per-channel detail used to enrich a [`SubscriptionSummary`].
#[derive(Debug, Clone)]
pub struct ChannelDetail {
    pub channel_id: String,
    pub upload_playlist_id: Option<String>,
    pub topic_ids: Vec<String>,
    pub title: String,
    pub thumbnail: String,
}

// ============================================================================
// Response Envelopes
// ============================================================================
//
// Everything is `#[serde(default)]`: the API omits objects freely and a
// missing field should read as empty, not fail the whole page.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
    #[serde(default)]
    medium: Option<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: String,
}

impl Thumbnails {
    fn default_url(&self) -> String {
        self.default.as_ref().map(|t| t.url.clone()).unwrap_or_default()
    }

    fn medium_or_default_url(&self) -> String {
        self.medium
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionItem {
    #[serde(default)]
    snippet: SubscriptionSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: ChannelSnippet,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    topic_details: TopicDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    #[serde(default)]
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
struct RelatedPlaylists {
    #[serde(default)]
    uploads: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicDetails {
    #[serde(default)]
    topic_categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    #[serde(default)]
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    #[serde(default)]
    resource_id: ResourceId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    published_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    content_details: VideoContentDetails,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    published_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    /// The API returns counts as decimal strings.
    #[serde(default)]
    view_count: String,
}

// ============================================================================
// Client
// ============================================================================

/// Thin client for the video platform's metadata API.
///
/// The base URL is injectable so tests can point at a mock server. Every
/// request checks token validity first and maps a 401 to [`FetchError::Auth`].
#[derive(Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    base: String,
    auth: Arc<AuthSession>,
}

impl PlatformClient {
    pub fn new(client: reqwest::Client, base: impl Into<String>, auth: Arc<AuthSession>) -> Self {
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let bearer = self.auth.bearer()?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Auth(AuthError::Expired));
        }
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Fetch the full subscription list, following pagination to the end.
    ///
    /// This is the primary fetch of a sync: failure here propagates to the
    /// caller as a load failure.
    pub async fn fetch_subscriptions(&self) -> Result<Vec<SubscriptionSummary>, FetchError> {
        let mut subs = Vec::new();
        let mut page_token = String::new();

        loop {
            let url = format!(
                "{}/subscriptions?part=snippet&mine=true&maxResults=50&order=alphabetical{}",
                self.base,
                if page_token.is_empty() {
                    String::new()
                } else {
                    format!("&pageToken={page_token}")
                }
            );
            let page: Page<SubscriptionItem> = self.get_json(&url).await?;

            for item in page.items {
                subs.push(SubscriptionSummary {
                    channel_id: item.snippet.resource_id.channel_id,
                    title: item.snippet.title,
                    thumbnail: item.snippet.thumbnails.default_url(),
                });
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = token,
                _ => break,
            }
        }

        Ok(subs)
    }

    /// Fetch channel details in batches of at most 50 ids.
    pub async fn fetch_channel_details(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelDetail>, FetchError> {
        let mut details = Vec::with_capacity(channel_ids.len());

        for chunk in channel_ids.chunks(MAX_IDS_PER_BATCH) {
            let url = format!(
                "{}/channels?part=contentDetails,snippet,topicDetails&id={}",
                self.base,
                chunk.join(",")
            );
            let page: Page<ChannelItem> = self.get_json(&url).await?;

            for item in page.items {
                details.push(ChannelDetail {
                    channel_id: item.id,
                    upload_playlist_id: item.content_details.related_playlists.uploads,
                    topic_ids: item.topic_details.topic_categories,
                    title: item.snippet.title,
                    thumbnail: item.snippet.thumbnails.default_url(),
                });
            }
        }

        Ok(details)
    }

    /// Fetch the latest uploads from one playlist.
    ///
    /// Duration and view count are filled in later by
    /// [`fetch_video_details`](Self::fetch_video_details). A transport or
    /// HTTP failure for a single playlist is logged and reads as an empty
    /// result; an expired token aborts the whole refresh.
    pub async fn fetch_latest_videos(
        &self,
        playlist_id: &str,
        count: u32,
    ) -> Result<Vec<Video>, FetchError> {
        let url = format!(
            "{}/playlistItems?part=snippet&playlistId={playlist_id}&maxResults={count}",
            self.base
        );

        let page: Page<PlaylistItem> = match self.get_json(&url).await {
            Ok(page) => page,
            Err(FetchError::Auth(e)) => return Err(FetchError::Auth(e)),
            Err(e) => {
                tracing::warn!(playlist_id = %playlist_id, error = %e, "Failed to fetch playlist");
                return Ok(Vec::new());
            }
        };

        let videos = page
            .items
            .into_iter()
            .filter(|item| !item.snippet.resource_id.video_id.is_empty())
            .map(|item| Video {
                video_id: item.snippet.resource_id.video_id,
                title: item.snippet.title,
                thumbnail: item.snippet.thumbnails.medium_or_default_url(),
                channel_title: item.snippet.channel_title,
                channel_id: item.snippet.channel_id,
                published_at: item.snippet.published_at,
                duration: String::new(),
                view_count: 0,
            })
            .collect();

        Ok(videos)
    }

    /// Fetch full video details (duration, statistics) in batches of ≤50 ids.
    pub async fn fetch_video_details(&self, video_ids: &[String]) -> Result<Vec<Video>, FetchError> {
        let mut videos = Vec::with_capacity(video_ids.len());

        for chunk in video_ids.chunks(MAX_IDS_PER_BATCH) {
            let url = format!(
                "{}/videos?part=contentDetails,snippet,statistics&id={}",
                self.base,
                chunk.join(",")
            );
            let page: Page<VideoItem> = self.get_json(&url).await?;

            for item in page.items {
                videos.push(Video {
                    video_id: item.id,
                    title: item.snippet.title,
                    thumbnail: item.snippet.thumbnails.medium_or_default_url(),
                    channel_title: item.snippet.channel_title,
                    channel_id: item.snippet.channel_id,
                    published_at: item.snippet.published_at,
                    duration: item.content_details.duration,
                    view_count: item.statistics.view_count.parse().unwrap_or(0),
                });
            }
        }

        Ok(videos)
    }
}

// ============================================================================
// Tests
// ============================================================================
