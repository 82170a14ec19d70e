//! Sync pipelines: subscription snapshots and the video feed.
//!
//! Snapshots are replaced wholesale — a sync either produces a complete new
//! snapshot or leaves the old one in place. The app invokes the subscription
//! sync on cache miss or manual re-sync; the video feed is cache-first here.
//! The primary subscription fetch propagates failure to the caller (the user
//! sees a load failure); individual playlist fetches degrade to empty with a
//! warning.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};

use crate::model::{Subscription, Video};
use crate::platform::{FetchError, PlatformClient};
use crate::storage::{CacheStore, SUBSCRIPTIONS_KEY, VIDEOS_KEY};

/// Upload playlists fetched simultaneously during a video refresh.
const MAX_CONCURRENT_PLAYLIST_FETCHES: usize = 10;

/// Pull the subscription list and channel details, merge them, and cache the
/// snapshot. This is the primary fetch of a load: failure propagates.
pub async fn sync_subscriptions(
    client: &PlatformClient,
    cache: &CacheStore,
    ttl: chrono::Duration,
) -> Result<Vec<Subscription>, FetchError> {
    let summaries = client.fetch_subscriptions().await?;
    let channel_ids: Vec<String> = summaries.iter().map(|s| s.channel_id.clone()).collect();
    let details = client.fetch_channel_details(&channel_ids).await?;

    let by_id: HashMap<&str, _> = details
        .iter()
        .map(|d| (d.channel_id.as_str(), d))
        .collect();

    let merged: Vec<Subscription> = summaries
        .into_iter()
        .map(|summary| {
            let detail = by_id.get(summary.channel_id.as_str());
            Subscription {
                upload_playlist_id: detail.and_then(|d| d.upload_playlist_id.clone()),
                topic_ids: detail.map(|d| d.topic_ids.clone()).unwrap_or_default(),
                channel_id: summary.channel_id,
                title: summary.title,
                thumbnail: summary.thumbnail,
            }
        })
        .collect();

    tracing::info!(count = merged.len(), "Synced subscriptions");
    if let Err(e) = cache.set_json(SUBSCRIPTIONS_KEY, &merged, Some(ttl)).await {
        tracing::warn!(error = %e, "Subscription cache write failed");
    }

    Ok(merged)
}

/// Load the video feed from cache, refreshing from the API on a miss.
pub async fn load_videos(
    client: &PlatformClient,
    cache: &CacheStore,
    subscriptions: &[Subscription],
    per_channel: u32,
    ttl: chrono::Duration,
) -> Result<Vec<Video>, FetchError> {
    match cache.get_json::<Vec<Video>>(VIDEOS_KEY).await {
        Ok(Some(videos)) => {
            tracing::debug!(count = videos.len(), "Using cached videos");
            return Ok(videos);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Video cache read failed"),
    }
    refresh_videos(client, cache, subscriptions, per_channel, ttl).await
}

/// Rebuild the video feed: fan out over upload playlists, fetch details for
/// the distinct video ids, drop short-form clips, sort newest first, cache.
pub async fn refresh_videos(
    client: &PlatformClient,
    cache: &CacheStore,
    subscriptions: &[Subscription],
    per_channel: u32,
    ttl: chrono::Duration,
) -> Result<Vec<Video>, FetchError> {
    let playlist_ids: Vec<&str> = subscriptions
        .iter()
        .filter_map(|s| s.upload_playlist_id.as_deref())
        .collect();

    let batches: Vec<Result<Vec<Video>, FetchError>> = stream::iter(playlist_ids)
        .map(|playlist_id| client.fetch_latest_videos(playlist_id, per_channel))
        .buffer_unordered(MAX_CONCURRENT_PLAYLIST_FETCHES)
        .collect()
        .await;

    let mut items = Vec::new();
    for batch in batches {
        // Per-playlist transport failures already collapsed to empty inside
        // the client; what propagates here is token expiry.
        items.extend(batch?);
    }

    let mut seen = HashSet::new();
    let video_ids: Vec<String> = items
        .iter()
        .filter(|v| seen.insert(v.video_id.clone()))
        .map(|v| v.video_id.clone())
        .collect();

    if video_ids.is_empty() {
        if let Err(e) = cache
            .set_json(VIDEOS_KEY, &Vec::<Video>::new(), Some(ttl))
            .await
        {
            tracing::warn!(error = %e, "Video cache write failed");
        }
        return Ok(Vec::new());
    }

    let mut videos = client.fetch_video_details(&video_ids).await?;
    let fetched = videos.len();
    videos.retain(|v| !v.is_short());
    tracing::debug!(
        fetched = fetched,
        shorts_filtered = fetched - videos.len(),
        "Filtered short-form clips"
    );

    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    if let Err(e) = cache.set_json(VIDEOS_KEY, &videos, Some(ttl)).await {
        tracing::warn!(error = %e, "Video cache write failed");
    }

    Ok(videos)
}

// ============================================================================
// Tests
// ============================================================================
