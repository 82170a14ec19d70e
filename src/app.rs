use std::collections::HashSet;
use tokio::sync::mpsc;

use crate::agent::{
    build_system_prompt, execute, extract_actions, extract_explanation, AgentClient, AgentError,
    ChatMessage,
};
use crate::config::Config;
use crate::model::{CategoryError, CategorySet, Subscription, Video, UNCATEGORIZED_NAME};
use crate::platform::{FetchError, PlatformClient};
use crate::storage::{CacheStore, PersistCoordinator, SUBSCRIPTIONS_KEY, VIDEOS_KEY};
use crate::{suggest, sync};

// ============================================================================
// View Signals
// ============================================================================

/// Refresh signals for the view layer, sent over an mpsc channel.
///
/// The core does not know how (or whether) these render; it only promises to
/// emit exactly one signal per logical change — an agent batch is one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Category tabs and assignments changed.
    CategoriesChanged,
    /// The video feed was rebuilt.
    FeedRefreshed,
    /// The subscription snapshot was replaced.
    SubscriptionsSynced { count: usize },
    /// The access token expired mid-operation; the user must sign in again.
    AuthExpired,
}

/// Which feed slice the view is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveTab {
    All,
    Category(String),
    /// Channels that belong to no category. Only offered when at least one
    /// such channel exists.
    Uncategorized,
}

/// One entry of the category tab strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTab {
    pub tab: ActiveTab,
    pub label: String,
}

/// What a chat turn produced: the assistant's prose plus one result line per
/// executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub explanation: String,
    pub results: Vec<String>,
}

// ============================================================================
// Application Context
// ============================================================================

/// Central application state: the one owner of subscriptions, videos, and the
/// category model. Created at sign-in, torn down at sign-out.
///
/// Every mutation goes through a method here so that persistence (via the
/// coordinator) and the view-refresh signal happen together, exactly once.
pub struct App {
    client: PlatformClient,
    cache: CacheStore,
    coordinator: PersistCoordinator,
    agent: Option<AgentClient>,
    events: mpsc::Sender<AppEvent>,

    subscriptions_ttl: chrono::Duration,
    videos_ttl: chrono::Duration,
    videos_per_channel: u32,

    pub subscriptions: Vec<Subscription>,
    pub videos: Vec<Video>,
    pub categories: CategorySet,
    chat_history: Vec<ChatMessage>,
    /// Set when categories changed since the last forced flush; lets
    /// [`shutdown`](Self::shutdown) skip a pointless remote write.
    dirty: bool,
}

impl App {
    pub fn new(
        config: &Config,
        client: PlatformClient,
        cache: CacheStore,
        coordinator: PersistCoordinator,
        agent: Option<AgentClient>,
        events: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            client,
            cache,
            coordinator,
            agent,
            events,
            subscriptions_ttl: chrono::Duration::hours(config.subscriptions_ttl_hours),
            videos_ttl: chrono::Duration::minutes(config.videos_ttl_minutes),
            videos_per_channel: config.videos_per_channel,
            subscriptions: Vec::new(),
            videos: Vec::new(),
            categories: CategorySet::default(),
            chat_history: Vec::new(),
            dirty: false,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Startup load: categories (dual-tier), subscriptions (cache or sync),
    /// then the video feed (cache or refresh).
    ///
    /// A token expiry anywhere in the load aborts it, emits
    /// [`AppEvent::AuthExpired`], and propagates as the load failure.
    pub async fn load_everything(&mut self) -> Result<(), FetchError> {
        match self.load_inner().await {
            Ok(()) => Ok(()),
            Err(e) => {
                if matches!(e, FetchError::Auth(_)) {
                    let _ = self.events.send(AppEvent::AuthExpired).await;
                }
                Err(e)
            }
        }
    }

    async fn load_inner(&mut self) -> Result<(), FetchError> {
        self.categories = self.coordinator.load().await;

        match self.cache.get_json::<Vec<Subscription>>(SUBSCRIPTIONS_KEY).await {
            Ok(Some(subs)) => {
                tracing::debug!(count = subs.len(), "Using cached subscriptions");
                self.subscriptions = subs;
            }
            Ok(None) => self.resync_subscriptions().await?,
            Err(e) => {
                tracing::warn!(error = %e, "Subscription cache read failed");
                self.resync_subscriptions().await?;
            }
        }

        self.videos = sync::load_videos(
            &self.client,
            &self.cache,
            &self.subscriptions,
            self.videos_per_channel,
            self.videos_ttl,
        )
        .await?;

        let _ = self.events.send(AppEvent::FeedRefreshed).await;
        Ok(())
    }

    /// Bypass the cache and sync subscriptions from the API.
    ///
    /// The first sync that lands subscriptions while the category set is
    /// empty triggers the one-shot topic auto-assignment. A cache-hit load
    /// never does.
    pub async fn resync_subscriptions(&mut self) -> Result<(), FetchError> {
        self.subscriptions =
            sync::sync_subscriptions(&self.client, &self.cache, self.subscriptions_ttl).await?;
        let _ = self
            .events
            .send(AppEvent::SubscriptionsSynced {
                count: self.subscriptions.len(),
            })
            .await;

        self.maybe_auto_suggest().await;
        Ok(())
    }

    /// Rebuild the video feed from the API.
    pub async fn refresh_videos(&mut self) -> Result<(), FetchError> {
        self.videos = sync::refresh_videos(
            &self.client,
            &self.cache,
            &self.subscriptions,
            self.videos_per_channel,
            self.videos_ttl,
        )
        .await?;
        let _ = self.events.send(AppEvent::FeedRefreshed).await;
        Ok(())
    }

    /// Drop the subscription and video snapshots so the next load re-syncs.
    /// Categories are not touched — they are not a cache.
    pub async fn clear_snapshot_cache(&self) {
        for key in [SUBSCRIPTIONS_KEY, VIDEOS_KEY] {
            if let Err(e) = self.cache.remove(key).await {
                tracing::warn!(key = %key, error = %e, "Cache clear failed");
            }
        }
    }

    async fn maybe_auto_suggest(&mut self) {
        if !self.categories.is_empty() || self.subscriptions.is_empty() {
            return;
        }

        let assigned = suggest::auto_assign(&self.subscriptions, &mut self.categories);
        if self.categories.is_empty() {
            // Nothing matched the topic table; no state change to persist.
            return;
        }

        tracing::info!(
            assigned = assigned,
            categories = self.categories.len(),
            "Auto-suggested categories from topic metadata"
        );
        self.persist_categories().await;
    }

    // ------------------------------------------------------------------
    // Category Mutations
    // ------------------------------------------------------------------

    pub async fn create_category(&mut self, name: &str) -> Result<String, CategoryError> {
        let id = self.categories.ensure(name)?.id.clone();
        self.persist_categories().await;
        Ok(id)
    }

    pub async fn rename_category(
        &mut self,
        id: &str,
        new_name: &str,
    ) -> Result<bool, CategoryError> {
        let renamed = self.categories.rename(id, new_name)?;
        if renamed {
            self.persist_categories().await;
        }
        Ok(renamed)
    }

    pub async fn delete_category(&mut self, id: &str) -> bool {
        let deleted = self.categories.delete(id).is_some();
        if deleted {
            self.persist_categories().await;
        }
        deleted
    }

    pub async fn assign_channel(&mut self, channel_id: &str, category_id: Option<&str>) {
        self.categories.assign(channel_id, category_id);
        self.persist_categories().await;
    }

    async fn persist_categories(&mut self) {
        self.dirty = true;
        self.coordinator.save(&self.categories).await;
        let _ = self.events.send(AppEvent::CategoriesChanged).await;
    }

    // ------------------------------------------------------------------
    // Assistant
    // ------------------------------------------------------------------

    /// One chat turn: send the history, apply whatever command batch comes
    /// back, and report per-command results.
    ///
    /// The whole batch is one transaction from the view's perspective: one
    /// coordinator save and one [`AppEvent::CategoriesChanged`], no matter
    /// how many commands ran or how many of them failed.
    pub async fn send_chat_message(&mut self, text: &str) -> Result<ChatOutcome, AgentError> {
        let Some(agent) = &self.agent else {
            return Err(AgentError::NotConnected);
        };

        self.chat_history.push(ChatMessage::user(text));

        let mut messages = vec![ChatMessage::system(build_system_prompt(
            &self.categories,
            &self.subscriptions,
        ))];
        messages.extend(self.chat_history.iter().cloned());

        let reply = agent.complete(&messages).await?;
        let commands = extract_actions(&reply);
        let explanation = extract_explanation(&reply);
        self.chat_history.push(ChatMessage::assistant(reply));

        let results = if commands.is_empty() {
            Vec::new()
        } else {
            let results = execute(&commands, &mut self.categories);
            self.persist_categories().await;
            results
        };

        Ok(ChatOutcome {
            explanation,
            results,
        })
    }

    // ------------------------------------------------------------------
    // Feed Queries
    // ------------------------------------------------------------------

    /// The tab strip: "All", one tab per category in insertion order, and an
    /// "Uncategorized" tab only while some subscription has no category.
    pub fn category_tabs(&self) -> Vec<CategoryTab> {
        let mut tabs = vec![CategoryTab {
            tab: ActiveTab::All,
            label: "All".to_string(),
        }];

        for cat in &self.categories.categories {
            tabs.push(CategoryTab {
                tab: ActiveTab::Category(cat.id.clone()),
                label: cat.name.clone(),
            });
        }

        let has_uncategorized = self
            .subscriptions
            .iter()
            .any(|s| self.categories.find_for_channel(&s.channel_id).is_none());
        if has_uncategorized {
            tabs.push(CategoryTab {
                tab: ActiveTab::Uncategorized,
                label: UNCATEGORIZED_NAME.to_string(),
            });
        }

        tabs
    }

    /// Videos visible under a tab, narrowed by a search string.
    pub fn filtered_videos(&self, tab: &ActiveTab, search: &str) -> Vec<&Video> {
        let mut videos: Vec<&Video> = self.videos.iter().collect();

        match tab {
            ActiveTab::All => {}
            ActiveTab::Uncategorized => {
                let assigned = self.categories.assigned_channel_ids();
                videos.retain(|v| !assigned.contains(v.channel_id.as_str()));
            }
            ActiveTab::Category(id) => {
                // A stale tab id (category just deleted) filters nothing,
                // which reads as "All" until the view picks a new tab.
                if let Some(cat) = self.categories.get(id) {
                    let members: HashSet<&str> =
                        cat.channel_ids.iter().map(String::as_str).collect();
                    videos.retain(|v| members.contains(v.channel_id.as_str()));
                }
            }
        }

        if !search.is_empty() {
            let q = search.to_lowercase();
            videos.retain(|v| {
                v.title.to_lowercase().contains(&q) || v.channel_title.to_lowercase().contains(&q)
            });
        }

        videos
    }

    /// Channels visible under a tab, narrowed by a search string, sorted by
    /// title.
    pub fn filtered_channels(&self, tab: &ActiveTab, search: &str) -> Vec<&Subscription> {
        let mut channels: Vec<&Subscription> = self.subscriptions.iter().collect();
        channels.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));

        match tab {
            ActiveTab::All => {}
            ActiveTab::Uncategorized => {
                let assigned = self.categories.assigned_channel_ids();
                channels.retain(|c| !assigned.contains(c.channel_id.as_str()));
            }
            ActiveTab::Category(id) => {
                if let Some(cat) = self.categories.get(id) {
                    let members: HashSet<&str> =
                        cat.channel_ids.iter().map(String::as_str).collect();
                    channels.retain(|c| members.contains(c.channel_id.as_str()));
                }
            }
        }

        if !search.is_empty() {
            let q = search.to_lowercase();
            channels.retain(|c| c.title.to_lowercase().contains(&q));
        }

        channels
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Shutdown flush: force any pending category write out before the
    /// process exits, so a short run does not die inside the debounce window.
    pub async fn shutdown(&mut self) {
        if self.dirty {
            self.coordinator.flush_now(&self.categories).await;
            self.dirty = false;
        }
    }

    /// Sign-out teardown: drop in-memory state and any pending remote flush.
    /// The local cache keeps its snapshots; the remote document is left as
    /// last flushed.
    pub fn sign_out(&mut self) {
        self.coordinator.cancel_pending();
        self.subscriptions.clear();
        self.videos.clear();
        self.categories = CategorySet::default();
        self.chat_history.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
