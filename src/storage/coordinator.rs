use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::cache::{CacheStore, CATEGORIES_KEY};
use super::remote::{RemoteError, RemoteStore};
use crate::model::CategorySet;

/// Well-known name of the category document in the remote store.
pub const CATEGORIES_DOC_NAME: &str = "categories.json";

// ============================================================================
// Debounce State
// ============================================================================

/// Explicit debounce state: either no flush is pending, or exactly one
/// delayed flush task is. Scheduling while pending aborts the old task —
/// only the latest snapshot ever reaches the remote store.
enum FlushState {
    Idle,
    Pending(JoinHandle<()>),
}

/// Outcome of the startup remote read.
enum RemoteRead {
    /// A document with a valid category shape — authoritative.
    Document(CategorySet),
    /// No document (or one with no `categories` content). Eligible for
    /// migration from the local tier.
    Absent,
    /// Transport/auth failure or a malformed document. Fall back to the
    /// local tier and leave the remote alone.
    Unavailable,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Reconciles the category model between the local cache and the remote
/// document store.
///
/// Load: cache first (instant, possibly stale), then the remote document,
/// which wins unconditionally when present and valid. An absent remote with a
/// non-empty local set triggers a one-shot best-effort migration.
///
/// Save: the cache write happens in-line; the remote write is debounced
/// behind a quiescence window, and every save supersedes the previous pending
/// flush. Remote failures degrade durability, never correctness — they are
/// logged and dropped.
pub struct PersistCoordinator {
    cache: CacheStore,
    remote: RemoteStore,
    debounce: Duration,
    /// Server-assigned document handle, discovered once per session.
    doc_handle: Arc<tokio::sync::Mutex<Option<String>>>,
    flush: Mutex<FlushState>,
}

impl PersistCoordinator {
    pub fn new(cache: CacheStore, remote: RemoteStore, debounce: Duration) -> Self {
        Self {
            cache,
            remote,
            debounce,
            doc_handle: Arc::new(tokio::sync::Mutex::new(None)),
            flush: Mutex::new(FlushState::Idle),
        }
    }

    /// Startup read path. Never fails: the worst case is an empty set.
    pub async fn load(&self) -> CategorySet {
        let local: CategorySet = match self.cache.get_json(CATEGORIES_KEY).await {
            Ok(Some(set)) => set,
            Ok(None) => CategorySet::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Category cache read failed");
                CategorySet::default()
            }
        };

        match self.read_remote().await {
            RemoteRead::Document(set) => {
                tracing::info!(categories = set.len(), "Loaded categories from remote store");
                if let Err(e) = self.cache.set_json(CATEGORIES_KEY, &set, None).await {
                    tracing::warn!(error = %e, "Category cache write failed");
                }
                set
            }
            RemoteRead::Absent => {
                if !local.is_empty() {
                    tracing::info!(
                        categories = local.len(),
                        "Remote store empty, migrating local categories"
                    );
                    if let Err(e) = self.write_remote(&local).await {
                        tracing::warn!(error = %e, "Category migration failed");
                    }
                }
                local
            }
            RemoteRead::Unavailable => {
                tracing::debug!("Remote store unavailable, using cached categories");
                local
            }
        }
    }

    /// Persist a mutation: cache in-line, remote debounced.
    ///
    /// The snapshot taken here rides the flush task; a later save replaces
    /// the task and its snapshot, so a burst of edits produces exactly one
    /// remote write carrying the final state.
    pub async fn save(&self, categories: &CategorySet) {
        if let Err(e) = self
            .cache
            .set_json(CATEGORIES_KEY, categories, None)
            .await
        {
            tracing::warn!(error = %e, "Category cache write failed");
        }
        self.schedule_flush(categories.clone());
    }

    /// Cancel any pending flush and write the given state immediately.
    ///
    /// For process shutdown: a short-lived CLI run must not exit inside the
    /// debounce window and silently drop its last edits.
    pub async fn flush_now(&self, categories: &CategorySet) {
        self.cancel_pending();
        if let Err(e) = self.write_remote(categories).await {
            tracing::warn!(error = %e, "Remote category save failed");
        }
    }

    /// Drop any pending flush without writing. Used at sign-out teardown.
    pub fn cancel_pending(&self) {
        let mut state = self.flush.lock().unwrap_or_else(|p| p.into_inner());
        if let FlushState::Pending(task) = std::mem::replace(&mut *state, FlushState::Idle) {
            task.abort();
        }
    }

    fn schedule_flush(&self, snapshot: CategorySet) {
        let remote = self.remote.clone();
        let doc_handle = Arc::clone(&self.doc_handle);
        let delay = self.debounce;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = write_remote_document(&remote, &doc_handle, &snapshot).await {
                tracing::warn!(error = %e, "Remote category save failed");
            }
        });

        let mut state = self.flush.lock().unwrap_or_else(|p| p.into_inner());
        if let FlushState::Pending(old) = std::mem::replace(&mut *state, FlushState::Pending(task))
        {
            old.abort();
        }
    }

    /// Immediate (non-debounced) remote write, used for migration.
    async fn write_remote(&self, categories: &CategorySet) -> Result<(), RemoteError> {
        write_remote_document(&self.remote, &self.doc_handle, categories).await
    }

    async fn read_remote(&self) -> RemoteRead {
        let handle = match self.remote.find_document(CATEGORIES_DOC_NAME).await {
            Ok(Some(handle)) => handle,
            Ok(None) => return RemoteRead::Absent,
            Err(e) => {
                tracing::warn!(error = %e, "Remote category lookup failed");
                return RemoteRead::Unavailable;
            }
        };

        // Remember the handle for the session's writes.
        *self.doc_handle.lock().await = Some(handle.clone());

        let value = match self.remote.read_document(&handle).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Remote category read failed");
                return RemoteRead::Unavailable;
            }
        };

        // A document with no `categories` content counts as empty: the local
        // tier may migrate over it.
        let has_categories = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("categories"));
        if !has_categories {
            return RemoteRead::Absent;
        }

        match serde_json::from_value::<CategorySet>(value) {
            Ok(set) => RemoteRead::Document(set),
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting malformed remote category document");
                RemoteRead::Unavailable
            }
        }
    }
}

impl Drop for PersistCoordinator {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Update the named document in place if a handle is known, discovering or
/// creating it otherwise. The handle cache lives for the process only.
async fn write_remote_document(
    remote: &RemoteStore,
    doc_handle: &tokio::sync::Mutex<Option<String>>,
    categories: &CategorySet,
) -> Result<(), RemoteError> {
    let content = serde_json::to_value(categories)?;
    let mut handle = doc_handle.lock().await;

    if handle.is_none() {
        *handle = remote.find_document(CATEGORIES_DOC_NAME).await?;
    }

    match handle.as_deref() {
        Some(id) => remote.update_document(id, &content).await,
        None => {
            let id = remote.create_document(CATEGORIES_DOC_NAME, &content).await?;
            *handle = Some(id);
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
