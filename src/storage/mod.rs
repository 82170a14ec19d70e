//! Persistence: the fast local cache tier and the authoritative remote
//! document store, reconciled by [`PersistCoordinator`].

mod cache;
mod coordinator;
mod remote;

pub use cache::{CacheError, CacheStore, CATEGORIES_KEY, SUBSCRIPTIONS_KEY, VIDEOS_KEY};
pub use coordinator::{PersistCoordinator, CATEGORIES_DOC_NAME};
pub use remote::{RemoteError, RemoteStore};
