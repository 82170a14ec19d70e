//! Platform integration: the bearer-token contract and the metadata fetcher.
//!
//! Token *acquisition* (OAuth consent, refresh flows) happens outside this
//! crate; [`AuthSession`] only models the contract the core consumes — an
//! access token with an absolute expiry, checked before every remote call.

mod auth;
mod client;

pub use auth::{AuthError, AuthSession};
pub use client::{ChannelDetail, FetchError, PlatformClient, SubscriptionSummary};
