use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use subdeck::app::{ActiveTab, App, AppEvent};
use subdeck::config::Config;
use subdeck::model::{format_duration, format_view_count, UNCATEGORIZED_ID};
use subdeck::platform::{AuthSession, FetchError, PlatformClient};
use subdeck::storage::{CacheStore, PersistCoordinator, RemoteStore};
use subdeck::agent::AgentClient;

/// Get the config directory path (~/.config/subdeck/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("subdeck"))
}

/// Build the auth session from the environment.
///
/// Token acquisition (the OAuth consent flow) happens outside this binary;
/// it consumes the resulting token via `SUBDECK_ACCESS_TOKEN`, with an
/// optional RFC 3339 expiry in `SUBDECK_TOKEN_EXPIRES_AT` (default: one hour
/// from now).
fn auth_from_env() -> Result<AuthSession> {
    let token = std::env::var("SUBDECK_ACCESS_TOKEN").context(
        "SUBDECK_ACCESS_TOKEN is not set. Export an OAuth access token with \
         youtube.readonly and drive.appdata scopes.",
    )?;

    let expires_at = match std::env::var("SUBDECK_TOKEN_EXPIRES_AT") {
        Ok(raw) => DateTime::parse_from_rfc3339(&raw)
            .context("SUBDECK_TOKEN_EXPIRES_AT must be an RFC 3339 timestamp")?
            .with_timezone(&Utc),
        Err(_) => Utc::now() + chrono::Duration::hours(1),
    };

    Ok(AuthSession::new(token, expires_at))
}

#[derive(Parser, Debug)]
#[command(name = "subdeck", about = "Organize video subscriptions into categories")]
struct Args {
    /// Config file path (default: ~/.config/subdeck/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drop cached subscription/video snapshots before loading
    #[arg(long)]
    clear_cache: bool,

    /// Force a subscription re-sync even if a fresh snapshot is cached
    #[arg(long)]
    resync: bool,

    /// Send one message to the category assistant after loading
    #[arg(long, value_name = "TEXT")]
    chat: Option<String>,

    /// Show only this category tab (a category id, or "uncategorized")
    #[arg(long, value_name = "ID")]
    category: Option<String>,

    /// Filter the printed feed by a search string
    #[arg(long, default_value = "")]
    search: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config_path = args
        .config
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let auth = Arc::new(auth_from_env()?);

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let cache_path = config_dir.join("cache.db");
    let cache_path_str = cache_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in cache path"))?;
    let cache = CacheStore::open(cache_path_str)
        .await
        .context("Failed to open cache database")?;

    let remote = RemoteStore::new(
        http.clone(),
        &config.drive_api_base,
        &config.drive_upload_base,
        Arc::clone(&auth),
    );
    let coordinator = PersistCoordinator::new(
        cache.clone(),
        remote,
        std::time::Duration::from_millis(config.debounce_ms),
    );
    let client = PlatformClient::new(http.clone(), &config.youtube_api_base, auth);

    let chat_key = std::env::var("SUBDECK_CHAT_API_KEY")
        .ok()
        .or_else(|| config.chat_api_key.clone());
    let agent = chat_key.map(|key| {
        AgentClient::new(http.clone(), &config.chat_api_base, &config.chat_model, key)
    });

    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(32);
    let mut app = App::new(&config, client, cache, coordinator, agent, event_tx);

    // View stand-in: log refresh signals as they arrive.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            tracing::debug!(?event, "view refresh");
        }
    });

    if args.clear_cache {
        app.clear_snapshot_cache().await;
        println!("Snapshot cache cleared.");
    }

    match app.load_everything().await {
        Ok(()) => {}
        Err(FetchError::Auth(e)) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to load data: {e}. Please try refreshing.");
            std::process::exit(1);
        }
    }

    if args.resync {
        app.resync_subscriptions()
            .await
            .context("Subscription re-sync failed")?;
        app.refresh_videos().await.context("Video refresh failed")?;
        println!("Synced {} subscriptions.", app.subscriptions.len());
    }

    if let Some(message) = &args.chat {
        let outcome = app
            .send_chat_message(message)
            .await
            .context("Chat request failed")?;
        if !outcome.explanation.is_empty() {
            println!("{}\n", outcome.explanation);
        }
        for line in &outcome.results {
            println!("  {line}");
        }
    }

    let tab = match args.category.as_deref() {
        None => ActiveTab::All,
        Some(UNCATEGORIZED_ID) => ActiveTab::Uncategorized,
        Some(id) => ActiveTab::Category(id.to_string()),
    };
    print_feed(&app, &tab, &args.search);

    // Push out any category edit still sitting in the debounce window.
    app.shutdown().await;
    Ok(())
}

/// Plain-text rendering of the tab strip and the filtered feed.
fn print_feed(app: &App, tab: &ActiveTab, search: &str) {
    let strip = app
        .category_tabs()
        .into_iter()
        .map(|t| {
            if t.tab == *tab {
                format!("[{}]", t.label)
            } else {
                t.label
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    println!("\n{strip}\n");

    let videos = app.filtered_videos(tab, search);
    if videos.is_empty() {
        println!("No videos found for this view.");
        return;
    }

    for video in videos.iter().take(30) {
        let date = video
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:>8}  {:<60}  {} ({}, {})",
            format_duration(&video.duration),
            video.title.chars().take(60).collect::<String>(),
            video.channel_title,
            format_view_count(video.view_count),
            date,
        );
    }
    if videos.len() > 30 {
        println!("… and {} more", videos.len() - 30);
    }
}
