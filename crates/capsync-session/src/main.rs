//! capsync command-line entry point.
//!
//! Usage: `capsync <video-url-or-id>`

use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use capsync_models::format_clock;
use capsync_session::{CaptionSession, SessionConfig};
use capsync_timeline::MediaPlayer;

/// The CLI prints the timeline; no media is attached.
struct DetachedPlayer;

#[async_trait]
impl MediaPlayer for DetachedPlayer {
    async fn current_time(&self) -> Option<f64> {
        None
    }

    async fn seek_to(&self, _time: f64) {}
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("capsync=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    let input = std::env::args()
        .nth(1)
        .context("usage: capsync <video-url-or-id>")?;

    let config = SessionConfig::from_env();
    info!("Session config: {:?}", config);
    let lookahead = config.lookahead;

    let mut session = CaptionSession::from_config(config, Arc::new(DetachedPlayer))?;
    let video = session.load_url(&input).await?;

    if video.timeline.is_empty() {
        println!("No captions available for {}", video.video_id);
        return Ok(());
    }

    let translated = session.backfill(0.0).await?;
    info!(translated, lookahead, "Backfilled translations for the opening window");

    for caption in video.timeline.iter() {
        println!(
            "[{} - {}] {}",
            format_clock(caption.start_time),
            format_clock(caption.end_time),
            caption.text
        );
        if let Some(translation) = session.translation_for(caption.id).await {
            println!("    {}", translation);
        }
    }

    session.unload().await;
    Ok(())
}
