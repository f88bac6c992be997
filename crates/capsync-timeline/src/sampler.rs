//! Schedulable playback sampling loop.
//!
//! The sampler polls a [`MediaPlayer`] on a fixed interval, feeds the time to
//! the shared [`PlaybackSynchronizer`] and forwards changes on a channel. The
//! latest observed time is also published on a `watch` channel so other
//! tasks (the translation worker) can follow playback without polling the
//! player themselves.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use capsync_models::MergedCaption;

use crate::synchronizer::{ActiveCaptionChange, PlaybackSynchronizer, DEFAULT_DEBOUNCE_SECS};

/// Control surface of the media player.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Current playback position in seconds, `None` when not available.
    async fn current_time(&self) -> Option<f64>;

    /// Move playback to `time` seconds.
    async fn seek_to(&self, time: f64);
}

/// Sampler configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub debounce: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            debounce: DEFAULT_DEBOUNCE_SECS,
        }
    }
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Polls playback time and drives the synchronizer.
pub struct PlaybackSampler {
    player: Arc<dyn MediaPlayer>,
    config: SamplerConfig,
    synchronizer: Arc<Mutex<PlaybackSynchronizer>>,
    events: mpsc::UnboundedSender<ActiveCaptionChange>,
    position: watch::Sender<f64>,
    running: Option<RunningLoop>,
}

impl PlaybackSampler {
    /// Create a stopped sampler and the receiving end of its change events.
    pub fn new(
        player: Arc<dyn MediaPlayer>,
        timeline: Arc<[MergedCaption]>,
        config: SamplerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ActiveCaptionChange>) {
        let synchronizer = PlaybackSynchronizer::new(timeline).with_debounce(config.debounce);
        let (events, events_rx) = mpsc::unbounded_channel();
        let (position, _) = watch::channel(0.0);

        let sampler = Self {
            player,
            config,
            synchronizer: Arc::new(Mutex::new(synchronizer)),
            events,
            position,
            running: None,
        };
        (sampler, events_rx)
    }

    /// Latest observed playback time.
    pub fn position(&self) -> watch::Receiver<f64> {
        self.position.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// The caption active as of the last processed sample or seek.
    pub async fn active(&self) -> Option<MergedCaption> {
        self.synchronizer.lock().await.active().cloned()
    }

    /// Start the polling loop. Starting a running sampler does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let player = self.player.clone();
        let synchronizer = self.synchronizer.clone();
        let events = self.events.clone();
        let position = self.position.clone();
        let period = self.config.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let Some(time) = player.current_time().await else {
                            continue;
                        };
                        position.send_replace(time);

                        let change = synchronizer.lock().await.sample(time);
                        if let Some(change) = change {
                            debug!(time, caption_id = ?change.current_id(), kind = ?change.kind(), "Active caption changed");
                            if events.send(change).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            debug!("Playback sampler loop exited");
        });

        info!(interval_ms = period.as_millis() as u64, "Playback sampler started");
        self.running = Some(RunningLoop { shutdown, handle });
    }

    /// Stop the polling loop and wait for it to exit.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            let _ = running.handle.await;
            info!("Playback sampler stopped");
        }
    }

    /// Replace the timeline, clearing the active caption and the published
    /// position. The player is not touched.
    pub async fn reset(&self, timeline: Arc<[MergedCaption]>) {
        self.synchronizer.lock().await.set_timeline(timeline);
        self.position.send_replace(0.0);
    }

    /// Seek the player and report the caption at the new position at once.
    pub async fn seek(&self, time: f64) -> ActiveCaptionChange {
        self.player.seek_to(time).await;
        self.position.send_replace(time);

        let change = self.synchronizer.lock().await.seek(time);
        let _ = self.events.send(change.clone());
        change
    }
}

impl Drop for PlaybackSampler {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            running.handle.abort();
        }
    }
}
