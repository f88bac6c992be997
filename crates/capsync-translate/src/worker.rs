//! Schedulable translation backfill loop.
//!
//! On every tick the worker reads the latest playback time from a `watch`
//! channel, enqueues captions inside the lookahead window and drains the
//! queue one lookup at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use capsync_models::{CaptionId, MergedCaption};

use crate::queue::TranslationQueue;
use crate::translator::Translator;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct TranslationWorkerConfig {
    /// Seconds ahead of the playback position to translate
    pub lookahead: f64,
    pub poll_interval: Duration,
    pub target_language: String,
}

impl Default for TranslationWorkerConfig {
    fn default() -> Self {
        Self {
            lookahead: 10.0,
            poll_interval: Duration::from_millis(250),
            target_language: "ja".to_string(),
        }
    }
}

/// A finished lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUpdate {
    pub caption_id: CaptionId,
    /// `None` when the lookup failed
    pub translation: Option<String>,
}

struct Shared {
    translator: Arc<dyn Translator>,
    queue: Mutex<TranslationQueue>,
    timeline: RwLock<Arc<[MergedCaption]>>,
    config: TranslationWorkerConfig,
    updates: mpsc::UnboundedSender<TranslationUpdate>,
}

impl Shared {
    async fn process_next(&self) -> Option<TranslationUpdate> {
        let item = self.queue.lock().await.begin_next()?;

        debug!(caption_id = item.caption_id, "Translating caption");
        let translation = self
            .translator
            .translate(&item.text, &self.config.target_language)
            .await;

        if !self.queue.lock().await.complete(&item, translation.clone()) {
            debug!(caption_id = item.caption_id, "Dropping translation for a previous video");
            return None;
        }

        let update = TranslationUpdate {
            caption_id: item.caption_id,
            translation,
        };
        let _ = self.updates.send(update.clone());
        Some(update)
    }

    async fn run_pass(&self, time: f64) -> usize {
        let timeline = self.timeline.read().await.clone();
        self.queue
            .lock()
            .await
            .enqueue_eligible(&timeline, time, self.config.lookahead);

        let mut processed = 0;
        while self.process_next().await.is_some() {
            processed += 1;
        }
        processed
    }
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the translation queue and backfills it near the playback position.
pub struct TranslationWorker {
    shared: Arc<Shared>,
    running: Option<RunningLoop>,
}

impl TranslationWorker {
    pub fn new(
        translator: Arc<dyn Translator>,
        config: TranslationWorkerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TranslationUpdate>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            translator,
            queue: Mutex::new(TranslationQueue::new()),
            timeline: RwLock::new(Arc::from(Vec::new())),
            config,
            updates,
        });

        (Self { shared, running: None }, updates_rx)
    }

    pub fn config(&self) -> &TranslationWorkerConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// Start following `position`. Starting a running worker does nothing.
    pub fn start(&mut self, mut position: watch::Receiver<f64>) {
        if self.is_running() {
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let shared = self.shared.clone();
        let period = shared.config.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // A pass is abandoned mid-lookup when shutdown arrives.
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = async {
                        ticker.tick().await;
                        let time = *position.borrow_and_update();
                        shared.run_pass(time).await
                    } => {}
                }
            }
            debug!("Translation worker loop exited");
        });

        info!(lookahead = self.shared.config.lookahead, "Translation worker started");
        self.running = Some(RunningLoop { shutdown, handle });
    }

    /// Stop the loop and wait for it. An interrupted lookup goes back to the
    /// head of the queue.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            let _ = running.handle.await;
            self.shared.queue.lock().await.requeue_loading();
            info!("Translation worker stopped");
        }
    }

    /// Switch to a new timeline and clear all queue state.
    pub async fn reset(&self, timeline: Arc<[MergedCaption]>) {
        *self.shared.timeline.write().await = timeline;
        self.shared.queue.lock().await.reset();
    }

    /// Enqueue around `time` and translate until the queue is drained or
    /// another pass holds the loading slot.
    pub async fn run_pass(&self, time: f64) -> usize {
        self.shared.run_pass(time).await
    }

    /// Translate the head of the queue, if the loading slot is free.
    pub async fn process_next(&self) -> Option<TranslationUpdate> {
        self.shared.process_next().await
    }

    pub async fn translation(&self, caption_id: CaptionId) -> Option<String> {
        self.shared.queue.lock().await.translation(caption_id).map(str::to_string)
    }

    pub async fn pending_len(&self) -> usize {
        self.shared.queue.lock().await.pending_len()
    }
}

impl Drop for TranslationWorker {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            running.handle.abort();
        }
    }
}
