//! Translation-on-demand queue state.
//!
//! FIFO of pending captions, one loading slot and a map of finished results.
//! Every item passes through the loading slot, so at most one translation is
//! in flight at a time. The state is scoped to one video: `reset` starts a new
//! generation and results that belong to an earlier generation are dropped.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use capsync_models::{CaptionId, MergedCaption};

/// A caption waiting for, or undergoing, translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTranslation {
    pub caption_id: CaptionId,
    pub text: String,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct TranslationQueue {
    pending: VecDeque<PendingTranslation>,
    enqueued: HashSet<CaptionId>,
    loading: Option<PendingTranslation>,
    /// `None` records a failed lookup; failures are not retried
    completed: HashMap<CaptionId, Option<String>>,
    generation: u64,
}

impl TranslationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a caption needs a lookup: it lacks a bundled translation and is
    /// not already completed, loading or enqueued.
    fn needs_lookup(&self, caption: &MergedCaption) -> bool {
        !caption.has_translation()
            && !caption.text.trim().is_empty()
            && !self.completed.contains_key(&caption.id)
            && !self.enqueued.contains(&caption.id)
            && self.loading.as_ref().map(|l| l.caption_id) != Some(caption.id)
    }

    /// Enqueue captions that are playing or start within `lookahead` seconds
    /// of `time`. Returns how many were added.
    pub fn enqueue_eligible(&mut self, timeline: &[MergedCaption], time: f64, lookahead: f64) -> usize {
        let horizon = time + lookahead;
        let mut added = 0;

        for caption in timeline {
            if caption.end_time <= time || caption.start_time > horizon {
                continue;
            }
            if !self.needs_lookup(caption) {
                continue;
            }

            self.enqueued.insert(caption.id);
            self.pending.push_back(PendingTranslation {
                caption_id: caption.id,
                text: caption.text.clone(),
                generation: self.generation,
            });
            added += 1;
        }

        if added > 0 {
            debug!(added, pending = self.pending.len(), time, "Enqueued captions for translation");
        }
        added
    }

    /// Move the head of the queue into the loading slot.
    ///
    /// Returns `None` while another item is loading or when nothing is pending.
    pub fn begin_next(&mut self) -> Option<PendingTranslation> {
        if self.loading.is_some() {
            return None;
        }

        let item = self.pending.pop_front()?;
        self.enqueued.remove(&item.caption_id);
        self.loading = Some(item.clone());
        Some(item)
    }

    /// Record the outcome of the loading item and free the slot.
    ///
    /// Returns `false` if the item no longer belongs to this queue (it was
    /// reset while the lookup was running); the result is then discarded.
    pub fn complete(&mut self, item: &PendingTranslation, translation: Option<String>) -> bool {
        if item.generation != self.generation {
            return false;
        }
        if self.loading.as_ref() == Some(item) {
            self.loading = None;
        }
        self.completed.insert(item.caption_id, translation);
        true
    }

    /// Put an interrupted loading item back at the head of the queue.
    pub fn requeue_loading(&mut self) {
        if let Some(item) = self.loading.take() {
            self.enqueued.insert(item.caption_id);
            self.pending.push_front(item);
        }
    }

    /// Forget all state and start a new generation.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.enqueued.clear();
        self.loading = None;
        self.completed.clear();
        self.generation += 1;
    }

    /// Backfilled translation for a caption, if the lookup succeeded.
    pub fn translation(&self, caption_id: CaptionId) -> Option<&str> {
        self.completed.get(&caption_id).and_then(|t| t.as_deref())
    }

    pub fn is_completed(&self, caption_id: CaptionId) -> bool {
        self.completed.contains_key(&caption_id)
    }

    pub fn loading(&self) -> Option<CaptionId> {
        self.loading.as_ref().map(|l| l.caption_id)
    }

    pub fn pending_ids(&self) -> Vec<CaptionId> {
        self.pending.iter().map(|p| p.caption_id).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.loading.is_none()
    }
}
