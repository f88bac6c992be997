//! Sentence merging.
//!
//! Auto-generated tracks arrive as short fragments cut at arbitrary points.
//! The merger walks them once, keeping a single open group, and decides for
//! each next fragment whether it continues the group or starts a new one.
//! Finalized groups are never revisited. Manual captions pass through one to
//! one.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use capsync_models::{Caption, MergedCaption};

const CONJUNCTIONS: &[&str] = &[
    "and",
    "but",
    "or",
    "because",
    "so",
    "however",
    "therefore",
    "thus",
    "moreover",
    "furthermore",
    "additionally",
];

const PREPOSITIONS: &[&str] = &["in", "on", "at", "to", "for", "with", "by", "from", "of", "about"];

const QUOTES: &[char] = &['"', '\u{201C}', '\u{201D}'];

/// Merge decision thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeThresholds {
    /// Gap in seconds at or below which fragments always merge
    pub force_merge_gap: f64,
    /// Largest gap in seconds the fallback rule accepts
    pub fallback_gap: f64,
    /// Combined text length (chars) a merge must stay under
    pub max_chars: usize,
    /// A next fragment with at most this many words counts as short
    pub short_words: usize,
    /// A group with fewer than this many words counts as small
    pub small_group_words: usize,
}

impl Default for MergeThresholds {
    fn default() -> Self {
        Self {
            force_merge_gap: 1.0,
            fallback_gap: 3.0,
            max_chars: 200,
            short_words: 5,
            small_group_words: 10,
        }
    }
}

/// Open group of adjacent captions.
struct Group<'a> {
    members: Vec<&'a Caption>,
    text: String,
    end_time: f64,
}

impl<'a> Group<'a> {
    fn open(caption: &'a Caption) -> Self {
        Self {
            members: vec![caption],
            text: caption.text.trim().to_string(),
            end_time: caption.end_time,
        }
    }

    fn push(&mut self, caption: &'a Caption) {
        let next = caption.text.trim();
        if !next.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(next);
        }
        self.end_time = self.end_time.max(caption.end_time);
        self.members.push(caption);
    }

    fn is_auto_generated(&self) -> bool {
        self.members.iter().all(|c| c.is_auto_generated)
    }

    fn finalize(self) -> MergedCaption {
        let first = self.members[0];
        if self.members.len() == 1 {
            return MergedCaption::from(first);
        }

        let translations: Vec<&str> = self
            .members
            .iter()
            .filter_map(|c| c.translation.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        MergedCaption {
            id: first.id,
            start_time: first.start_time,
            end_time: self.end_time,
            text: with_terminal_period(self.text),
            translation: (!translations.is_empty()).then(|| translations.join(" ")),
            is_auto_generated: first.is_auto_generated,
            member_ids: self.members.iter().map(|c| c.id).collect(),
        }
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn bare_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?'])
}

fn starts_with_conjunction(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|w| CONJUNCTIONS.contains(&bare_word(w).as_str()))
}

fn ends_with_preposition(text: &str) -> bool {
    text.split_whitespace()
        .next_back()
        .is_some_and(|w| PREPOSITIONS.contains(&bare_word(w).as_str()))
}

fn has_open_quote(text: &str) -> bool {
    text.chars().filter(|c| QUOTES.contains(c)).count() % 2 == 1
}

fn with_terminal_period(mut text: String) -> String {
    if !text.is_empty() && !ends_sentence(&text) && !text.ends_with([',', ';']) {
        text.push('.');
    }
    text
}

fn should_merge(group: &Group<'_>, next: &Caption, thresholds: &MergeThresholds) -> bool {
    if !group.is_auto_generated() || !next.is_auto_generated {
        return false;
    }

    let next_text = next.text.trim();
    let next_words = word_count(next_text);

    if ends_sentence(&group.text) && next_words > thresholds.short_words {
        return false;
    }

    let gap = next.start_time - group.end_time;
    if gap <= thresholds.force_merge_gap {
        return true;
    }

    let combined_chars = group.text.chars().count() + next_text.chars().count();
    let fits = combined_chars < thresholds.max_chars;

    let continues = starts_with_conjunction(next_text) || ends_with_preposition(&group.text) || has_open_quote(&group.text);
    if continues && fits {
        return true;
    }

    gap <= thresholds.fallback_gap
        && fits
        && (next_words <= thresholds.short_words || word_count(&group.text) < thresholds.small_group_words)
}

/// Merge captions into sentence-level units.
///
/// Every input caption lands in exactly one output entry, in order.
pub fn merge_captions(captions: &[Caption], thresholds: &MergeThresholds) -> Vec<MergedCaption> {
    let mut merged = Vec::with_capacity(captions.len());
    let mut open: Option<Group<'_>> = None;

    for caption in captions {
        if let Some(group) = open.as_mut().filter(|g| should_merge(g, caption, thresholds)) {
            group.push(caption);
        } else if let Some(group) = open.replace(Group::open(caption)) {
            merged.push(group.finalize());
        }
    }
    if let Some(group) = open {
        merged.push(group.finalize());
    }

    debug!(input = captions.len(), output = merged.len(), "Merged captions");
    merged
}

/// Merger memoized on the identity of the caption snapshot.
#[derive(Default)]
pub struct SentenceMerger {
    thresholds: MergeThresholds,
    last: Mutex<Option<(Arc<[Caption]>, Arc<[MergedCaption]>)>>,
}

impl SentenceMerger {
    pub fn new(thresholds: MergeThresholds) -> Self {
        Self {
            thresholds,
            last: Mutex::new(None),
        }
    }

    pub fn thresholds(&self) -> &MergeThresholds {
        &self.thresholds
    }

    /// Merge a snapshot. The same `Arc` returns the previous result without
    /// recomputing; an equal but distinct snapshot is merged again.
    pub fn merge(&self, captions: &Arc<[Caption]>) -> Arc<[MergedCaption]> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((snapshot, merged)) = last.as_ref() {
            if Arc::ptr_eq(snapshot, captions) {
                return merged.clone();
            }
        }

        let merged: Arc<[MergedCaption]> = merge_captions(captions, &self.thresholds).into();
        *last = Some((captions.clone(), merged.clone()));
        merged
    }
}
