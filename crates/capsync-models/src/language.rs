//! Language codes and the source/target pair used for bilingual playback.

use serde::{Deserialize, Serialize};

/// Return the lowercase primary subtag of a language code (`en-US` -> `en`).
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Source (spoken) language and target (translation) language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether a manifest language code satisfies the source language.
    pub fn is_source(&self, code: &str) -> bool {
        primary_subtag(code) == primary_subtag(&self.source)
    }

    /// Whether a manifest language code satisfies the target language.
    pub fn is_target(&self, code: &str) -> bool {
        primary_subtag(code) == primary_subtag(&self.target)
    }

    /// MyMemory-style `src|tgt` language pair.
    pub fn as_langpair(&self) -> String {
        format!("{}|{}", primary_subtag(&self.source), primary_subtag(&self.target))
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new("en", "ja")
    }
}
