//! Bilingual alignment of independently decoded tracks.

use tracing::debug;

use capsync_models::Caption;

/// Attach target-language text to source captions by array index.
///
/// `source[i]` receives `target[i].text`. No timing comparison is made, so
/// tracks that segment differently pair up imperfectly; that is accepted
/// degraded output rather than an error. Blank target text leaves the
/// translation unset.
pub fn align_by_index(source: Vec<Caption>, target: &[Caption]) -> Vec<Caption> {
    if !target.is_empty() && source.len() != target.len() {
        debug!(
            source_len = source.len(),
            target_len = target.len(),
            "Caption tracks differ in length, pairing by index"
        );
    }

    source
        .into_iter()
        .enumerate()
        .map(|(index, mut caption)| {
            caption.translation = target
                .get(index)
                .map(|t| t.text.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            caption
        })
        .collect()
}
