//! Avatar expression from reply wording

use super::AvatarState;

/// Sentiment table, checked top to bottom
const MOOD_WORDS: &[(AvatarState, &[&str])] = &[
    (
        AvatarState::Happy,
        &["senang", "bagus", "hebat", "baik", "berhasil", "sukses"],
    ),
    (
        AvatarState::Sad,
        &["maaf", "tidak bisa", "gagal", "salah", "error", "masalah"],
    ),
];

/// Pick the avatar expression for a reply
///
/// Positive wording wins over negative; no match leaves the avatar idle.
#[must_use]
pub fn mood_for(reply: &str) -> AvatarState {
    let lower = reply.to_lowercase();
    MOOD_WORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map_or(AvatarState::Idle, |(mood, _)| *mood)
}
