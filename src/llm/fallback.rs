//! Local fallback replies used when the language model is unavailable

use rand::seq::SliceRandom;

/// Coarse intent of an utterance, used only to pick a fallback reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCategory {
    Greeting,
    Help,
    Technical,
    Generic,
}

/// Keyword table, checked top to bottom
const CATEGORY_KEYWORDS: &[(FallbackCategory, &[&str])] = &[
    (FallbackCategory::Greeting, &["halo", "hai", "hello", "selamat"]),
    (FallbackCategory::Help, &["bantuan", "help", "tolong", "bisa"]),
    (FallbackCategory::Technical, &["code", "programming", "technical", "api"]),
];

/// Prepended when a reply is served because the model just failed
pub const OFFLINE_NOTICE: &str = "⚠️ Status koneksi: 🌐 Masalah koneksi internet. Silakan periksa koneksi Anda dan coba lagi. Saya akan menggunakan respons fallback untuk membantu Anda.\n\n";

impl FallbackCategory {
    /// Categorize an utterance by keyword
    #[must_use]
    pub fn classify(utterance: &str) -> Self {
        let lower = utterance.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map_or(Self::Generic, |(category, _)| *category)
    }

    /// Candidate replies for this category
    #[must_use]
    pub const fn replies(self) -> &'static [&'static str] {
        match self {
            Self::Greeting => &[
                "Halo! Saya asisten CCTV yang siap membantu Anda. Meskipun sedang dalam mode offline, saya tetap dapat memberikan bantuan dasar.",
                "Selamat datang! Saat ini saya dalam mode offline, tetapi saya akan berusaha membantu semampu saya.",
                "Hai! Senang bertemu dengan Anda. Koneksi sedang bermasalah, namun saya tetap siap membantu.",
            ],
            Self::Help => &[
                "Saya dapat membantu pertanyaan umum seputar sistem CCTV. Meskipun sedang offline, saya akan mencoba memberikan jawaban yang berguna.",
                "Dalam mode offline ini, saya dapat memberikan informasi dasar seperti lokasi kamera, jam operasional, dan kontak darurat.",
                "Saya siap membantu pertanyaan dasar. Ketika koneksi kembali normal, saya dapat memberikan jawaban yang lebih lengkap.",
            ],
            Self::Technical => &[
                "Untuk pertanyaan teknis yang kompleks, saya memerlukan koneksi ke server AI. Silakan coba lagi ketika koneksi stabil.",
                "Pertanyaan teknis memerlukan akses ke basis pengetahuan yang lebih lengkap. Silakan coba lagi dalam beberapa saat.",
            ],
            Self::Generic => &[
                "Maaf, saat ini saya mengalami masalah koneksi dengan server AI. Silakan coba lagi dalam beberapa saat.",
                "Saya sedang dalam mode offline. Untuk jawaban yang lebih akurat, silakan coba lagi ketika koneksi internet stabil.",
                "Koneksi ke AI sedang bermasalah. Untuk jawaban yang lebih baik, silakan coba lagi nanti.",
            ],
        }
    }
}

/// Pick a fallback reply for `utterance`
///
/// With `with_notice`, the reply is prefixed by [`OFFLINE_NOTICE`].
#[must_use]
pub fn fallback_reply(utterance: &str, with_notice: bool) -> String {
    let replies = FallbackCategory::classify(utterance).replies();
    let reply = replies
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default();

    if with_notice {
        format!("{OFFLINE_NOTICE}{reply}")
    } else {
        reply.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_matching_row() {
        assert_eq!(FallbackCategory::classify("Halo, apa kabar?"), FallbackCategory::Greeting);
        assert_eq!(FallbackCategory::classify("TOLONG saya"), FallbackCategory::Help);
        assert_eq!(FallbackCategory::classify("api key error"), FallbackCategory::Technical);
        assert_eq!(FallbackCategory::classify("test"), FallbackCategory::Generic);
        // Greeting row is checked before help
        assert_eq!(FallbackCategory::classify("halo, bisa bantu?"), FallbackCategory::Greeting);
    }

    #[test]
    fn reply_comes_from_category() {
        let reply = fallback_reply("hello", false);
        assert!(FallbackCategory::Greeting.replies().contains(&reply.as_str()));
    }

    #[test]
    fn notice_is_prefixed() {
        let reply = fallback_reply("test", true);
        assert!(reply.starts_with(OFFLINE_NOTICE));
        let body = reply.trim_start_matches(OFFLINE_NOTICE);
        assert!(FallbackCategory::Generic.replies().contains(&body));
    }

    #[test]
    fn every_category_has_replies() {
        for category in [
            FallbackCategory::Greeting,
            FallbackCategory::Help,
            FallbackCategory::Technical,
            FallbackCategory::Generic,
        ] {
            assert!(!category.replies().is_empty());
        }
    }
}
