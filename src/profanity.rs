//! Profanity detection and masking
//!
//! Matching is substring based and case-insensitive. Word boundaries are
//! ignored, so "shell" is masked because it contains "hell", and spelling
//! tricks ("sh1t") pass through. Both behaviors are accepted limitations of a
//! plain denylist.

use regex::Regex;

/// Indonesian and English words rejected in user input
pub const DEFAULT_DENYLIST: &[&str] = &[
    // Indonesian
    "anjing", "bangsat", "babi", "kontol", "memek", "ngentot", "bajingan", "tolol", "bodoh",
    "goblok", "idiot", "sial", "brengsek", "kampret", "sialan", "pepek", "titit", "tai", "bangke",
    "jancuk", "kimak", "monyet", "asu", "njir", "kampung", "kampang",
    // English
    "fuck", "shit", "damn", "bitch", "asshole", "bastard", "crap", "hell", "piss", "cock", "dick",
    "pussy", "whore", "slut", "fag", "nigger",
];

/// Shown (and spoken) when a message is rejected
const WARNING_MESSAGE: &str =
    "Mohon gunakan bahasa yang sopan. Pesan Anda mengandung kata-kata yang tidak pantas.";

/// Character used to mask a denylisted word
const MASK: char = '*';

/// Denylist-based profanity filter
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    words: Vec<String>,
    patterns: Vec<(Regex, String)>,
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::with_words(DEFAULT_DENYLIST.iter().copied())
    }
}

impl ProfanityFilter {
    /// Create a filter using the built-in denylist
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter from a custom denylist
    ///
    /// Words are normalized to lowercase; empty entries are dropped.
    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let patterns = words
            .iter()
            .filter_map(|word| {
                let pattern = format!("(?i){}", regex::escape(word));
                match Regex::new(&pattern) {
                    Ok(re) => Some((re, MASK.to_string().repeat(word.chars().count()))),
                    Err(e) => {
                        tracing::warn!(word = %word, error = %e, "skipping denylist entry");
                        None
                    }
                }
            })
            .collect();

        Self { words, patterns }
    }

    /// Words this filter rejects
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Check whether `text` contains any denylisted word
    #[must_use]
    pub fn contains_profanity(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.words.iter().any(|w| lower.contains(w.as_str()))
    }

    /// Mask every denylisted occurrence with `*` of equal length
    ///
    /// Words are applied in denylist order, each over the output of the
    /// previous one.
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        self.patterns
            .iter()
            .fold(text.to_string(), |acc, (re, mask)| {
                re.replace_all(&acc, mask.as_str()).into_owned()
            })
    }

    /// Fixed warning for rejected messages
    #[must_use]
    pub const fn warning_message(&self) -> &'static str {
        WARNING_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_every_denylisted_word_in_any_casing() {
        let filter = ProfanityFilter::new();
        for word in DEFAULT_DENYLIST {
            let upper = word.to_uppercase();
            assert!(filter.contains_profanity(word), "{word}");
            assert!(filter.contains_profanity(&format!("dasar {upper}!")), "{upper}");
            assert!(filter.contains_profanity(&format!("(({word}))...")), "{word}");
        }
    }

    #[test]
    fn clean_input_passes() {
        let filter = ProfanityFilter::new();
        assert!(!filter.contains_profanity("Di mana lokasi kamera parkir?"));
        assert_eq!(
            filter.clean_text("Di mana lokasi kamera parkir?"),
            "Di mana lokasi kamera parkir?"
        );
    }

    #[test]
    fn clean_text_masks_and_preserves_length() {
        let filter = ProfanityFilter::new();
        let input = "What the FUCK, this is Shit and bodoh";
        let cleaned = filter.clean_text(input);

        assert_eq!(cleaned.chars().count(), input.chars().count());
        assert_eq!(cleaned, "What the ****, this is **** and *****");

        let lower = cleaned.to_lowercase();
        for word in DEFAULT_DENYLIST {
            assert!(!lower.contains(word), "{word} survived in {cleaned}");
        }
    }

    #[test]
    fn substring_matching_over_masks() {
        let filter = ProfanityFilter::new();
        // "hell" inside "shell" is masked: accepted limitation
        assert!(filter.contains_profanity("open a shell"));
        assert_eq!(filter.clean_text("open a shell"), "open a s****");
    }

    #[test]
    fn leetspeak_is_not_caught() {
        let filter = ProfanityFilter::new();
        assert!(!filter.contains_profanity("sh1t"));
    }

    #[test]
    fn custom_words_are_normalized() {
        let filter = ProfanityFilter::with_words(["  Kasar ", ""]);
        assert_eq!(filter.words(), &["kasar".to_string()]);
        assert!(filter.contains_profanity("KASAR sekali"));
        assert_eq!(filter.clean_text("KASAR sekali"), "***** sekali");
    }

    #[test]
    fn warning_is_fixed() {
        let filter = ProfanityFilter::new();
        assert!(filter.warning_message().starts_with("Mohon gunakan bahasa yang sopan"));
    }
}
