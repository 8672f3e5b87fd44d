//! Text chunking for speech synthesis
//!
//! Synthesis engines cope badly with long inputs, so replies are split into
//! bounded chunks and spoken one after another. Splits prefer sentence
//! ends, then clause punctuation, then whitespace. A word is never cut: a
//! single word longer than the limit becomes its own chunk.

/// Default chunk size limit, in characters
pub const DEFAULT_CHUNK_CHARS: usize = 200;

/// Boundary kinds, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Sentence,
    Clause,
    Word,
}

impl Boundary {
    const fn finer(self) -> Option<Self> {
        match self {
            Self::Sentence => Some(Self::Clause),
            Self::Clause => Some(Self::Word),
            Self::Word => None,
        }
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// When `max_chars` is 0, [`DEFAULT_CHUNK_CHARS`] is used. Runs of
/// whitespace are collapsed. Every returned chunk is non-empty.
#[must_use]
pub fn chunk_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = if max_chars == 0 {
        DEFAULT_CHUNK_CHARS
    } else {
        max_chars
    };

    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }

    if normalized.chars().count() <= max_chars {
        return vec![normalized];
    }

    let segments = split_at(&normalized, Boundary::Sentence);
    assemble(&segments, max_chars, Boundary::Sentence)
}

fn split_at(text: &str, boundary: Boundary) -> Vec<&str> {
    match boundary {
        Boundary::Sentence => split_after_marks(text, &['.', '!', '?']),
        Boundary::Clause => split_after_marks(text, &[',', ';', ':']),
        Boundary::Word => text.split_whitespace().collect(),
    }
}

/// Split after any of `marks` when followed by whitespace.
///
/// The mark stays attached to the preceding segment.
fn split_after_marks<'a>(text: &'a str, marks: &[char]) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let at_boundary =
            marks.contains(&c) && chars.peek().is_some_and(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            push_segment(&mut segments, &text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        push_segment(&mut segments, &text[start..]);
    }

    segments
}

fn push_segment<'a>(segments: &mut Vec<&'a str>, segment: &'a str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed);
    }
}

/// Pack segments into chunks that fit within `limit`.
///
/// A segment that alone exceeds the limit is re-split at the next finer
/// boundary.
fn assemble(segments: &[&str], limit: usize, boundary: Boundary) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for &segment in segments {
        let segment_len = segment.chars().count();

        if segment_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            match boundary.finer() {
                Some(finer) => chunks.extend(assemble(&split_at(segment, finer), limit, finer)),
                None => chunks.push(segment.to_string()),
            }
            continue;
        }

        let needed = if current.is_empty() {
            segment_len
        } else {
            current_len + 1 + segment_len
        };

        if needed > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(segment);
        current_len += segment_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(chunk_for_speech("", 50).is_empty());
        assert!(chunk_for_speech("   \n ", 50).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_for_speech("Halo  semua!", 50), vec!["Halo semua!"]);
    }

    #[test]
    fn zero_limit_uses_default() {
        let text = "kata ".repeat(30);
        let chunks = chunk_for_speech(&text, 0);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn prefers_sentence_boundaries() {
        let text = "Kamera satu aktif. Kamera dua aktif. Kamera tiga sedang maintenance.";
        let chunks = chunk_for_speech(text, 40);
        assert_eq!(
            chunks,
            vec![
                "Kamera satu aktif. Kamera dua aktif.",
                "Kamera tiga sedang maintenance."
            ]
        );
    }

    #[test]
    fn falls_back_to_clauses() {
        let text = "Untuk akses rekaman, silakan login ke web interface, lalu pilih kamera.";
        let chunks = chunk_for_speech(text, 30);
        assert!(chunks.iter().all(|c| c.chars().count() <= 30), "{chunks:?}");
        assert_eq!(chunks[0], "Untuk akses rekaman,");
    }

    #[test]
    fn never_splits_words() {
        let text = "Sistem CCTV memantau area parkir utara dan selatan serta lobby \
                    dengan resolusi penuh sepanjang hari tanpa henti";
        let chunks = chunk_for_speech(text, 25);
        assert!(chunks.iter().all(|c| c.chars().count() <= 25), "{chunks:?}");
        let rejoined = chunks.join(" ");
        assert_eq!(words(&rejoined), words(text));
    }

    #[test]
    fn overlong_word_stays_whole() {
        let long = "x".repeat(40);
        let text = format!("awal {long} akhir");
        let chunks = chunk_for_speech(&text, 10);
        assert_eq!(chunks, vec!["awal".to_string(), long, "akhir".to_string()]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Each emoji is four bytes but one character
        let text = "😀 ".repeat(10);
        let chunks = chunk_for_speech(&text, 19);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn decimal_points_do_not_split() {
        let segments = split_after_marks("Storage 6.8TB terpakai. Sisa 3.2TB.", &['.', '!', '?']);
        assert_eq!(segments, vec!["Storage 6.8TB terpakai.", "Sisa 3.2TB."]);
    }
}
