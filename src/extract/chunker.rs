//! Splits oversized documents into bounded-size segments.

/// Character-bounded text chunker with no shared state.
///
/// Segments are at most `max_chars` long and prefer to break at word
/// boundaries near the end of a segment. Output is deterministic for a
/// given input, which batch extraction relies on for reproducible
/// per-chunk error ordering.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chars: usize,
}

impl TextChunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// Split text into segments of at most `max_chars` characters.
    ///
    /// All slicing happens at UTF-8 character boundaries; multi-byte
    /// characters are never split.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if text.len() <= self.max_chars {
            return vec![text.trim().to_string()];
        }

        let find_char_boundary = |byte_pos: usize| -> usize {
            if byte_pos >= text.len() {
                return text.len();
            }
            if text.is_char_boundary(byte_pos) {
                return byte_pos;
            }
            for i in (0..byte_pos).rev() {
                if text.is_char_boundary(i) {
                    return i;
                }
            }
            0
        };

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            start = find_char_boundary(start);
            let end = find_char_boundary((start + self.max_chars).min(text.len()));

            // Prefer a whitespace/sentence break within the last 20% of the segment
            let cut = if end < text.len() {
                let search_start = find_char_boundary(end.saturating_sub(self.max_chars / 5));
                match text.get(search_start..end).and_then(|window| {
                    window
                        .char_indices()
                        .rev()
                        .find(|(_, c)| c.is_whitespace() || matches!(c, '.' | '!' | '?'))
                        .map(|(offset, c)| search_start + offset + c.len_utf8())
                }) {
                    Some(boundary) => find_char_boundary(boundary),
                    None => end,
                }
            } else {
                end
            };

            // Always advance by at least one full character, even when
            // max_chars is smaller than the character at `start`.
            let mut cut = if cut > start { cut } else { end };
            if cut <= start {
                cut = text[start..]
                    .chars()
                    .next()
                    .map(|c| start + c.len_utf8())
                    .unwrap_or(text.len());
            }
            if let Some(segment) = text.get(start..cut) {
                let trimmed = segment.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            }

            if cut >= text.len() {
                break;
            }
            start = cut;
        }

        chunks
    }
}
