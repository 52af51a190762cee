//! Splitting extracted text into LLM-sized pieces

/// Decides between a single LLM call and fixed-size chunks
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    /// Texts up to this many characters are sent whole
    single_shot_limit: usize,
    /// Maximum characters per chunk when splitting
    chunk_size: usize,
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self::new(100_000, 80_000)
    }
}

impl ChunkPlanner {
    /// Create a planner. A `chunk_size` of zero is treated as one.
    pub fn new(single_shot_limit: usize, chunk_size: usize) -> Self {
        Self {
            single_shot_limit,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Split `text` into contiguous, non-overlapping slices.
    ///
    /// Always returns at least one slice. Lengths are counted in chars, and
    /// slice boundaries always fall on char boundaries.
    pub fn plan<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let char_count = text.chars().count();
        if char_count <= self.single_shot_limit {
            return vec![text];
        }

        let mut chunks = Vec::with_capacity(char_count.div_ceil(self.chunk_size));
        let mut start = 0;
        let mut chars_in_chunk = 0;

        for (idx, _) in text.char_indices() {
            if chars_in_chunk == self.chunk_size {
                chunks.push(&text[start..idx]);
                start = idx;
                chars_in_chunk = 0;
            }
            chars_in_chunk += 1;
        }
        chunks.push(&text[start..]);

        chunks
    }

    /// Whether `text` would be split
    pub fn is_chunked(&self, text: &str) -> bool {
        text.chars().count() > self.single_shot_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let planner = ChunkPlanner::default();
        let text = "x".repeat(100_000);
        let chunks = planner.plan(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
        assert!(!planner.is_chunked(&text));
    }

    #[test]
    fn test_empty_text_is_single_chunk() {
        let chunks = ChunkPlanner::default().plan("");
        assert_eq!(chunks, vec![""]);
    }

    #[test]
    fn test_long_text_split_into_bounded_slices() {
        let planner = ChunkPlanner::default();
        let text: String = (0..250_001).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = planner.plan(&text);

        assert_eq!(chunks.len(), 4); // ceil(250001 / 80000)
        assert!(chunks.iter().all(|c| c.chars().count() <= 80_000));
        assert_eq!(chunks[0].chars().count(), 80_000);
        assert_eq!(chunks[3].chars().count(), 10_001);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let planner = ChunkPlanner::new(10, 5);
        let chunks = planner.plan("abcdefghijklmnopqrst");
        assert_eq!(chunks, vec!["abcde", "fghij", "klmno", "pqrst"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let planner = ChunkPlanner::new(4, 3);
        let text = "äöüßÄÖÜ";
        let chunks = planner.plan(text);
        assert_eq!(chunks, vec!["äöü", "ßÄÖ", "Ü"]);
        assert_eq!(chunks.concat(), text);

        // 4 multi-byte chars fit the single-shot limit even though they are 8 bytes
        assert_eq!(planner.plan("äöüß").len(), 1);
    }
}
