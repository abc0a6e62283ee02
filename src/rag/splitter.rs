//! Recursive character splitter.
//!
//! Tries paragraph, line and word boundaries in that order before falling
//! back to single characters. Sizes are counted in characters.

use std::collections::VecDeque;

use super::loader::Page;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A chunk cut from one page of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub page: u32,
    /// Position of the chunk within the whole document.
    pub chunk_index: usize,
}

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits every page and numbers the chunks across the whole document.
    pub fn split_pages(&self, pages: &[Page]) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for text in self.split_text(&page.text) {
                chunks.push(TextChunk {
                    text,
                    page: page.number,
                    chunk_index: chunks.len(),
                });
            }
        }
        chunks
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut final_chunks = Vec::new();
        let (separator, remaining) = pick_separator(text, separators);

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(idx, ch)| &text[idx..idx + ch.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|piece| !piece.is_empty()).collect()
        };

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in splits {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(piece.trim().to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }

        final_chunks.retain(|chunk| !chunk.is_empty());
        final_chunks
    }

    /// Greedily packs pieces up to `chunk_size`, carrying up to
    /// `chunk_overlap` trailing characters into the next chunk.
    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current, separator) {
                    docs.push(doc);
                }

                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    let joiner = if current.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(char_len(front) + joiner);
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_trimmed(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn pick_separator<'a, 'b>(text: &str, separators: &'b [&'a str]) -> (&'a str, &'b [&'a str]) {
    for (idx, separator) in separators.iter().copied().enumerate() {
        if separator.is_empty() {
            return (separator, &[]);
        }
        if text.contains(separator) {
            return (separator, &separators[idx + 1..]);
        }
    }
    ("", &[])
}

fn join_trimmed(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("p{:03}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn chunks_never_exceed_chunk_size() {
        let splitter = RecursiveSplitter::new(100, 30);
        let text = format!(
            "{}\n\n{}\n{}",
            numbered_words(120),
            "x".repeat(450),
            numbered_words(40)
        );

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 3);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 100, "chunk too long: {}", char_len(chunk));
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let splitter = RecursiveSplitter::new(100, 30);
        let chunks = splitter.split_text(&numbered_words(200));
        assert!(chunks.len() >= 2);

        for pair in chunks.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            let tail_start = pair[0].len().saturating_sub(30);
            assert!(
                pair[0][tail_start..].contains(first_word),
                "'{}' not carried over from '{}'",
                first_word,
                pair[0]
            );
        }
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = RecursiveSplitter::new(1500, 200);
        let chunks = splitter.split_text("  Objetivo estratégico: agua potable.  ");
        assert_eq!(chunks, vec!["Objetivo estratégico: agua potable."]);
    }

    #[test]
    fn blank_text_yields_nothing() {
        let splitter = RecursiveSplitter::new(1500, 200);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n \n ").is_empty());
    }

    #[test]
    fn paragraph_boundaries_are_preferred() {
        let splitter = RecursiveSplitter::new(60, 0);
        let first = "Primer párrafo sobre el diagnóstico cantonal.";
        let second = "Segundo párrafo sobre la propuesta territorial.";
        let chunks = splitter.split_text(&format!("{}\n\n{}", first, second));
        assert_eq!(chunks, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn multibyte_text_is_counted_in_characters() {
        let splitter = RecursiveSplitter::new(10, 2);
        let chunks = splitter.split_text(&"ñ".repeat(35));
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 10));
        assert_eq!(chunks.iter().map(|c| c.chars().count()).max(), Some(10));
    }

    #[test]
    fn split_pages_keeps_page_numbers_and_global_index() {
        let splitter = RecursiveSplitter::new(20, 0);
        let pages = vec![
            Page { number: 3, text: "uno dos tres cuatro cinco seis".to_string() },
            Page { number: 4, text: "siete".to_string() },
        ];

        let chunks = splitter.split_pages(&pages);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().take(chunks.len() - 1).all(|c| c.page == 3));
        let last = chunks.last().unwrap();
        assert_eq!(last.page, 4);
        assert_eq!(last.text, "siete");
        let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let splitter = RecursiveSplitter::new(10, 50);
        assert_eq!(splitter.chunk_overlap(), 9);
        assert_eq!(splitter.chunk_size(), 10);
    }
}
