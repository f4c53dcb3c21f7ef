//! Text chunking for knowledge-base indexing
//!
//! Splits website content into overlapping windows for embedding. Windows
//! prefer to end at a sentence boundary when one falls in the tail of the
//! window.

use crate::config::KbConfig;

/// A text chunk produced by the sliding window
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The chunk content
    pub content: String,
    /// Index of this chunk in the document
    pub index: i32,
}

/// Split text into overlapping chunks.
///
/// `chunk_size` and `chunk_overlap` are measured in characters; overlap
/// must be smaller than the window or the advance falls back to half a
/// window to guarantee progress.
pub fn chunk_text(text: &str, config: &KbConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();
    let mut chunks = Vec::new();

    if total_len == 0 || config.chunk_size == 0 {
        return chunks;
    }

    let advance = if config.chunk_overlap < config.chunk_size {
        config.chunk_size - config.chunk_overlap
    } else {
        (config.chunk_size / 2).max(1)
    };

    let mut start = 0;
    let mut index = 0;

    while start < total_len {
        let end = (start + config.chunk_size).min(total_len);
        let window: String = chars[start..end].iter().collect();

        let content = if end < total_len {
            trim_to_sentence_boundary(&window)
        } else {
            window
        };

        let content = content.trim().to_string();
        if !content.is_empty() {
            chunks.push(TextChunk { content, index });
            index += 1;
        }

        start += advance;
    }

    chunks
}

/// Cut the window at the last sentence ending in its final fifth, if any
fn trim_to_sentence_boundary(window: &str) -> String {
    const ENDINGS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let search_start = window
        .char_indices()
        .nth(window.chars().count() * 4 / 5)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let tail = &window[search_start..];

    for ending in ENDINGS {
        if let Some(pos) = tail.rfind(ending) {
            let cut = search_start + pos + ending.len();
            return window[..cut].to_string();
        }
    }

    window.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> KbConfig {
        KbConfig {
            default_top_k: 3,
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &config(100, 20)).is_empty());
        assert!(chunk_text("   ", &config(100, 20)).len() <= 1);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Our gym opens at 6am.", &config(100, 20));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Our gym opens at 6am.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_overlap_windows_cover_text() {
        let text = "Opening hours are six to ten. Memberships renew monthly. \
                    Trainers are available on weekdays. Classes need booking. \
                    The pool closes early on Sundays. Lockers require a coin."
            .to_string();
        let cfg = config(60, 20);
        let chunks = chunk_text(&text, &cfg);

        assert!(chunks.len() >= 3);
        // Sequential indices
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as i32);
            assert!(!chunk.content.is_empty());
        }
        // Last chunk reaches the end of the text
        let tail = chunks.last().unwrap();
        assert!(text.trim_end().ends_with(tail.content.trim_end()));
    }

    #[test]
    fn test_degenerate_overlap_still_advances() {
        // overlap >= chunk_size must not loop forever
        let text = "word ".repeat(100);
        let chunks = chunk_text(&text, &config(20, 40));
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_sentence_boundary_preferred() {
        let text = format!("{}First point. Second point starts here", "x".repeat(40));
        let cfg = config(55, 10);
        let chunks = chunk_text(&text, &cfg);
        // The first window ends just after "First point." rather than
        // mid-way through the following sentence
        assert!(chunks[0].content.ends_with("First point."));
    }
}
