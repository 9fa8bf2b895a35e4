use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Position of a chunk inside its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Page(usize),
    Label(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub source: String,
    pub locator: Locator,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            source: source.into(),
            locator,
        }
    }

    /// File name of the source, without any leading directories.
    pub fn source_name(&self) -> &str {
        Path::new(&self.source)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.source)
    }

    pub fn matches_subject(&self, subject: &str) -> bool {
        self.source
            .to_lowercase()
            .contains(&subject.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub distance: f32,
}

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits `text` into pieces of at most `chunk_size` characters.
///
/// Break points prefer paragraph, then line, then word boundaries. Each piece
/// after the first starts up to `overlap` characters before the end of the
/// previous one, snapped forward to the start of a word when possible, so a
/// phrase cut at one boundary appears whole in at least one of the two pieces.
/// Pieces are trimmed and whitespace-only pieces are dropped.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 || text.trim().is_empty() {
        return Vec::new();
    }
    let overlap = overlap.min(chunk_size - 1);

    // bounds[i] is the byte offset of char i; the final entry is text.len().
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        let hard_end = (start + chunk_size).min(char_count);
        let end = if hard_end == char_count {
            hard_end
        } else {
            find_break(text, &bounds, start + overlap + 1, hard_end).unwrap_or(hard_end)
        };

        let piece = text[bounds[start]..bounds[end]].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        if end == char_count {
            break;
        }

        let raw_next = end.saturating_sub(overlap).max(start + 1);
        let mut next = raw_next;
        while next < end && !text[bounds[next - 1]..bounds[next]].trim().is_empty() {
            next += 1;
        }
        start = if next < end { next } else { raw_next };
    }

    pieces
}

/// Latest char index in `(min, max]` that directly follows a separator.
fn find_break(text: &str, bounds: &[usize], min: usize, max: usize) -> Option<usize> {
    if min >= max {
        return None;
    }
    let window = &text[bounds[min]..bounds[max]];
    SEPARATORS.iter().find_map(|sep| {
        window.rfind(sep).and_then(|pos| {
            let byte = bounds[min] + pos + sep.len();
            let idx = bounds.binary_search(&byte).ok()?;
            (idx > min).then_some(idx)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_split_text_short_input_is_single_piece() {
        let pieces = split_text("A short paragraph.", 700, 100);
        assert_eq!(pieces, vec!["A short paragraph.".to_string()]);
    }

    #[test]
    fn test_split_text_empty_and_blank() {
        assert!(split_text("", 700, 100).is_empty());
        assert!(split_text(" \n\n \t", 700, 100).is_empty());
    }

    #[test]
    fn test_split_text_respects_chunk_size() {
        let text = numbered_words(400);
        let pieces = split_text(&text, 100, 20);

        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.chars().count() <= 100, "piece too long: {piece}");
        }
    }

    #[test]
    fn test_split_text_consecutive_pieces_overlap() {
        let text = numbered_words(400);
        let pieces = split_text(&text, 100, 20);

        for pair in pieces.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(
                pair[0].split_whitespace().any(|w| w == first_word),
                "{first_word} missing from previous piece"
            );
        }
    }

    #[test]
    fn test_split_text_covers_every_word() {
        let text = numbered_words(250);
        let pieces = split_text(&text, 80, 15);

        for i in 0..250 {
            let word = format!("w{i}");
            assert!(pieces
                .iter()
                .any(|p| p.split_whitespace().any(|w| w == word)));
        }
    }

    #[test]
    fn test_split_text_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(30), "b".repeat(30));
        let pieces = split_text(&text, 50, 5);

        assert_eq!(pieces[0], "a".repeat(30));
        assert!(pieces.last().unwrap().ends_with(&"b".repeat(30)));
    }

    #[test]
    fn test_split_text_handles_multibyte_chars() {
        let text = "é".repeat(250);
        let pieces = split_text(&text, 100, 10);

        assert!(pieces.len() >= 3);
        assert!(pieces.iter().all(|p| p.chars().count() <= 100));
    }

    #[test]
    fn test_matches_subject_is_case_insensitive() {
        let chunk = Chunk::new("x", "corpus/Maths_ch4.pdf", Locator::Page(3));
        assert!(chunk.matches_subject("maths"));
        assert!(chunk.matches_subject("MATHS"));
        assert!(!chunk.matches_subject("physics"));
        assert_eq!(chunk.source_name(), "Maths_ch4.pdf");
    }

    #[test]
    fn test_locator_serializes_untagged() {
        let page = serde_json::to_string(&Locator::Page(4)).unwrap();
        let label = serde_json::to_string(&Locator::Label("intro".into())).unwrap();
        assert_eq!(page, "4");
        assert_eq!(label, "\"intro\"");
        let back: Locator = serde_json::from_str(&page).unwrap();
        assert_eq!(back, Locator::Page(4));
    }
}
