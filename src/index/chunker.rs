//! Recursive character chunking.
//!
//! Documents split along a separator hierarchy (paragraph, line, word,
//! character), merging pieces back into chunks of at most `chunk_size`
//! characters with `chunk_overlap` characters carried between consecutive
//! chunks. Lengths are measured in characters, not bytes, so multi-byte
//! text never splits mid-codepoint.

/// Separator hierarchy, coarsest first. The empty separator means
/// character-level splitting and always matches.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Creates a chunker. `chunk_overlap` is clamped below `chunk_size`.
    #[must_use]
    pub const fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_overlap = if chunk_overlap >= chunk_size {
            chunk_size / 2
        } else {
            chunk_overlap
        };
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Splits `text` into chunks of at most `chunk_size` characters.
    ///
    /// Whitespace-only pieces are dropped; the output never contains an
    /// empty chunk.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let (separator, rest) = pick_separator(text, separators);
        let pieces = split_on(text, separator);

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) <= self.chunk_size {
                pending.push(piece);
            } else {
                if !pending.is_empty() {
                    chunks.extend(self.merge(&pending, separator));
                    pending.clear();
                }
                // A piece still too large for the budget recurses onto the
                // next, finer separator.
                if rest.is_empty() {
                    chunks.push(piece);
                } else {
                    chunks.extend(self.split_recursive(&piece, rest));
                }
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }

        chunks
    }

    /// Greedily merges small pieces into chunks within the size budget,
    /// carrying an overlap tail from each chunk into the next.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: Vec<String> = Vec::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            let joined = if window.is_empty() { 0 } else { sep_len };

            if window_len + joined + piece_len > self.chunk_size && !window.is_empty() {
                chunks.push(window.join(separator));

                // Drop leading pieces until the carried tail fits the overlap.
                while window_len > self.chunk_overlap
                    || (window_len + joined + piece_len > self.chunk_size && !window.is_empty())
                {
                    let removed = window.remove(0);
                    window_len -= char_len(&removed);
                    if !window.is_empty() {
                        window_len -= sep_len;
                    }
                    if window.is_empty() {
                        window_len = 0;
                        break;
                    }
                }
            }

            if !window.is_empty() {
                window_len += sep_len;
            }
            window.push(piece.clone());
            window_len += piece_len;
        }

        if !window.is_empty() {
            chunks.push(window.join(separator));
        }

        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Picks the first separator present in `text`; the empty separator is the
/// terminal fallback.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Splits on a separator, or into single characters for the empty separator.
fn split_on(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(String::from).collect()
    }
}
