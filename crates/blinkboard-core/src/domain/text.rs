//! Typed output text and greedy word wrapping.

/// Append-only text typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputText {
    text: String,
}

impl OutputText {
    /// Empty text.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    /// Appends one character.
    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Text typed so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether nothing has been typed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Wraps `text` into lines of at most `width` characters.
///
/// Lines break at whitespace. Whitespace inside a line is kept as one space
/// per character; whitespace at a line break is dropped. A word longer than
/// `width` stays whole on its own line unless `break_long_words` is set, in
/// which case it is split into `width`-sized pieces.
#[must_use]
pub fn wrap(text: &str, width: usize, break_long_words: bool) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;
    let mut gap = 0usize;

    for (is_space, chunk) in chunks(text) {
        if is_space {
            if line_len > 0 {
                gap += chunk.chars().count();
            }
            continue;
        }

        let mut word = chunk;
        let mut word_len = word.chars().count();
        let pending = std::mem::take(&mut gap);

        if line_len > 0 && line_len + pending + word_len <= width {
            line.extend(std::iter::repeat(' ').take(pending));
            line.push_str(word);
            line_len += pending + word_len;
            continue;
        }

        if line_len > 0 {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }

        if break_long_words {
            while word_len > width {
                let split = word
                    .char_indices()
                    .nth(width)
                    .map_or(word.len(), |(i, _)| i);
                lines.push(word[..split].to_string());
                word = &word[split..];
                word_len -= width;
            }
        }

        line.push_str(word);
        line_len = word_len;
    }

    if line_len > 0 {
        lines.push(line);
    }

    lines
}

/// Splits `text` into alternating runs of whitespace and non-whitespace,
/// tagging each run with whether it is whitespace.
fn chunks(text: &str) -> impl Iterator<Item = (bool, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|&(_, c)| c.is_whitespace() != is_space)
            .map_or(rest.len(), |(i, _)| i);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some((is_space, chunk))
    })
}
