//! Mutable line buffer over a values document
//!
//! Lines are split on `\n` only, so `\r`, trailing whitespace and a final
//! empty line after the last newline all survive a round trip unchanged.

/// Number of leading spaces and tabs in a line
pub fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(|c: char| c == ' ' || c == '\t').len()
}

/// Ordered, growable sequence of document lines
///
/// Indices are only stable between edits: an insertion shifts every
/// following line, so callers locate again after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Join the lines back into text with exactly one trailing newline
    pub fn into_text(self) -> String {
        let mut text = self.lines.join("\n");
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> &str {
        &self.lines[index]
    }

    pub fn indent(&self, index: usize) -> usize {
        indentation(&self.lines[index])
    }

    /// Line content with surrounding whitespace removed
    pub fn trimmed(&self, index: usize) -> &str {
        self.lines[index].trim()
    }

    pub fn is_blank(&self, index: usize) -> bool {
        self.trimmed(index).is_empty()
    }

    /// Iterate `(index, line)` pairs starting at `start`
    pub fn lines_from(&self, start: usize) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, line)| (i, line.as_str()))
    }

    pub fn replace(&mut self, index: usize, line: String) {
        self.lines[index] = line;
    }

    /// Insert `lines` so that the first one ends up at `position`
    pub fn insert_lines(&mut self, position: usize, lines: Vec<String>) {
        let position = position.min(self.lines.len());
        self.lines.splice(position..position, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation_counts_spaces_and_tabs() {
        assert_eq!(indentation("key: value"), 0);
        assert_eq!(indentation("    key: value"), 4);
        assert_eq!(indentation("\t  key"), 3);
        assert_eq!(indentation("   "), 3);
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        let text = "a: 1  \n# comment\r\n\n  b: &anchor\n    <<: *base\n";
        assert_eq!(LineBuffer::from_text(text).into_text(), text);
    }

    #[test]
    fn test_into_text_appends_single_newline() {
        assert_eq!(LineBuffer::from_text("a: 1").into_text(), "a: 1\n");
        assert_eq!(LineBuffer::from_text("a: 1\n").into_text(), "a: 1\n");
    }

    #[test]
    fn test_insert_lines_shifts_following_lines() {
        let mut buffer = LineBuffer::from_text("a\nd");
        buffer.insert_lines(1, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.line(3), "d");

        buffer.insert_lines(99, vec!["e".to_string()]);
        assert_eq!(buffer.line(4), "e");
    }
}
