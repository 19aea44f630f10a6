//! Source location tracking for diagnostics.
//!
//! Provides [`Span`] to record where a node or an error occurs in source code.

use std::fmt;

use crate::ids::FileId;

/// A span of source code, represented by its file and starting position.
///
/// The checker never reads source text; spans are supplied by the parser and
/// carried through to diagnostics unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// File the span belongs to.
    pub file: FileId,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span in the default file from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self {
            file: FileId::default(),
            line,
            col,
            len,
        }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, 0)
    }

    /// Return the same position attributed to another file.
    #[inline]
    pub fn in_file(self, file: FileId) -> Self {
        Self { file, ..self }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Merge two spans into one that starts at the earlier column and covers both.
    ///
    /// Spans on different lines keep the first position and add lengths.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span {
                file: self.file,
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            Span {
                len: self.len + other.len,
                ..self
            }
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.index(), self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(1, 5, 10);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(Span::point(1, 5).is_empty());
    }

    #[test]
    fn span_display_omits_file() {
        let span = Span::new(3, 15, 5).in_file(FileId::new(2));
        assert_eq!(format!("{}", span), "3:15");
        assert_eq!(format!("{:?}", span), "2:3:15");
    }

    #[test]
    fn span_merge_same_line() {
        let merged = Span::new(1, 5, 3).merge(Span::new(1, 10, 3));
        assert_eq!(merged.col, 5);
        assert_eq!(merged.len, 8);
    }

    #[test]
    fn span_merge_keeps_file() {
        let file = FileId::new(4);
        let merged = Span::new(2, 1, 2).in_file(file).merge(Span::new(2, 4, 1));
        assert_eq!(merged.file, file);
    }

    #[test]
    fn span_merge_different_lines() {
        let merged = Span::new(1, 5, 10).merge(Span::new(3, 10, 5));
        assert_eq!(merged.line, 1);
        assert_eq!(merged.col, 5);
        assert_eq!(merged.len, 15);
    }
}
