//! Untyped syntax tree handed over by the parser
//!
//! The checker never sees source text. Everything it knows about positions
//! comes from the [`Span`] attached to each node.

pub mod ast;
pub mod build;

use serde::{Deserialize, Serialize};

/// Source location of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn merge(&self, other: &Span) -> Span {
        let (line, column) = if (self.line, self.column) <= (other.line, other.column) {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }
}

pub use ast::*;

/// A parsed file and the name diagnostics refer to it by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub top_level: FileTopLevel,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, top_level: FileTopLevel) -> Self {
        Self {
            name: name.into(),
            top_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_keeps_earliest_position() {
        let a = Span::new(10, 14, 2, 3);
        let b = Span::new(2, 6, 1, 9);
        let merged = a.merge(&b);
        assert_eq!(merged.start, 2);
        assert_eq!(merged.end, 14);
        assert_eq!((merged.line, merged.column), (1, 9));
        assert_eq!(merged.len(), 12);
    }

    #[test]
    fn test_span_roundtrips_through_json() {
        let span = Span::new(1, 4, 1, 2);
        let json = serde_json::to_string(&span).unwrap();
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(span, back);
    }
}
