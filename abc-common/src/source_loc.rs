//! Source location tracking for error reporting
//!
//! This module provides types for tracking locations in source files,
//! which is essential for good error messages and caret-underlined
//! source excerpts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Create a location with filename
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Create a dummy location for testing
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }

    pub fn new_simple(line: u32, column: u32) -> Self {
        Self {
            filename: "<input>".to_string(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A span in a source file (from start to end location, end inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Create a span from a single location
    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    /// Span on a single line of `<input>`, columns `first..=last`
    pub fn on_line(line: u32, first: u32, last: u32) -> Self {
        Self::new(
            SourceLocation::new_simple(line, first),
            SourceLocation::new_simple(line, last),
        )
    }

    /// Create a dummy span for testing
    pub fn dummy() -> Self {
        Self::from_location(SourceLocation::dummy())
    }

    pub fn is_dummy(&self) -> bool {
        self.start.line == 0
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.filename != self.end.filename {
            write!(f, "{} to {}", self.start, self.end)
        } else if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}:{}:{}", self.start.filename, self.start.line, self.start.column)
            } else {
                write!(
                    f,
                    "{}:{}:{}-{}",
                    self.start.filename, self.start.line, self.start.column, self.end.column
                )
            }
        } else {
            write!(
                f,
                "{}:{}:{}-{}:{}",
                self.start.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

/// Trait for types that have a source location
pub trait HasSpan {
    fn span(&self) -> &SourceSpan;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location() {
        let loc = SourceLocation::new("test.abc", 42, 10);
        assert_eq!(loc.filename, "test.abc");
        assert_eq!(loc.line, 42);
        assert_eq!(loc.column, 10);
        assert_eq!(format!("{}", loc), "test.abc:42:10");
    }

    #[test]
    fn test_source_span_same_line() {
        let start = SourceLocation::new("test.abc", 1, 5);
        let end = SourceLocation::new("test.abc", 1, 10);
        let span = SourceSpan::new(start, end);

        assert_eq!(format!("{}", span), "test.abc:1:5-10");
    }

    #[test]
    fn test_source_span_different_lines() {
        let start = SourceLocation::new("test.abc", 1, 5);
        let end = SourceLocation::new("test.abc", 3, 10);
        let span = SourceSpan::new(start, end);

        assert_eq!(format!("{}", span), "test.abc:1:5-3:10");
    }

    #[test]
    fn test_single_point_span_keeps_column() {
        let span = SourceSpan::from_location(SourceLocation::new("a.abc", 7, 3));
        assert_eq!(span.to_string(), "a.abc:7:3");
        assert!(!span.is_dummy());
        assert!(SourceSpan::dummy().is_dummy());
    }
}
