use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ast::{ListNumberDelim, ListNumberStyle};
use crate::span::Span;

/// Error kinds for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Unrecognized character sequence in the tokenizer.
    Lexical,
    /// Token sequence that violates the grammar.
    Syntax,
    /// Ordered list marker style/delimiter mismatch.
    Semantic,
    /// Any other failure while building the document tree.
    Internal,
}

/// A located error record.
///
/// `line` and `column` are 0-based. `start_index`/`end_index` are byte
/// offsets into the source, usable directly for text-range highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub start_index: u32,
    pub end_index: u32,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// The unlocated diagnostic the facade produces for a failed tree build.
    pub fn from_compile_error(error: &CompileError) -> Self {
        Self {
            line: 0,
            column: 0,
            start_index: 0,
            end_index: 0,
            message: format!("Compiler Error: {error}"),
            kind: error.kind(),
        }
    }

    /// Byte range covered by this diagnostic.
    pub fn span(&self) -> Span {
        Span::new(self.start_index, self.end_index)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Where a reported problem sits in the source.
///
/// Resolution falls back in order: the offending token's span, a one-byte
/// span just past the last real token, a one-byte span at the lexer cursor,
/// and finally `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Span of the offending token.
    Token(Span),
    /// No offending token; the last real token consumed, if any.
    AfterToken(Option<Span>),
    /// No token at all; the lexer's current byte offset.
    Cursor(u32),
    /// Nothing to anchor on.
    Unknown,
}

impl Location {
    fn resolve(self) -> Span {
        match self {
            Location::Token(span) => span,
            Location::AfterToken(Some(span)) => Span::point(span.end),
            Location::AfterToken(None) | Location::Unknown => Span::new(0, 1),
            Location::Cursor(offset) => Span::point(offset),
        }
    }
}

/// Collector for diagnostics reported while tokenizing and parsing.
///
/// Diagnostics are kept in report order; use [`Diagnostics::sorted_by_position`]
/// when position order is needed.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a problem, deriving its byte range from `location`.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        line: u32,
        column: u32,
        location: Location,
        message: impl Into<String>,
    ) {
        let span = location.resolve();
        self.items.push(Diagnostic {
            line,
            column,
            start_index: span.start,
            end_index: span.end,
            message: message.into(),
            kind,
        });
    }

    /// Add an already built diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// True iff at least one diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Copy of the diagnostics ordered by start offset, then line and column.
    pub fn sorted_by_position(&self) -> Vec<Diagnostic> {
        let mut sorted = self.items.clone();
        sorted.sort_by_key(|d| (d.start_index, d.line, d.column));
        sorted
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Fatal failures while turning a parse tree into a document.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(
        "list marker mismatch: expected {expected_style:?}/{expected_delim:?}, found {found_style:?}/{found_delim:?}"
    )]
    ListMarkerMismatch {
        expected_style: ListNumberStyle,
        expected_delim: ListNumberDelim,
        found_style: ListNumberStyle,
        found_delim: ListNumberDelim,
    },
    #[error("unrecognized list marker '{0}'")]
    InvalidListMarker(String),
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CompileError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            CompileError::ListMarkerMismatch { .. } => DiagnosticKind::Semantic,
            CompileError::InvalidListMarker(_) | CompileError::Serialize(_) => {
                DiagnosticKind::Internal
            }
        }
    }
}
