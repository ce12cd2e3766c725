//! Source location tracking for tokens and diagnostics.
//!
//! Every token carries a `Span` indicating its byte range in the source text.
//! Diagnostics derive their `startIndex`/`endIndex` from these spans.

/// A byte range in the source text.
///
/// Spans use byte offsets (not character offsets) so editor tooling can
/// highlight the range directly. Ranges are half-open: `[start, end)`.
///
/// # Example
///
/// ```rust
/// use mymd_core::span::Span;
///
/// let span = Span::new(0, 10);
/// assert_eq!(span.len(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: u32,
    /// Ending byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A one-byte span starting at `offset`.
    #[inline]
    pub const fn point(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset + 1,
        }
    }

    /// Get the length of this span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_covers_one_byte() {
        let span = Span::point(7);
        assert_eq!(span, Span::new(7, 8));
        assert_eq!(span.len(), 1);
        assert!(!span.is_empty());
    }

    #[test]
    fn inverted_span_is_empty() {
        assert!(Span::new(5, 5).is_empty());
        assert_eq!(Span::new(6, 2).len(), 0);
    }
}
