//! Ordered list marker classification.
//!
//! Marker text such as `3.`, `b)`, `(iv)` or `+` is classified into a
//! numbering style, a delimiter and a start value. Single letters are
//! inherently ambiguous (`i` is both the ninth letter and roman one), so
//! classification is a best-effort heuristic and [`ListMarker::is_compatible_with`]
//! tolerates the alpha/roman confusion it can produce.

use crate::ast::{ListAttributes, ListNumberDelim, ListNumberStyle};
use crate::error::CompileError;

/// Result of classifying a single marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedMarker {
    /// `+`: inherits whatever the list already uses.
    Continuation,
    Marker(ListMarker),
}

/// A classified ordered list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    pub style: ListNumberStyle,
    pub delim: ListNumberDelim,
    pub start_number: i64,
    /// The marker body was exactly one letter.
    pub single_letter: bool,
}

impl ListMarker {
    /// Classify marker text; surrounding whitespace is ignored.
    ///
    /// Returns `None` when the text is not of the form
    /// `"("? alnum+ ("." | ")")?` or starts with a digit but is not all digits.
    pub fn parse(text: &str) -> Option<ParsedMarker> {
        let text = text.trim();
        if text == "+" {
            return Some(ParsedMarker::Continuation);
        }

        let (open_paren, rest) = match text.strip_prefix('(') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (body, suffix) = match rest.as_bytes().last() {
            Some(b'.') => (&rest[..rest.len() - 1], Some('.')),
            Some(b')') => (&rest[..rest.len() - 1], Some(')')),
            _ => (rest, None),
        };
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }

        let delim = match (open_paren, suffix) {
            (true, Some(')')) => ListNumberDelim::TwoParens,
            (_, Some(')')) => ListNumberDelim::OneParen,
            _ => ListNumberDelim::Period,
        };

        let first = body.as_bytes()[0];
        let upper = first.is_ascii_uppercase();
        let single_letter = body.len() == 1 && first.is_ascii_alphabetic();

        let (style, start_number) = if first.is_ascii_digit() {
            (ListNumberStyle::Decimal, body.parse::<i64>().ok()?)
        } else if body.bytes().all(is_roman_letter)
            && (body.len() > 1 || matches!(first.to_ascii_lowercase(), b'i' | b'v' | b'x'))
        {
            let style = if upper {
                ListNumberStyle::UpperRoman
            } else {
                ListNumberStyle::LowerRoman
            };
            (style, roman_value(body))
        } else {
            let style = if upper {
                ListNumberStyle::UpperAlpha
            } else {
                ListNumberStyle::LowerAlpha
            };
            (style, alpha_value(first))
        };

        Some(ParsedMarker::Marker(ListMarker {
            style,
            delim,
            start_number,
            single_letter,
        }))
    }

    /// Whether `other` may appear in the same list as `self`.
    ///
    /// Delimiters must match exactly. Styles must match, except that a
    /// same-case alpha/roman pair is accepted when the alpha marker is a
    /// single letter.
    pub fn is_compatible_with(&self, other: &ListMarker) -> bool {
        if self.delim != other.delim {
            return false;
        }
        if self.style == other.style {
            return true;
        }
        let alpha = match (self.style, other.style) {
            (ListNumberStyle::LowerAlpha, ListNumberStyle::LowerRoman)
            | (ListNumberStyle::UpperAlpha, ListNumberStyle::UpperRoman) => self,
            (ListNumberStyle::LowerRoman, ListNumberStyle::LowerAlpha)
            | (ListNumberStyle::UpperRoman, ListNumberStyle::UpperAlpha) => other,
            _ => return false,
        };
        alpha.single_letter
    }

    pub fn attributes(&self) -> ListAttributes {
        ListAttributes {
            start: self.start_number,
            style: self.style,
            delim: self.delim,
        }
    }
}

/// Resolve the attributes of one ordered list from its item markers.
///
/// The first non-continuation marker fixes the list's style and delimiter;
/// every later one must be compatible with it. A list made only of `+`
/// markers numbers from 1 with decimal/period markers.
pub fn resolve_list<'a, I>(markers: I) -> Result<ListAttributes, CompileError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first: Option<ListMarker> = None;
    for text in markers {
        let marker = match ListMarker::parse(text) {
            Some(ParsedMarker::Continuation) => continue,
            Some(ParsedMarker::Marker(marker)) => marker,
            None => return Err(CompileError::InvalidListMarker(text.trim().to_string())),
        };
        match first {
            None => first = Some(marker),
            Some(expected) if !expected.is_compatible_with(&marker) => {
                return Err(CompileError::ListMarkerMismatch {
                    expected_style: expected.style,
                    expected_delim: expected.delim,
                    found_style: marker.style,
                    found_delim: marker.delim,
                });
            }
            Some(_) => {}
        }
    }
    Ok(first.map(|m| m.attributes()).unwrap_or_default())
}

pub(crate) fn is_roman_letter(b: u8) -> bool {
    matches!(
        b.to_ascii_lowercase(),
        b'i' | b'v' | b'x' | b'l' | b'c' | b'd' | b'm'
    )
}

fn roman_digit(b: u8) -> i64 {
    match b.to_ascii_lowercase() {
        b'i' => 1,
        b'v' => 5,
        b'x' => 10,
        b'l' => 50,
        b'c' => 100,
        b'd' => 500,
        b'm' => 1000,
        _ => 0,
    }
}

/// Additive roman value where a digit smaller than its successor subtracts.
/// Non-positive results (malformed numerals) floor to 1.
fn roman_value(numeral: &str) -> i64 {
    let digits: Vec<i64> = numeral.bytes().map(roman_digit).collect();
    let sum: i64 = digits
        .iter()
        .enumerate()
        .map(|(i, &value)| match digits.get(i + 1) {
            Some(&next) if value < next => -value,
            _ => value,
        })
        .sum();
    sum.max(1)
}

fn alpha_value(letter: u8) -> i64 {
    i64::from(letter.to_ascii_lowercase() - b'a') + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn marker(text: &str) -> ListMarker {
        match ListMarker::parse(text) {
            Some(ParsedMarker::Marker(m)) => m,
            other => panic!("expected a marker for {text:?}, got {other:?}"),
        }
    }

    #[rstest]
    #[case("1.", ListNumberStyle::Decimal, ListNumberDelim::Period, 1)]
    #[case("42)", ListNumberStyle::Decimal, ListNumberDelim::OneParen, 42)]
    #[case("(7)", ListNumberStyle::Decimal, ListNumberDelim::TwoParens, 7)]
    #[case("a.", ListNumberStyle::LowerAlpha, ListNumberDelim::Period, 1)]
    #[case("C)", ListNumberStyle::UpperAlpha, ListNumberDelim::OneParen, 3)]
    #[case("c.", ListNumberStyle::LowerAlpha, ListNumberDelim::Period, 3)]
    #[case("i.", ListNumberStyle::LowerRoman, ListNumberDelim::Period, 1)]
    #[case("V.", ListNumberStyle::UpperRoman, ListNumberDelim::Period, 5)]
    #[case("(x)", ListNumberStyle::LowerRoman, ListNumberDelim::TwoParens, 10)]
    #[case("iv.", ListNumberStyle::LowerRoman, ListNumberDelim::Period, 4)]
    #[case("XIV)", ListNumberStyle::UpperRoman, ListNumberDelim::OneParen, 14)]
    #[case("mcmxc.", ListNumberStyle::LowerRoman, ListNumberDelim::Period, 1990)]
    #[case("ab.", ListNumberStyle::LowerAlpha, ListNumberDelim::Period, 1)]
    #[case("  2.  ", ListNumberStyle::Decimal, ListNumberDelim::Period, 2)]
    fn classifies(
        #[case] text: &str,
        #[case] style: ListNumberStyle,
        #[case] delim: ListNumberDelim,
        #[case] start: i64,
    ) {
        let m = marker(text);
        assert_eq!((m.style, m.delim, m.start_number), (style, delim, start));
    }

    #[test]
    fn roman_subtractive_pairs() {
        assert_eq!(roman_value("IM"), 999);
        assert_eq!(roman_value("ivx"), 4);
        assert_eq!(roman_value("xv"), 15);
        assert_eq!(roman_value("iix"), 10);
        assert_eq!(roman_value(""), 1);
    }

    #[test]
    fn continuation_and_garbage() {
        assert_eq!(ListMarker::parse(" + "), Some(ParsedMarker::Continuation));
        assert_eq!(ListMarker::parse("1a."), None);
        assert_eq!(ListMarker::parse("()"), None);
        assert_eq!(ListMarker::parse("-"), None);
        assert_eq!(ListMarker::parse(""), None);
    }

    #[rstest]
    #[case(&["1.", "2.", "3."], Some((1, ListNumberStyle::Decimal)))]
    #[case(&["a.", "b."], Some((1, ListNumberStyle::LowerAlpha)))]
    #[case(&["i.", "ii."], Some((1, ListNumberStyle::LowerRoman)))]
    #[case(&["a.", "ii."], Some((1, ListNumberStyle::LowerAlpha)))]
    #[case(&["ii.", "c."], Some((2, ListNumberStyle::LowerRoman)))]
    #[case(&["+", "3.", "+"], Some((3, ListNumberStyle::Decimal)))]
    #[case(&["a.", "2."], None)]
    #[case(&["1.", "a)"], None)]
    #[case(&["1.", "2)"], None)]
    #[case(&["A.", "ii."], None)]
    #[case(&["ab.", "ii."], None)]
    fn resolves_lists(#[case] markers: &[&str], #[case] expected: Option<(i64, ListNumberStyle)>) {
        let resolved = resolve_list(markers.iter().copied());
        match expected {
            Some((start, style)) => {
                let attrs = resolved.unwrap();
                assert_eq!((attrs.start, attrs.style), (start, style));
            }
            None => assert!(matches!(
                resolved,
                Err(CompileError::ListMarkerMismatch { .. })
            )),
        }
    }

    #[test]
    fn all_continuations_use_default_numbering() {
        let attrs = resolve_list(["+", "+"]).unwrap();
        assert_eq!(attrs, ListAttributes::default());
        assert_eq!(attrs.style, ListNumberStyle::Decimal);
        assert_eq!(attrs.delim, ListNumberDelim::Period);
    }

    #[test]
    fn unparsable_marker_is_internal_error() {
        assert!(matches!(
            resolve_list(["1.", "??"]),
            Err(CompileError::InvalidListMarker(text)) if text == "??"
        ));
    }
}
