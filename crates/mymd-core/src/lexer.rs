//! Tokenizer for MyMD source text.
//!
//! The lexer works a line at a time: block constructs are recognized at the
//! start of a line (after indentation), then the rest of the line is split
//! into inline tokens, then the line end is classified as a soft break or a
//! paragraph end. Fenced regions (front matter, code blocks, LaTeX
//! environments, display math) are recognized before anything else and may
//! span several lines.
//!
//! # Performance
//!
//! - Zero-copy: tokens borrow their text from the input
//! - Closing delimiters and line ends are found with `memchr`/`memmem`

use memchr::{memchr, memchr_iter, memmem};

use crate::error::{DiagnosticKind, Diagnostics, Location};
use crate::list_marker::is_roman_letter;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Tokens plus the lexical errors found while producing them.
#[derive(Debug)]
pub struct TokenStream<'a> {
    /// Always ends with a single [`TokenKind::Eof`] token.
    pub tokens: Vec<Token<'a>>,
    pub diagnostics: Diagnostics,
}

/// Tokenize `input`. Never fails; problems are reported as diagnostics.
pub fn tokenize(input: &str) -> TokenStream<'_> {
    Lexer::new(input).tokenize()
}

/// Stateful single-pass tokenizer.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: u32,
    line_start: usize,
    /// Last `(offset, column)` computed on the current line.
    column_mark: (usize, u32),
    tokens: Vec<Token<'a>>,
    diagnostics: Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
            line: 0,
            line_start: 0,
            column_mark: (0, 0),
            tokens: Vec::with_capacity(input.len() / 4 + 1),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn tokenize(mut self) -> TokenStream<'a> {
        if !self.lex_front_matter() {
            self.skip_blank_lines();
        }
        while self.offset < self.bytes.len() {
            self.lex_line();
        }
        let end = self.bytes.len();
        self.push(TokenKind::Eof, end, end);

        TokenStream {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    // ------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------

    /// Character column of byte `pos` on the current line.
    fn column_at(&mut self, pos: usize) -> u32 {
        let (from, column) = if self.column_mark.0 >= self.line_start && self.column_mark.0 <= pos
        {
            self.column_mark
        } else {
            (self.line_start, 0)
        };
        let column = column + self.input[from..pos].chars().count() as u32;
        self.column_mark = (pos, column);
        column
    }

    /// Advance to `end`, keeping line counters in step.
    fn bump(&mut self, end: usize) {
        for newline in memchr_iter(b'\n', &self.bytes[self.offset..end]) {
            self.line += 1;
            self.line_start = self.offset + newline + 1;
        }
        self.offset = end;
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let column = self.column_at(start);
        self.tokens.push(Token {
            kind,
            text: &self.input[start..end],
            span: Span::new(start as u32, end as u32),
            line: self.line,
            column,
        });
        self.bump(end);
    }

    fn error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        let column = self.column_at(start);
        self.diagnostics.report(
            DiagnosticKind::Lexical,
            self.line,
            column,
            Location::Token(Span::new(start as u32, end as u32)),
            message,
        );
    }

    /// End of the current line, excluding the line break.
    fn line_end(&self, from: usize) -> usize {
        let end = memchr(b'\n', &self.bytes[from..]).map_or(self.bytes.len(), |i| from + i);
        if end > from && self.bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        }
    }

    /// Length of the line break at `pos`, if there is one.
    fn line_break_len(&self, pos: usize) -> Option<usize> {
        match self.bytes.get(pos..pos + 2) {
            Some([b'\r', b'\n']) => Some(2),
            _ if self.bytes.get(pos) == Some(&b'\n') => Some(1),
            _ => None,
        }
    }

    fn skip_blank_lines(&mut self) {
        while self.offset < self.bytes.len() {
            let rest = &self.bytes[self.offset..];
            let len = memchr(b'\n', rest).unwrap_or(rest.len());
            if !rest[..len].iter().all(|&b| is_blank_byte(b)) {
                break;
            }
            let next = (self.offset + len + 1).min(self.bytes.len());
            self.bump(next);
        }
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    fn lex_line(&mut self) {
        self.lex_line_start();
        self.lex_inline();
        self.lex_line_end();
    }

    /// `---` YAML `---` at byte 0. Returns false, consuming nothing, when
    /// there is no closing delimiter line.
    fn lex_front_matter(&mut self) -> bool {
        let first_end = self.line_end(0);
        if self.input[..first_end].trim_end() != "---" {
            return false;
        }
        let mut line_start = match memchr(b'\n', self.bytes) {
            Some(i) => i + 1,
            None => return false,
        };
        while line_start < self.bytes.len() {
            let end = self.line_end(line_start);
            if self.input[line_start..end].trim_end() == "---" {
                self.push(TokenKind::FrontMatter, 0, line_start + 3);
                self.lex_inline();
                self.lex_line_end();
                return true;
            }
            line_start = memchr(b'\n', &self.bytes[line_start..])
                .map_or(self.bytes.len(), |i| line_start + i + 1);
        }
        false
    }

    fn lex_line_start(&mut self) {
        let start = self.offset;
        let indent = self.bytes[start..]
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        if indent > 0 {
            self.push(TokenKind::Indent, start, start + indent);
        }

        let pos = self.offset;
        let eol = self.line_end(pos);
        let line = &self.bytes[pos..eol];

        if line.starts_with(b"```") {
            self.lex_code_block();
            return;
        }
        if line.starts_with(b"\\begin{") && self.lex_latex_env() {
            return;
        }

        let marker = if let Some(len) = heading_len(line) {
            Some((TokenKind::Heading, len))
        } else if line.first() == Some(&b'>') {
            Some((TokenKind::QuoteMarker, 1 + blank_run(&line[1..])))
        } else if is_horizontal_rule(line) {
            Some((TokenKind::HorizontalRule, line.len()))
        } else if let Some(len) = bullet_len(line) {
            Some((TokenKind::BulletMarker, len))
        } else if let Some(len) = plus_len(line) {
            Some((TokenKind::PlusMarker, len))
        } else {
            ordered_marker_len(line).map(|len| (TokenKind::OrderedMarker, len))
        };

        if let Some((kind, len)) = marker {
            self.push(kind, pos, pos + len);
        }
    }

    /// Classify the line break at the cursor, folding any blank lines that
    /// follow into a single paragraph end.
    fn lex_line_end(&mut self) {
        let start = self.offset;
        let Some(len) = self.line_break_len(start) else {
            return;
        };
        let mut end = start + len;
        let mut blank = false;
        loop {
            let rest = &self.bytes[end..];
            let line_len = memchr(b'\n', rest).unwrap_or(rest.len());
            if !rest[..line_len].iter().all(|&b| is_blank_byte(b)) {
                break;
            }
            blank = true;
            if end + line_len >= self.bytes.len() {
                end = self.bytes.len();
                break;
            }
            end += line_len + 1;
        }

        let kind = if blank || end == self.bytes.len() {
            TokenKind::ParagraphEnd
        } else {
            TokenKind::SoftBreak
        };
        self.push(kind, start, end);
    }

    // ------------------------------------------------------------------
    // Fenced regions
    // ------------------------------------------------------------------

    fn lex_code_block(&mut self) {
        let start = self.offset;
        let mut line_start = memchr(b'\n', &self.bytes[start..])
            .map_or(self.bytes.len(), |i| start + i + 1);

        while line_start < self.bytes.len() {
            let eol = self.line_end(line_start);
            let indent = blank_run(&self.bytes[line_start..eol]);
            if self.bytes[line_start + indent..eol].starts_with(b"```") {
                self.push(TokenKind::CodeBlock, start, line_start + indent + 3);
                return;
            }
            line_start = memchr(b'\n', &self.bytes[line_start..])
                .map_or(self.bytes.len(), |i| line_start + i + 1);
        }

        self.error(start, start + 3, "unterminated code block");
        self.bump(start + 3);
    }

    /// `\begin{name}` through the first `\end{name}`. Returns false when
    /// there is no matching end, leaving the cursor untouched.
    fn lex_latex_env(&mut self) -> bool {
        let start = self.offset;
        let name_start = start + "\\begin{".len();
        let eol = self.line_end(start);
        let Some(close) = memchr(b'}', &self.bytes[name_start..eol]) else {
            return false;
        };
        let name = &self.input[name_start..name_start + close];
        if name.is_empty() {
            return false;
        }
        let end_marker = format!("\\end{{{name}}}");
        let search_from = name_start + close + 1;
        match memmem::find(&self.bytes[search_from..], end_marker.as_bytes()) {
            Some(i) => {
                self.push(
                    TokenKind::LatexEnv,
                    start,
                    search_from + i + end_marker.len(),
                );
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Inline tokens
    // ------------------------------------------------------------------

    /// Tokenize up to (not including) the next line break.
    fn lex_inline(&mut self) {
        while self.offset < self.bytes.len() {
            let pos = self.offset;
            let b = self.bytes[pos];
            if self.line_break_len(pos).is_some() {
                return;
            }
            let eol = self.line_end(pos);

            match b {
                b'*' => {
                    if self.bytes.get(pos + 1) == Some(&b'*') {
                        self.push(TokenKind::StrongMarker, pos, pos + 2);
                    } else {
                        self.push(TokenKind::EmphMarker, pos, pos + 1);
                    }
                }
                b'`' => match memchr(b'`', &self.bytes[pos + 1..eol]) {
                    Some(i) => self.push(TokenKind::InlineCode, pos, pos + i + 2),
                    None => {
                        self.error(pos, pos + 1, "unterminated inline code");
                        self.bump(pos + 1);
                    }
                },
                b'$' if self.bytes.get(pos + 1) == Some(&b'$') => {
                    match memmem::find(&self.bytes[pos + 2..], b"$$") {
                        Some(i) => self.push(TokenKind::DisplayMath, pos, pos + i + 4),
                        None => {
                            self.error(pos, pos + 2, "unterminated display math");
                            self.bump(pos + 2);
                        }
                    }
                }
                b'$' => match memchr(b'$', &self.bytes[pos + 1..eol]) {
                    Some(i) => self.push(TokenKind::InlineMath, pos, pos + i + 2),
                    None => {
                        self.error(pos, pos + 1, "unterminated inline math");
                        self.bump(pos + 1);
                    }
                },
                b'!' => self.push(TokenKind::Bang, pos, pos + 1),
                b'[' => match self.bracketed_id(pos) {
                    Some((kind, len)) => self.push(kind, pos, pos + len),
                    None => self.push(TokenKind::LBracket, pos, pos + 1),
                },
                b']' => self.push(TokenKind::RBracket, pos, pos + 1),
                b'(' => self.push(TokenKind::LParen, pos, pos + 1),
                b')' => self.push(TokenKind::RParen, pos, pos + 1),
                b'\\' => self.lex_backslash(pos, eol),
                b' ' | b'\t' | b'\r' => {
                    let len = self.bytes[pos..eol]
                        .iter()
                        .take_while(|&&b| is_blank_byte(b))
                        .count()
                        .max(1);
                    self.push(TokenKind::Space, pos, pos + len);
                }
                b if is_control(b) => {
                    self.error(
                        pos,
                        pos + 1,
                        format!("token recognition error at: {:?}", b as char),
                    );
                    self.bump(pos + 1);
                }
                _ => {
                    let len = self.bytes[pos..eol]
                        .iter()
                        .take_while(|&&b| !is_inline_special(b))
                        .count()
                        .max(1);
                    self.push(TokenKind::Text, pos, pos + len);
                }
            }
        }
    }

    fn lex_backslash(&mut self, pos: usize, eol: usize) {
        if self.line_break_len(pos + 1).is_some() {
            self.push(TokenKind::EscapedNewline, pos, pos + 1);
            return;
        }
        match self.input[pos + 1..].chars().next() {
            None => self.push(TokenKind::Text, pos, pos + 1),
            Some(c) if c.is_ascii_alphabetic() => {
                let end = raw_latex_end(self.bytes, pos, eol);
                self.push(TokenKind::RawLatex, pos, end);
            }
            Some(c) => self.push(TokenKind::Escaped, pos, pos + 1 + c.len_utf8()),
        }
    }

    /// `[@id]` or `[id]` starting at `pos`, as `(kind, byte length)`.
    fn bracketed_id(&self, pos: usize) -> Option<(TokenKind, usize)> {
        let (kind, id_start) = if self.bytes.get(pos + 1) == Some(&b'@') {
            (TokenKind::Citation, pos + 2)
        } else {
            (TokenKind::Ref, pos + 1)
        };
        let id_len = self.bytes.get(id_start..)?
            .iter()
            .take_while(|&&b| is_id_byte(b))
            .count();
        if id_len == 0 || self.bytes.get(id_start + id_len) != Some(&b']') {
            return None;
        }
        Some((kind, id_start + id_len + 1 - pos))
    }
}

// ----------------------------------------------------------------------
// Byte classes and line-start matchers
// ----------------------------------------------------------------------

#[inline]
fn is_blank_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r')
}

#[inline]
fn is_control(b: u8) -> bool {
    (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')) || b == 0x7f
}

#[inline]
fn is_inline_special(b: u8) -> bool {
    matches!(
        b,
        b'*' | b'`'
            | b'$'
            | b'!'
            | b'['
            | b']'
            | b'('
            | b')'
            | b'\\'
            | b' '
            | b'\t'
            | b'\r'
            | b'\n'
    ) || is_control(b)
}

/// Characters allowed in citation and reference ids.
#[inline]
pub(crate) fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'-' | b'/')
}

fn blank_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| b == b' ' || b == b'\t').count()
}

fn trim_end_len(line: &[u8]) -> usize {
    line.len() - line.iter().rev().take_while(|&&b| is_blank_byte(b)).count()
}

/// One to six `#` followed by whitespace or the end of the line.
fn heading_len(line: &[u8]) -> Option<usize> {
    let hashes = line.iter().take_while(|&&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    match line.get(hashes) {
        None => Some(hashes),
        Some(b' ' | b'\t') => Some(hashes + blank_run(&line[hashes..])),
        Some(_) => None,
    }
}

/// Three or more of the same `-`, `*` or `_`, and nothing else.
fn is_horizontal_rule(line: &[u8]) -> bool {
    let body = &line[..trim_end_len(line)];
    match body.first() {
        Some(&c @ (b'-' | b'*' | b'_')) => body.len() >= 3 && body.iter().all(|&b| b == c),
        _ => false,
    }
}

fn bullet_len(line: &[u8]) -> Option<usize> {
    match line {
        [b'-' | b'*', b' ' | b'\t', ..] => Some(1 + blank_run(&line[1..])),
        _ => None,
    }
}

fn plus_len(line: &[u8]) -> Option<usize> {
    match line {
        [b'+', b' ' | b'\t', ..] => Some(1 + blank_run(&line[1..])),
        _ => None,
    }
}

/// `N.`, `N)`, `(N)` where N is 1-9 digits, a single letter or a run of
/// roman numeral letters, followed by whitespace.
fn ordered_marker_len(line: &[u8]) -> Option<usize> {
    let open = line.first() == Some(&b'(');
    let mut i = usize::from(open);

    let digits = line[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        if digits > 9 {
            return None;
        }
        i += digits;
    } else {
        let letters = line[i..]
            .iter()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        if letters == 0 || (letters > 1 && !line[i..i + letters].iter().all(|&b| is_roman_letter(b)))
        {
            return None;
        }
        i += letters;
    }

    match (open, line.get(i)) {
        (true, Some(b')')) | (false, Some(b'.' | b')')) => i += 1,
        _ => return None,
    }
    let ws = blank_run(&line[i..]);
    if ws == 0 {
        return None;
    }
    Some(i + ws)
}

/// End of a `\command*{...}[...]` starting at `pos`. Groups must close on
/// the same line to be included.
fn raw_latex_end(bytes: &[u8], pos: usize, eol: usize) -> usize {
    let mut i = pos + 1;
    while i < eol && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i < eol && bytes[i] == b'*' {
        i += 1;
    }
    while i < eol {
        let (open, close) = match bytes[i] {
            b'{' => (b'{', b'}'),
            b'[' => (b'[', b']'),
            _ => break,
        };
        let mut depth = 0usize;
        let mut closed = None;
        for (j, &b) in bytes[i..eol].iter().enumerate() {
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    closed = Some(i + j);
                    break;
                }
            }
        }
        match closed {
            Some(j) => i = j + 1,
            None => break,
        }
    }
    i
}
