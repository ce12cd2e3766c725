//! Block parser for MyMD.
//!
//! Recursive descent over the token stream:
//!
//! ```text
//! document  = front-matter? block*
//! block     = heading | code | latex-env | block-math | quote | rule
//!           | bullet-list | ordered-list | paragraph
//! list      = item+            (same marker family, same indentation)
//! item      = marker inline-run block*   (blocks indented past the marker)
//! ```
//!
//! Inline runs are delimited here and handed to the inline grammar. Syntax
//! errors are collected; with recovery enabled (the default) the parser
//! resynchronizes at the next block boundary and keeps going.

use crate::error::{DiagnosticKind, Diagnostics, Location};
use crate::inline::parse_inlines;
use crate::lexer::TokenStream;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::tree::{BlockNode, DocumentNode, InlineNode, ListItemNode};

/// Parse tree plus every lexical and syntax diagnostic reported so far.
#[derive(Debug)]
pub struct ParseOutput<'a> {
    /// The parsed tree (partial if errors occurred).
    pub tree: DocumentNode<'a>,
    pub diagnostics: Diagnostics,
}

impl<'a> ParseOutput<'a> {
    /// Check if tokenizing and parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Parse a token stream with default settings.
pub fn parse(stream: TokenStream<'_>) -> ParseOutput<'_> {
    Parser::new(stream).parse()
}

/// Marks a construct that failed; the diagnostic has already been reported.
#[derive(Debug)]
struct SyntaxFault;

type PResult<T> = Result<T, SyntaxFault>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListFamily {
    Bullet,
    Ordered,
}

impl ListFamily {
    fn of(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::BulletMarker => Some(ListFamily::Bullet),
            TokenKind::OrderedMarker | TokenKind::PlusMarker => Some(ListFamily::Ordered),
            _ => None,
        }
    }
}

/// MyMD block parser with configurable error recovery.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    diagnostics: Diagnostics,
    /// Whether to attempt recovery on errors.
    recover_on_error: bool,
    /// Set once an error is seen with recovery disabled.
    halted: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser over a token stream, inheriting its lexical diagnostics.
    pub fn new(stream: TokenStream<'a>) -> Self {
        let TokenStream {
            mut tokens,
            diagnostics,
        } = stream;
        if !tokens.last().is_some_and(|t| t.is(TokenKind::Eof)) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: "",
                span: Span::new(end, end),
                line: tokens.last().map_or(0, |t| t.line),
                column: 0,
            });
        }
        Self {
            tokens,
            pos: 0,
            diagnostics,
            recover_on_error: true,
            halted: false,
        }
    }

    /// Enable or disable error recovery mode.
    ///
    /// When enabled (default), the parser skips to the next block boundary
    /// after a syntax error and keeps collecting diagnostics. When disabled,
    /// parsing stops at the first syntax error.
    pub fn with_recovery(mut self, recover: bool) -> Self {
        self.recover_on_error = recover;
        self
    }

    pub fn parse(mut self) -> ParseOutput<'a> {
        let front_matter = if self.peek().is(TokenKind::FrontMatter) {
            Some(self.advance())
        } else {
            None
        };
        let blocks = self.parse_blocks(0);

        ParseOutput {
            tree: DocumentNode {
                front_matter,
                blocks,
            },
            diagnostics: self.diagnostics,
        }
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    #[inline]
    fn peek(&self) -> Token<'a> {
        self.token_at(self.pos)
    }

    #[inline]
    fn token_at(&self, index: usize) -> Token<'a> {
        let last = self.tokens.len() - 1;
        self.tokens[index.min(last)]
    }

    /// Consume the current token; never moves past `Eof`.
    #[inline]
    fn advance(&mut self) -> Token<'a> {
        let tok = self.peek();
        if !tok.is(TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    fn skip_separators(&mut self) {
        while matches!(
            self.peek().kind,
            TokenKind::SoftBreak | TokenKind::ParagraphEnd | TokenKind::Space
        ) {
            self.pos += 1;
        }
    }

    /// Indentation width of the line starting at `index` and the index of
    /// its first token after the indentation.
    fn line_at(&self, index: usize) -> (u32, usize) {
        let tok = self.token_at(index);
        if tok.is(TokenKind::Indent) {
            (indent_width(tok.text), index + 1)
        } else {
            (0, index)
        }
    }

    /// Span of the last consumed token that is not a line end.
    fn last_real_span(&self) -> Option<Span> {
        self.tokens[..self.pos.min(self.tokens.len())]
            .iter()
            .rev()
            .find(|t| !t.kind.ends_line())
            .map(|t| t.span)
    }

    fn error(
        &mut self,
        tok: Token<'a>,
        location: Location,
        message: impl Into<String>,
    ) -> SyntaxFault {
        self.diagnostics.report(
            DiagnosticKind::Syntax,
            tok.line,
            tok.column,
            location,
            message,
        );
        SyntaxFault
    }

    /// Skip to the next block boundary: past a blank line, or to a line
    /// that starts a block.
    fn synchronize(&mut self) {
        let from = self.pos;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::ParagraphEnd => {
                    self.pos += 1;
                    break;
                }
                TokenKind::SoftBreak => {
                    self.pos += 1;
                    let (_, head) = self.line_at(self.pos);
                    if self.token_at(head).kind.starts_block() {
                        break;
                    }
                }
                _ => self.pos += 1,
            }
        }
        tracing::trace!(from, to = self.pos, "resynchronized after syntax error");
    }

    /// Halt on a fault unless recovering.
    fn on_fault(&mut self) {
        if !self.recover_on_error {
            self.halted = true;
        }
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Parse blocks while lines are indented at least `min_indent`.
    fn parse_blocks(&mut self, min_indent: u32) -> Vec<BlockNode<'a>> {
        let mut blocks = Vec::new();
        while !self.halted {
            self.skip_separators();
            if self.peek().is(TokenKind::Eof) {
                break;
            }
            let (indent, _) = self.line_at(self.pos);
            if indent < min_indent {
                break;
            }

            let start = self.pos;
            match self.parse_block(indent, min_indent) {
                Ok(block) => blocks.push(block),
                Err(SyntaxFault) => {
                    self.on_fault();
                    if self.halted {
                        break;
                    }
                    self.synchronize();
                }
            }
            if self.pos == start {
                self.advance();
            }
        }
        blocks
    }

    fn parse_block(&mut self, indent: u32, min_indent: u32) -> PResult<BlockNode<'a>> {
        if self.peek().is(TokenKind::Indent) {
            self.pos += 1;
        }
        let tok = self.peek();
        match tok.kind {
            TokenKind::Heading => self.parse_heading(),
            TokenKind::CodeBlock => Ok(BlockNode::CodeBlock(self.advance())),
            TokenKind::LatexEnv => Ok(BlockNode::LatexEnv(self.advance())),
            TokenKind::HorizontalRule => Ok(BlockNode::HorizontalRule(self.advance())),
            TokenKind::QuoteMarker => Ok(self.parse_quote(indent)),
            TokenKind::BulletMarker => self.parse_list(indent, ListFamily::Bullet),
            TokenKind::OrderedMarker | TokenKind::PlusMarker => {
                self.parse_list(indent, ListFamily::Ordered)
            }
            TokenKind::DisplayMath if self.standalone_math(self.pos).is_some() => {
                Ok(self.parse_block_math())
            }
            _ => self.parse_paragraph(min_indent),
        }
    }

    fn parse_heading(&mut self) -> PResult<BlockNode<'a>> {
        let marker = self.advance();
        let tokens = self.collect_line();

        if tokens.iter().all(|t| t.is(TokenKind::Space)) {
            let end = self.peek();
            let location = if end.is(TokenKind::Eof) {
                Location::AfterToken(self.last_real_span())
            } else {
                Location::Token(end.span)
            };
            return Err(self.error(end, location, "missing heading text"));
        }

        let content = self.inlines(&tokens);
        Ok(BlockNode::Heading { marker, content })
    }

    fn parse_paragraph(&mut self, min_indent: u32) -> PResult<BlockNode<'a>> {
        let tokens = self.collect_run(min_indent);
        Ok(BlockNode::Paragraph(self.inlines(&tokens)))
    }

    /// Consecutive `>` lines at the same indentation.
    fn parse_quote(&mut self, indent: u32) -> BlockNode<'a> {
        let mut tokens = Vec::new();
        loop {
            self.advance();
            tokens.extend(self.collect_line());

            let end = self.peek();
            if !end.is(TokenKind::SoftBreak) {
                break;
            }
            let (next_indent, head) = self.line_at(self.pos + 1);
            if next_indent != indent || !self.token_at(head).is(TokenKind::QuoteMarker) {
                break;
            }
            tokens.push(end);
            self.pos = head;
        }
        BlockNode::Quote(self.inlines(&tokens))
    }

    fn parse_block_math(&mut self) -> BlockNode<'a> {
        let (label, end) = match self.standalone_math(self.pos) {
            Some(found) => found,
            None => (None, self.pos + 1),
        };
        let math = self.peek();
        self.pos = end;
        BlockNode::BlockMath { math, label }
    }

    /// If the `$$...$$` token at `index` stands alone on its line (optionally
    /// followed by a `[label]`), the label and the index of the line end.
    fn standalone_math(&self, index: usize) -> Option<(Option<Token<'a>>, usize)> {
        if !self.token_at(index).is(TokenKind::DisplayMath) {
            return None;
        }
        let mut label = None;
        let mut i = index + 1;
        loop {
            let tok = self.token_at(i);
            match tok.kind {
                TokenKind::Space => {}
                TokenKind::Ref if label.is_none() => label = Some(tok),
                kind if kind.ends_line() => return Some((label, i)),
                _ => return None,
            }
            i += 1;
        }
    }

    fn parse_list(&mut self, indent: u32, family: ListFamily) -> PResult<BlockNode<'a>> {
        let mut items = Vec::new();
        loop {
            let marker = self.advance();
            let head_tokens = self.collect_run(indent + 1);
            let head = self.inlines(&head_tokens);
            let body = self.parse_blocks(indent + 1);
            items.push(ListItemNode { marker, head, body });

            if self.halted || !self.next_item_follows(indent, family) {
                break;
            }
            self.skip_separators();
            if self.peek().is(TokenKind::Indent) {
                self.pos += 1;
            }
        }

        Ok(match family {
            ListFamily::Bullet => BlockNode::BulletList(items),
            ListFamily::Ordered => BlockNode::OrderedList(items),
        })
    }

    /// Whether the next non-blank line is a marker of `family` at `indent`.
    fn next_item_follows(&self, indent: u32, family: ListFamily) -> bool {
        let mut index = self.pos;
        while matches!(
            self.token_at(index).kind,
            TokenKind::SoftBreak | TokenKind::ParagraphEnd | TokenKind::Space
        ) {
            index += 1;
        }
        let (next_indent, head) = self.line_at(index);
        next_indent == indent && ListFamily::of(self.token_at(head).kind) == Some(family)
    }

    // ------------------------------------------------------------------
    // Inline runs
    // ------------------------------------------------------------------

    /// Tokens up to the end of the current line.
    fn collect_line(&mut self) -> Vec<Token<'a>> {
        let start = self.pos;
        while !self.peek().kind.ends_line() {
            self.pos += 1;
        }
        self.tokens[start..self.pos].to_vec()
    }

    /// Tokens of a paragraph-style run: continues over soft breaks until a
    /// blank line, a line that starts a block, or a line indented less than
    /// `min_indent`. Indentation tokens are dropped.
    fn collect_run(&mut self, min_indent: u32) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof | TokenKind::ParagraphEnd => break,
                TokenKind::SoftBreak => {
                    if self.line_breaks_run(self.pos + 1, min_indent) {
                        break;
                    }
                    tokens.push(tok);
                }
                TokenKind::Indent => {}
                _ => tokens.push(tok),
            }
            self.pos += 1;
        }
        tokens
    }

    fn line_breaks_run(&self, index: usize, min_indent: u32) -> bool {
        let (indent, head) = self.line_at(index);
        let head_kind = self.token_at(head).kind;
        indent < min_indent
            || head_kind.starts_block()
            || head_kind == TokenKind::Eof
            || self.standalone_math(head).is_some()
    }

    fn inlines(&mut self, tokens: &[Token<'a>]) -> Vec<InlineNode<'a>> {
        let run = parse_inlines(tokens, &mut self.diagnostics);
        if run.faulted {
            self.on_fault();
        }
        run.nodes
    }
}

/// Width of leading whitespace, counting a tab as four columns.
pub fn indent_width(text: &str) -> u32 {
    text.bytes()
        .map(|b| if b == b'\t' { 4 } else { 1 })
        .sum()
}
