//! Inline grammar for MyMD.
//!
//! Works on the tokens of one inline run (a heading line, a paragraph, a list
//! item head or a block quote) as delimited by the block parser. Greedy,
//! left-to-right: each construct is tried where its opening token appears,
//! and one that does not complete falls back to literal text.

use crate::error::{DiagnosticKind, Diagnostics, Location};
use crate::token::{Token, TokenKind};
use crate::tree::{InlineNode, Label};

/// Link labels nested deeper than this are kept as literal text.
pub(crate) const MAX_LABEL_DEPTH: usize = 32;

/// Nodes of one inline run plus whether a syntax error was reported in it.
#[derive(Debug)]
pub(crate) struct InlineRun<'a> {
    pub nodes: Vec<InlineNode<'a>>,
    pub faulted: bool,
}

/// Parse an inline run; syntax errors are reported into `diagnostics`.
pub(crate) fn parse_inlines<'a>(
    tokens: &[Token<'a>],
    diagnostics: &mut Diagnostics,
) -> InlineRun<'a> {
    let index = RunIndex::build(tokens);
    let mut parser = InlineParser::new(tokens, &index, 0, tokens.len(), 0, diagnostics);
    let (nodes, _) = parser.parse_nodes(None);
    InlineRun {
        nodes,
        faulted: parser.faulted,
    }
}

// ----------------------------------------------------------------------------
// Run index
// ----------------------------------------------------------------------------

/// Bracket and destination lookups for one run, built in a single pass so
/// link parsing never rescans the run.
struct RunIndex {
    /// Index of the `]` closing each `[`.
    closing_bracket: Vec<Option<usize>>,
    /// First `)` or line end at or after each index.
    destination_stop: Vec<usize>,
}

impl RunIndex {
    fn build(tokens: &[Token<'_>]) -> Self {
        let mut closing_bracket = vec![None; tokens.len()];
        let mut open = Vec::new();
        for (i, tok) in tokens.iter().enumerate() {
            match tok.kind {
                TokenKind::LBracket => open.push(i),
                TokenKind::RBracket => {
                    if let Some(at) = open.pop() {
                        closing_bracket[at] = Some(i);
                    }
                }
                _ => {}
            }
        }

        let mut destination_stop = vec![tokens.len(); tokens.len() + 1];
        for i in (0..tokens.len()).rev() {
            destination_stop[i] = if stops_destination(tokens[i].kind) {
                i
            } else {
                destination_stop[i + 1]
            };
        }

        Self {
            closing_bracket,
            destination_stop,
        }
    }
}

#[inline]
fn stops_destination(kind: TokenKind) -> bool {
    kind == TokenKind::RParen || kind == TokenKind::EscapedNewline || kind.ends_line()
}

// ----------------------------------------------------------------------------
// Parser
// ----------------------------------------------------------------------------

struct InlineParser<'p, 'a> {
    tokens: &'p [Token<'a>],
    index: &'p RunIndex,
    pos: usize,
    /// Exclusive bound; a label parser stops at its `]`.
    end: usize,
    /// Number of link labels enclosing this parser.
    depth: usize,
    diagnostics: &'p mut Diagnostics,
    /// Closing markers of the constructs currently open.
    closers: Vec<TokenKind>,
    /// Unclosed `**` openers already reported.
    orphaned_strong: usize,
    faulted: bool,
}

impl<'p, 'a> InlineParser<'p, 'a> {
    fn new(
        tokens: &'p [Token<'a>],
        index: &'p RunIndex,
        start: usize,
        end: usize,
        depth: usize,
        diagnostics: &'p mut Diagnostics,
    ) -> Self {
        Self {
            tokens,
            index,
            pos: start,
            end,
            depth,
            diagnostics,
            closers: Vec::new(),
            orphaned_strong: 0,
            faulted: false,
        }
    }

    #[inline]
    fn get(&self, at: usize) -> Option<Token<'a>> {
        if at < self.end {
            self.tokens.get(at).copied()
        } else {
            None
        }
    }

    /// Parse until the end of the run or until any open construct's closer.
    /// The flag is true when parsing stopped at `closer` itself; the closer
    /// is left for the caller to consume.
    fn parse_nodes(&mut self, closer: Option<TokenKind>) -> (Vec<InlineNode<'a>>, bool) {
        let mut nodes = Vec::with_capacity(8);

        while let Some(tok) = self.get(self.pos) {
            if self.closers.contains(&tok.kind) {
                return (nodes, Some(tok.kind) == closer);
            }
            self.pos += 1;

            match tok.kind {
                TokenKind::Text | TokenKind::RBracket | TokenKind::LParen | TokenKind::RParen => {
                    nodes.push(InlineNode::Text(tok.text))
                }
                TokenKind::Space => nodes.push(InlineNode::Space),
                TokenKind::SoftBreak => nodes.push(InlineNode::SoftBreak),
                TokenKind::Indent => {}
                TokenKind::EscapedNewline => nodes.push(InlineNode::HardBreak),
                TokenKind::Escaped => nodes.push(InlineNode::Escaped(tok)),
                TokenKind::RawLatex => nodes.push(InlineNode::RawLatex(tok)),
                TokenKind::InlineCode => nodes.push(InlineNode::Code(tok)),
                TokenKind::InlineMath | TokenKind::DisplayMath => {
                    nodes.push(InlineNode::Math(tok))
                }
                TokenKind::Citation => nodes.push(InlineNode::Citation(tok)),
                TokenKind::Ref => match self.destination(self.pos) {
                    Some((url, after)) => {
                        self.pos = after;
                        nodes.push(InlineNode::Link {
                            label: Label::Ref(tok),
                            url,
                        });
                    }
                    None => nodes.push(InlineNode::Ref(tok)),
                },
                TokenKind::LBracket => match self.try_link() {
                    Some((label, url)) => nodes.push(InlineNode::Link { label, url }),
                    None => nodes.push(InlineNode::Text(tok.text)),
                },
                TokenKind::Bang => nodes.push(self.parse_bang(tok)),
                TokenKind::StrongMarker => self.parse_strong(tok, &mut nodes),
                TokenKind::EmphMarker => self.parse_emph(tok, &mut nodes),
                // Block-level tokens only reach here from a hand-built stream.
                _ => {
                    self.report(tok, format!("unexpected {}", tok.kind.describe()));
                    nodes.push(InlineNode::Text(tok.text));
                }
            }
        }

        (nodes, false)
    }

    fn report(&mut self, tok: Token<'a>, message: impl Into<String>) {
        self.diagnostics.report(
            DiagnosticKind::Syntax,
            tok.line,
            tok.column,
            Location::Token(tok.span),
            message,
        );
        self.faulted = true;
    }

    /// An unclosed `**` is reported once; a later unclosed `**` in the same
    /// run is taken as the stray closer of an earlier one, as in
    /// `*a **b* c**`.
    fn parse_strong(&mut self, opener: Token<'a>, nodes: &mut Vec<InlineNode<'a>>) {
        self.closers.push(TokenKind::StrongMarker);
        let (content, closed) = self.parse_nodes(Some(TokenKind::StrongMarker));
        self.closers.pop();

        if closed {
            self.pos += 1;
            nodes.push(InlineNode::Strong(content));
            return;
        }
        if self.orphaned_strong > 0 {
            self.orphaned_strong -= 1;
        } else {
            self.report(opener, "missing '**' to close strong emphasis");
            self.orphaned_strong += 1;
        }
        nodes.push(InlineNode::Text(opener.text));
        nodes.extend(content);
    }

    /// An unmatched `*` is literal text.
    fn parse_emph(&mut self, opener: Token<'a>, nodes: &mut Vec<InlineNode<'a>>) {
        self.closers.push(TokenKind::EmphMarker);
        let (content, closed) = self.parse_nodes(Some(TokenKind::EmphMarker));
        self.closers.pop();

        if closed {
            self.pos += 1;
            nodes.push(InlineNode::Emph(content));
        } else {
            nodes.push(InlineNode::Text(opener.text));
            nodes.extend(content);
        }
    }

    fn parse_bang(&mut self, bang: Token<'a>) -> InlineNode<'a> {
        match self.get(self.pos) {
            Some(next) if next.is(TokenKind::LBracket) => {
                self.pos += 1;
                if let Some((label, url)) = self.try_link() {
                    return InlineNode::Image { label, url };
                }
                self.pos -= 1;
            }
            Some(next) if next.is(TokenKind::Ref) => {
                if let Some((url, after)) = self.destination(self.pos + 1) {
                    self.pos = after;
                    return InlineNode::Image {
                        label: Label::Ref(next),
                        url,
                    };
                }
            }
            _ => {}
        }
        InlineNode::Text(bang.text)
    }

    /// `[label](url)` with the `[` already consumed. Leaves the cursor
    /// untouched when the brackets and parentheses do not line up, or when
    /// the label would nest past [`MAX_LABEL_DEPTH`].
    fn try_link(&mut self) -> Option<(Label<'a>, String)> {
        if self.depth >= MAX_LABEL_DEPTH {
            return None;
        }
        let label_start = self.pos;
        let label_end = self.index.closing_bracket[label_start - 1].filter(|&i| i < self.end)?;
        let (url, after) = self.destination(label_end + 1)?;

        let mut label = InlineParser::new(
            self.tokens,
            self.index,
            label_start,
            label_end,
            self.depth + 1,
            &mut *self.diagnostics,
        );
        let (nodes, _) = label.parse_nodes(None);
        self.faulted |= label.faulted;
        self.pos = after;
        Some((Label::Inlines(nodes), url))
    }

    /// `(url)` at `at`, on a single line. Returns the trimmed url and the
    /// index just past `)`.
    fn destination(&self, at: usize) -> Option<(String, usize)> {
        if !self.get(at)?.is(TokenKind::LParen) {
            return None;
        }
        let close = self.index.destination_stop[at + 1];
        if !self.get(close)?.is(TokenKind::RParen) {
            return None;
        }
        let url: String = self.tokens[at + 1..close].iter().map(|t| t.text).collect();
        Some((url.trim().to_string(), close + 1))
    }
}
