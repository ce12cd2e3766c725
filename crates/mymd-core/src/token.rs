//! Token types produced by the tokenizer.

use crate::span::Span;

/// Lexical category of a token.
///
/// Block-level kinds are only produced at the start of a line (after any
/// indentation); everything else may appear anywhere inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `---` delimited YAML block at the very start of the document.
    FrontMatter,
    /// Triple-backtick fenced region, both fences included.
    CodeBlock,
    /// `\begin{env}` ... `\end{env}` region.
    LatexEnv,
    /// `$$...$$`, possibly spanning lines.
    DisplayMath,
    /// Leading whitespace of a non-blank line.
    Indent,
    /// One to six `#` plus the whitespace after them.
    Heading,
    /// `>` plus optional whitespace.
    QuoteMarker,
    /// A line made of three or more `-`, `*` or `_`.
    HorizontalRule,
    /// `-` or `*` followed by whitespace.
    BulletMarker,
    /// `1.`, `a)`, `(iv)` and friends, followed by whitespace.
    OrderedMarker,
    /// `+` followed by whitespace.
    PlusMarker,
    /// `**`
    StrongMarker,
    /// `*`
    EmphMarker,
    /// `` `code` ``
    InlineCode,
    /// `$math$`
    InlineMath,
    /// `!`
    Bang,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[@id]`
    Citation,
    /// `[id]`
    Ref,
    /// Backslash followed by a character other than a letter or line end.
    Escaped,
    /// Backslash immediately followed by a line end.
    EscapedNewline,
    /// Backslash command such as `\ref{x}` or `\newpage`.
    RawLatex,
    /// Run of ordinary characters.
    Text,
    /// Run of spaces and tabs.
    Space,
    /// Single line end inside running text.
    SoftBreak,
    /// Line end followed by one or more blank lines.
    ParagraphEnd,
    /// End of input marker; always the last token.
    Eof,
}

impl TokenKind {
    /// Whether a token of this kind begins a block when it opens a line.
    pub fn starts_block(self) -> bool {
        matches!(
            self,
            TokenKind::FrontMatter
                | TokenKind::CodeBlock
                | TokenKind::LatexEnv
                | TokenKind::Heading
                | TokenKind::QuoteMarker
                | TokenKind::HorizontalRule
                | TokenKind::BulletMarker
                | TokenKind::OrderedMarker
                | TokenKind::PlusMarker
        )
    }

    /// Whether this kind terminates a line.
    pub fn ends_line(self) -> bool {
        matches!(
            self,
            TokenKind::SoftBreak | TokenKind::ParagraphEnd | TokenKind::Eof
        )
    }

    /// Human readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::FrontMatter => "front matter",
            TokenKind::CodeBlock => "code block",
            TokenKind::LatexEnv => "LaTeX environment",
            TokenKind::DisplayMath => "display math",
            TokenKind::Indent => "indentation",
            TokenKind::Heading => "heading marker",
            TokenKind::QuoteMarker => "'>'",
            TokenKind::HorizontalRule => "horizontal rule",
            TokenKind::BulletMarker => "bullet marker",
            TokenKind::OrderedMarker => "list marker",
            TokenKind::PlusMarker => "'+'",
            TokenKind::StrongMarker => "'**'",
            TokenKind::EmphMarker => "'*'",
            TokenKind::InlineCode => "inline code",
            TokenKind::InlineMath => "inline math",
            TokenKind::Bang => "'!'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Citation => "citation",
            TokenKind::Ref => "reference",
            TokenKind::Escaped => "escape sequence",
            TokenKind::EscapedNewline => "hard line break",
            TokenKind::RawLatex => "LaTeX command",
            TokenKind::Text => "text",
            TokenKind::Space => "whitespace",
            TokenKind::SoftBreak => "line break",
            TokenKind::ParagraphEnd => "blank line",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A lexical token borrowing its text from the source.
///
/// `line` and `column` are 0-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl<'a> Token<'a> {
    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
