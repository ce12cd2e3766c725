//! Concrete parse tree.
//!
//! Nodes keep the tokens they were built from; the visitor decides how token
//! text turns into document content. A tree only lives for one compile call.

use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode<'a> {
    pub front_matter: Option<Token<'a>>,
    pub blocks: Vec<BlockNode<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockNode<'a> {
    Heading {
        marker: Token<'a>,
        content: Vec<InlineNode<'a>>,
    },
    Paragraph(Vec<InlineNode<'a>>),
    CodeBlock(Token<'a>),
    LatexEnv(Token<'a>),
    /// `$$...$$` alone on its line, with an optional `[label]`.
    BlockMath {
        math: Token<'a>,
        label: Option<Token<'a>>,
    },
    /// Consecutive `>` lines, joined by soft breaks.
    Quote(Vec<InlineNode<'a>>),
    HorizontalRule(Token<'a>),
    BulletList(Vec<ListItemNode<'a>>),
    OrderedList(Vec<ListItemNode<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItemNode<'a> {
    pub marker: Token<'a>,
    /// Inline run on the marker line and its indented continuation lines.
    pub head: Vec<InlineNode<'a>>,
    /// Blocks indented past the marker.
    pub body: Vec<BlockNode<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode<'a> {
    /// Plain text, including punctuation that did not form a construct.
    Text(&'a str),
    Space,
    SoftBreak,
    HardBreak,
    Escaped(Token<'a>),
    RawLatex(Token<'a>),
    Code(Token<'a>),
    /// Inline or display math, told apart by the token kind.
    Math(Token<'a>),
    Citation(Token<'a>),
    Ref(Token<'a>),
    Strong(Vec<InlineNode<'a>>),
    Emph(Vec<InlineNode<'a>>),
    Link { label: Label<'a>, url: String },
    Image { label: Label<'a>, url: String },
}

/// Bracketed part of a link or image.
#[derive(Debug, Clone, PartialEq)]
pub enum Label<'a> {
    /// `[some *inline* text]`
    Inlines(Vec<InlineNode<'a>>),
    /// `[id]`
    Ref(Token<'a>),
}
