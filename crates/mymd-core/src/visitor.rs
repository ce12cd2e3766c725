//! Parse tree to document AST.
//!
//! A plain match over node kinds. The walk threads the document under
//! construction through a fold instead of keeping state on a visitor
//! object, so there is nothing to reset between documents. The first
//! failure aborts the whole walk.

use crate::ast::{Block, Document, Inline, MathType, LATEX};
use crate::error::CompileError;
use crate::list_marker::resolve_list;
use crate::meta::parse_front_matter;
use crate::token::{Token, TokenKind};
use crate::tree::{BlockNode, DocumentNode, InlineNode, Label, ListItemNode};

/// Build the document for a tree that parsed without diagnostics.
pub fn visit(tree: &DocumentNode<'_>) -> Result<Document, CompileError> {
    let mut document = Document::default();
    if let Some(front_matter) = tree.front_matter {
        for (key, value) in parse_front_matter(front_matter.text) {
            document.meta.insert(key, value);
        }
    }

    tree.blocks.iter().try_fold(document, |mut document, node| {
        document.blocks.push(block(node)?);
        Ok(document)
    })
}

fn blocks(nodes: &[BlockNode<'_>]) -> Result<Vec<Block>, CompileError> {
    nodes.iter().map(block).collect()
}

fn block(node: &BlockNode<'_>) -> Result<Block, CompileError> {
    Ok(match node {
        BlockNode::Heading { marker, content } => {
            let level = marker.text.bytes().take_while(|&b| b == b'#').count() as u8;
            let mut content = inline_run(content);
            label_heading(&mut content);
            Block::Header { level, content }
        }
        BlockNode::Paragraph(content) => Block::Para(inline_run(content)),
        BlockNode::CodeBlock(tok) => code_block(tok.text),
        BlockNode::LatexEnv(tok) => Block::raw_latex(tok.text),
        BlockNode::BlockMath { math, label } => {
            let mut text = delimited(math.text, 2).trim().to_string();
            if let Some(label) = label {
                text.push_str(&format!(" \\label{{{}}}", delimited(label.text, 1)));
            }
            Block::Para(vec![Inline::Math {
                kind: MathType::DisplayMath,
                text,
            }])
        }
        BlockNode::Quote(content) => {
            let content = inline_run(content);
            if content.is_empty() {
                Block::BlockQuote(Vec::new())
            } else {
                Block::BlockQuote(vec![Block::Para(content)])
            }
        }
        BlockNode::HorizontalRule(_) => Block::HorizontalRule,
        BlockNode::BulletList(items) => {
            Block::BulletList(items.iter().map(list_item).collect::<Result<_, _>>()?)
        }
        BlockNode::OrderedList(items) => {
            let attrs = resolve_list(items.iter().map(|item| item.marker.text))?;
            Block::OrderedList {
                attrs,
                items: items.iter().map(list_item).collect::<Result<_, _>>()?,
            }
        }
    })
}

/// Head paragraph (omitted when empty) followed by the nested blocks.
fn list_item(item: &ListItemNode<'_>) -> Result<Vec<Block>, CompileError> {
    let head = inline_run(&item.head);
    let mut out = Vec::with_capacity(item.body.len() + 1);
    if !head.is_empty() {
        out.push(Block::Para(head));
    }
    out.extend(blocks(&item.body)?);
    Ok(out)
}

/// Fence line tag is the language; the rest, minus the line breaks next to
/// the fences, is the code.
fn code_block(text: &str) -> Block {
    let inner = delimited(text, 3);
    let Some((first, rest)) = inner.split_once('\n') else {
        return Block::CodeBlock {
            language: String::new(),
            text: inner.to_string(),
        };
    };
    let code = match rest.rfind('\n') {
        Some(i) if rest[i + 1..].trim().is_empty() => &rest[..i],
        _ if rest.trim().is_empty() => "",
        _ => rest,
    };
    Block::CodeBlock {
        language: first.trim().to_string(),
        text: code.trim_end_matches('\r').to_string(),
    }
}

/// A trailing `\ref{id}` in a heading becomes the heading's `\label{id}`.
fn label_heading(content: &mut [Inline]) {
    if let Some(Inline::RawInline { format, text }) = content.last_mut() {
        if format == LATEX {
            if let Some(id) = text.strip_prefix("\\ref{").and_then(|t| t.strip_suffix('}')) {
                *text = format!("\\label{{{id}}}");
            }
        }
    }
}

/// Strip `n` delimiter bytes from both ends of a token's text.
fn delimited(text: &str, n: usize) -> &str {
    text.get(n..text.len().saturating_sub(n)).unwrap_or("")
}

// ----------------------------------------------------------------------
// Inlines
// ----------------------------------------------------------------------

/// Block-level inline content: normalized and trimmed of outer spaces.
fn inline_run(nodes: &[InlineNode<'_>]) -> Vec<Inline> {
    let mut out = inlines(nodes);
    while matches!(out.last(), Some(Inline::Space)) {
        out.pop();
    }
    let leading = out.iter().take_while(|i| matches!(i, Inline::Space)).count();
    out.drain(..leading);
    out
}

/// Convert nodes, merging adjacent text and collapsing whitespace.
fn inlines(nodes: &[InlineNode<'_>]) -> Vec<Inline> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        push_inline(&mut out, inline(node));
    }
    out
}

fn push_inline(out: &mut Vec<Inline>, inline: Inline) {
    match inline {
        Inline::Str(text) => {
            if let Some(Inline::Str(prev)) = out.last_mut() {
                prev.push_str(&text);
            } else {
                out.push(Inline::Str(text));
            }
        }
        Inline::Space => {
            if !matches!(out.last(), Some(Inline::Space | Inline::LineBreak)) {
                out.push(Inline::Space);
            }
        }
        Inline::LineBreak => {
            if matches!(out.last(), Some(Inline::Space)) {
                out.pop();
            }
            out.push(Inline::LineBreak);
        }
        other => out.push(other),
    }
}

fn inline(node: &InlineNode<'_>) -> Inline {
    match node {
        InlineNode::Text(text) => Inline::str(*text),
        InlineNode::Space | InlineNode::SoftBreak => Inline::Space,
        InlineNode::HardBreak => Inline::LineBreak,
        InlineNode::Escaped(tok) => Inline::str(&tok.text[1..]),
        InlineNode::RawLatex(tok) => Inline::raw_latex(tok.text),
        InlineNode::Code(tok) => Inline::Code(delimited(tok.text, 1).to_string()),
        InlineNode::Math(tok) => math(tok),
        InlineNode::Citation(tok) => Inline::cite(delimited(tok.text, 1).trim_start_matches('@')),
        InlineNode::Ref(tok) => Inline::raw_latex(format!("\\ref{{{}}}", delimited(tok.text, 1))),
        InlineNode::Strong(content) => Inline::Strong(inlines(content)),
        InlineNode::Emph(content) => Inline::Emph(inlines(content)),
        InlineNode::Link { label, url } => Inline::Link {
            content: label_content(label),
            url: url.clone(),
        },
        InlineNode::Image { label, url } => Inline::Image {
            alt: label_content(label),
            url: url.clone(),
        },
    }
}

fn math(tok: &Token<'_>) -> Inline {
    if tok.is(TokenKind::DisplayMath) {
        Inline::Math {
            kind: MathType::DisplayMath,
            text: delimited(tok.text, 2).trim().to_string(),
        }
    } else {
        Inline::Math {
            kind: MathType::InlineMath,
            text: delimited(tok.text, 1).to_string(),
        }
    }
}

fn label_content(label: &Label<'_>) -> Vec<Inline> {
    match label {
        Label::Inlines(nodes) => inlines(nodes),
        Label::Ref(tok) => vec![Inline::str(delimited(tok.text, 1))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ListAttributes, ListNumberDelim, ListNumberStyle, MetaValue};
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn compile(input: &str) -> Result<Document, CompileError> {
        let output = parse(tokenize(input));
        assert!(output.is_ok(), "unexpected diagnostics: {:?}", output.diagnostics);
        visit(&output.tree)
    }

    fn blocks_of(input: &str) -> Vec<Block> {
        compile(input).unwrap().blocks
    }

    fn s(text: &str) -> Inline {
        Inline::str(text)
    }

    #[test]
    fn paragraph_words() {
        assert_eq!(
            blocks_of("Hello world"),
            [Block::Para(vec![s("Hello"), Inline::Space, s("world")])]
        );
    }

    #[test]
    fn soft_breaks_become_spaces() {
        assert_eq!(
            blocks_of("one  \ntwo"),
            [Block::Para(vec![s("one"), Inline::Space, s("two")])]
        );
    }

    #[test]
    fn hard_break() {
        assert_eq!(
            blocks_of("one\\\ntwo"),
            [Block::Para(vec![s("one"), Inline::LineBreak, s("two")])]
        );
    }

    #[test]
    fn escapes_never_format() {
        assert_eq!(
            blocks_of("\\*not italic\\*"),
            [Block::Para(vec![s("*not"), Inline::Space, s("italic*")])]
        );
    }

    #[test]
    fn punctuation_merges_into_text() {
        assert_eq!(
            blocks_of("Wow! (really) [sic"),
            [Block::Para(vec![
                s("Wow!"),
                Inline::Space,
                s("(really)"),
                Inline::Space,
                s("[sic")
            ])]
        );
    }

    #[test]
    fn heading_levels() {
        assert_eq!(
            blocks_of("### My Title"),
            [Block::Header {
                level: 3,
                content: vec![s("My"), Inline::Space, s("Title")]
            }]
        );
    }

    #[test]
    fn heading_reference_becomes_label() {
        assert_eq!(
            blocks_of("# Intro [sec:intro]  "),
            [Block::Header {
                level: 1,
                content: vec![s("Intro"), Inline::Space, Inline::raw_latex("\\label{sec:intro}")]
            }]
        );
        assert_eq!(
            blocks_of("# Intro \\ref{a}"),
            [Block::Header {
                level: 1,
                content: vec![s("Intro"), Inline::Space, Inline::raw_latex("\\label{a}")]
            }]
        );
    }

    #[test]
    fn references_elsewhere_stay_refs() {
        assert_eq!(
            blocks_of("# [a] heading\n\nSee [fig:1]."),
            [
                Block::Header {
                    level: 1,
                    content: vec![Inline::raw_latex("\\ref{a}"), Inline::Space, s("heading")]
                },
                Block::Para(vec![
                    s("See"),
                    Inline::Space,
                    Inline::raw_latex("\\ref{fig:1}"),
                    s(".")
                ])
            ]
        );
    }

    #[test]
    fn code_blocks() {
        assert_eq!(
            blocks_of("```python\nprint(1)\nprint(2)\n```"),
            [Block::CodeBlock {
                language: "python".into(),
                text: "print(1)\nprint(2)".into()
            }]
        );
        assert_eq!(
            blocks_of("```\n  indented\n```"),
            [Block::CodeBlock {
                language: String::new(),
                text: "  indented".into()
            }]
        );
        assert_eq!(
            blocks_of("```\n```"),
            [Block::CodeBlock {
                language: String::new(),
                text: String::new()
            }]
        );
    }

    #[test]
    fn code_block_without_line_break() {
        assert_eq!(
            code_block("```x```"),
            Block::CodeBlock {
                language: String::new(),
                text: "x".into()
            }
        );
    }

    #[test]
    fn math() {
        assert_eq!(
            blocks_of("$$\n  a + b\n$$"),
            [Block::Para(vec![Inline::Math {
                kind: MathType::DisplayMath,
                text: "a + b".into()
            }])]
        );
        assert_eq!(
            blocks_of("$$ x $$ [eq:a]"),
            [Block::Para(vec![Inline::Math {
                kind: MathType::DisplayMath,
                text: "x \\label{eq:a}".into()
            }])]
        );
        assert_eq!(
            blocks_of("so $ x $ holds"),
            [Block::Para(vec![
                s("so"),
                Inline::Space,
                Inline::Math {
                    kind: MathType::InlineMath,
                    text: " x ".into()
                },
                Inline::Space,
                s("holds")
            ])]
        );
    }

    #[test]
    fn latex_environment_is_raw_block() {
        let input = "\\begin{center}\nhi\n\\end{center}";
        assert_eq!(blocks_of(input), [Block::raw_latex(input)]);
    }

    #[test]
    fn citations_and_code() {
        assert_eq!(
            blocks_of("`x` [@doe99]"),
            [Block::Para(vec![
                Inline::Code("x".into()),
                Inline::Space,
                Inline::cite("doe99")
            ])]
        );
    }

    #[test]
    fn links_and_images() {
        assert_eq!(
            blocks_of("[the *site*](https://e.com) ![fig1](f.png)"),
            [Block::Para(vec![
                Inline::Link {
                    content: vec![s("the"), Inline::Space, Inline::Emph(vec![s("site")])],
                    url: "https://e.com".into()
                },
                Inline::Space,
                Inline::Image {
                    alt: vec![s("fig1")],
                    url: "f.png".into()
                }
            ])]
        );
    }

    #[test]
    fn quotes() {
        assert_eq!(
            blocks_of("> a\n> b"),
            [Block::BlockQuote(vec![Block::Para(vec![
                s("a"),
                Inline::Space,
                s("b")
            ])])]
        );
        assert_eq!(blocks_of(">"), [Block::BlockQuote(vec![])]);
    }

    #[test]
    fn ordered_list_attributes() {
        let doc = blocks_of("(iv) a\n(v) b");
        let Block::OrderedList { attrs, items } = &doc[0] else {
            panic!("expected ordered list, got {doc:?}");
        };
        assert_eq!(
            *attrs,
            ListAttributes {
                start: 4,
                style: ListNumberStyle::LowerRoman,
                delim: ListNumberDelim::TwoParens
            }
        );
        assert_eq!(items[1], vec![Block::Para(vec![s("b")])]);
    }

    #[test]
    fn continuation_only_list_uses_defaults() {
        let doc = blocks_of("+ a\n+ b");
        assert!(matches!(
            &doc[0],
            Block::OrderedList { attrs, .. } if *attrs == ListAttributes::default()
        ));
    }

    #[test]
    fn list_marker_mismatch_aborts() {
        let err = compile("1. a\nb) b").unwrap_err();
        assert!(matches!(err, CompileError::ListMarkerMismatch { .. }));
    }

    #[test]
    fn list_items_with_bodies() {
        assert_eq!(
            blocks_of("- a\n  - b\n\n  more\n- c"),
            [Block::BulletList(vec![
                vec![
                    Block::Para(vec![s("a")]),
                    Block::BulletList(vec![vec![Block::Para(vec![s("b")])]]),
                    Block::Para(vec![s("more")]),
                ],
                vec![Block::Para(vec![s("c")])],
            ])]
        );
    }

    #[test]
    fn front_matter_becomes_meta() {
        let doc = compile("---\ntitle: Test\ntags: [a, b]\n---\n# H").unwrap();
        assert_eq!(doc.meta["title"], MetaValue::MetaString("Test".into()));
        assert_eq!(
            doc.meta["tags"],
            MetaValue::MetaList(vec![
                MetaValue::MetaString("a".into()),
                MetaValue::MetaString("b".into())
            ])
        );
        assert_eq!(doc.blocks.len(), 1);
    }
}
