//! Document AST mirroring the Pandoc JSON schema.
//!
//! Every node serializes as `{"t": Tag, "c": content}` with the content
//! shape fixed by the tag. Zero-content tags (`Space`, `LineBreak`,
//! `HorizontalRule`) omit `"c"` entirely. The external conversion engine
//! rejects anything else, so the shapes below are written out by hand
//! instead of relying on serde's enum representations.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// The Pandoc API version this AST targets.
pub const PANDOC_API_VERSION: [u32; 3] = [1, 23, 1];

/// Format name used for raw LaTeX pass-through nodes.
pub const LATEX: &str = "latex";

/// Document metadata keyed by front-matter field name.
pub type Meta = IndexMap<String, MetaValue>;

/// A complete document: API version, metadata and content blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "pandoc-api-version")]
    pub api_version: [u32; 3],
    pub meta: Meta,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(meta: Meta, blocks: Vec<Block>) -> Self {
        Self {
            api_version: PANDOC_API_VERSION,
            meta,
            blocks,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Meta::new(), Vec::new())
    }
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Section heading; `level` is 1 to 6.
    Header { level: u8, content: Vec<Inline> },
    Para(Vec<Inline>),
    /// Fenced code; `language` is empty when the fence has no tag.
    CodeBlock { language: String, text: String },
    BulletList(Vec<Vec<Block>>),
    OrderedList {
        attrs: ListAttributes,
        items: Vec<Vec<Block>>,
    },
    BlockQuote(Vec<Block>),
    HorizontalRule,
    RawBlock { format: String, text: String },
}

impl Block {
    /// Raw LaTeX block.
    pub fn raw_latex(text: impl Into<String>) -> Self {
        Block::RawBlock {
            format: LATEX.to_string(),
            text: text.into(),
        }
    }
}

/// Inline nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Str(String),
    Space,
    LineBreak,
    Strong(Vec<Inline>),
    Emph(Vec<Inline>),
    Code(String),
    Math { kind: MathType, text: String },
    Link { content: Vec<Inline>, url: String },
    Image { alt: Vec<Inline>, url: String },
    /// Citation plus the literal text a consumer can fall back to.
    Cite {
        citation: Citation,
        fallback: Vec<Inline>,
    },
    RawInline { format: String, text: String },
}

impl Inline {
    pub fn str(text: impl Into<String>) -> Self {
        Inline::Str(text.into())
    }

    /// Raw LaTeX inline.
    pub fn raw_latex(text: impl Into<String>) -> Self {
        Inline::RawInline {
            format: LATEX.to_string(),
            text: text.into(),
        }
    }

    /// `[@id]` citation with a literal `[@id]` fallback rendering.
    pub fn cite(id: impl Into<String>) -> Self {
        let id = id.into();
        let fallback = vec![Inline::Str(format!("[@{id}]"))];
        Inline::Cite {
            citation: Citation::new(id),
            fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "t")]
pub enum MathType {
    InlineMath,
    DisplayMath,
}

/// Structured citation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub citation_id: String,
    pub citation_prefix: Vec<Inline>,
    pub citation_suffix: Vec<Inline>,
    pub citation_mode: CitationMode,
    pub citation_note_num: i32,
    pub citation_hash: i32,
}

impl Citation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            citation_id: id.into(),
            citation_prefix: Vec::new(),
            citation_suffix: Vec::new(),
            citation_mode: CitationMode::NormalCitation,
            citation_note_num: 1,
            citation_hash: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "t")]
pub enum CitationMode {
    AuthorInText,
    SuppressAuthor,
    NormalCitation,
}

/// Numbering alphabet of an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "t")]
pub enum ListNumberStyle {
    DefaultStyle,
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
}

/// Punctuation around an ordered list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "t")]
pub enum ListNumberDelim {
    DefaultDelim,
    Period,
    OneParen,
    TwoParens,
}

/// `[start, style, delim]` attributes of an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAttributes {
    pub start: i64,
    pub style: ListNumberStyle,
    pub delim: ListNumberDelim,
}

impl Default for ListAttributes {
    fn default() -> Self {
        Self {
            start: 1,
            style: ListNumberStyle::Decimal,
            delim: ListNumberDelim::Period,
        }
    }
}

impl Serialize for ListAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start, self.style, self.delim).serialize(serializer)
    }
}

/// Metadata values built from front matter.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    MetaBool(bool),
    MetaString(String),
    MetaList(Vec<MetaValue>),
    MetaMap(IndexMap<String, MetaValue>),
    MetaInlines(Vec<Inline>),
}

// ----------------------------------------------------------------------------
// Wire format
// ----------------------------------------------------------------------------

const NO_KEY_VALUES: [(&str, &str); 0] = [];

/// `[identifier, classes, key-values]` with only classes ever populated.
fn attr(classes: &[&str]) -> (&'static str, Vec<String>, [(&'static str, &'static str); 0]) {
    (
        "",
        classes.iter().map(|c| c.to_string()).collect(),
        NO_KEY_VALUES,
    )
}

fn tagged<S, C>(serializer: S, tag: &str, content: Option<&C>) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    C: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(if content.is_some() { 2 } else { 1 }))?;
    map.serialize_entry("t", tag)?;
    if let Some(content) = content {
        map.serialize_entry("c", content)?;
    }
    map.end()
}

fn bare<S: Serializer>(serializer: S, tag: &str) -> Result<S::Ok, S::Error> {
    tagged::<S, ()>(serializer, tag, None)
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Block::Header { level, content } => {
                tagged(serializer, "Header", Some(&(level, attr(&[]), content)))
            }
            Block::Para(content) => tagged(serializer, "Para", Some(content)),
            Block::CodeBlock { language, text } => {
                let classes: &[&str] = if language.is_empty() {
                    &[]
                } else {
                    &[language.as_str()]
                };
                tagged(serializer, "CodeBlock", Some(&(attr(classes), text)))
            }
            Block::BulletList(items) => tagged(serializer, "BulletList", Some(items)),
            Block::OrderedList { attrs, items } => {
                tagged(serializer, "OrderedList", Some(&(attrs, items)))
            }
            Block::BlockQuote(content) => tagged(serializer, "BlockQuote", Some(content)),
            Block::HorizontalRule => bare(serializer, "HorizontalRule"),
            Block::RawBlock { format, text } => {
                tagged(serializer, "RawBlock", Some(&(format, text)))
            }
        }
    }
}

impl Serialize for Inline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Inline::Str(text) => tagged(serializer, "Str", Some(text)),
            Inline::Space => bare(serializer, "Space"),
            Inline::LineBreak => bare(serializer, "LineBreak"),
            Inline::Strong(content) => tagged(serializer, "Strong", Some(content)),
            Inline::Emph(content) => tagged(serializer, "Emph", Some(content)),
            Inline::Code(text) => tagged(serializer, "Code", Some(&(attr(&[]), text))),
            Inline::Math { kind, text } => tagged(serializer, "Math", Some(&(kind, text))),
            Inline::Link { content, url } => tagged(
                serializer,
                "Link",
                Some(&(attr(&[]), content, (url, ""))),
            ),
            Inline::Image { alt, url } => tagged(
                serializer,
                "Image",
                Some(&(attr(&[]), alt, (url, "fig:"))),
            ),
            Inline::Cite { citation, fallback } => {
                tagged(serializer, "Cite", Some(&([citation], fallback)))
            }
            Inline::RawInline { format, text } => {
                tagged(serializer, "RawInline", Some(&(format, text)))
            }
        }
    }
}

impl Serialize for MetaValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetaValue::MetaBool(value) => tagged(serializer, "MetaBool", Some(value)),
            MetaValue::MetaString(value) => tagged(serializer, "MetaString", Some(value)),
            MetaValue::MetaList(items) => tagged(serializer, "MetaList", Some(items)),
            MetaValue::MetaMap(entries) => tagged(serializer, "MetaMap", Some(entries)),
            MetaValue::MetaInlines(content) => tagged(serializer, "MetaInlines", Some(content)),
        }
    }
}
