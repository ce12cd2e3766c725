//! # MyMD Core
//!
//! Compiler for MyMD, a Markdown dialect for academic writing with LaTeX
//! pass-through, citations and cross-references.
//!
//! Source text is compiled into the JSON document tree accepted by Pandoc,
//! together with precisely located diagnostics for editor tooling.
//!
//! ## Quick Start
//!
//! ```rust
//! use mymd_core::compile;
//!
//! let input = "# Results [sec:results]\n\nAs shown by [@knuth84], $x^2$ grows.";
//! let result = compile(input);
//!
//! assert!(result.diagnostics.is_empty());
//! println!("{}", result.document_json.unwrap());
//! ```
//!
//! ## Diagnostics
//!
//! Lexical and syntax errors are collected; any of them suppresses the
//! document:
//!
//! ```rust
//! use mymd_core::Compiler;
//!
//! let result = Compiler::new().compile("**never closed\n\n# \n");
//!
//! assert!(result.document.is_none());
//! for d in &result.diagnostics {
//!     println!("{d} [{}..{}]", d.start_index, d.end_index);
//! }
//! ```
//!
//! ## Pipeline
//!
//! - [`lexer`] turns source text into tokens
//! - [`parser`] and [`inline`] build the parse tree
//! - [`visitor`] maps the tree to the [`ast`] document
//! - [`compiler`] ties the stages together and serializes the result

pub mod ast;
pub mod compiler;
pub mod error;
pub mod inline;
pub mod lexer;
pub mod list_marker;
pub mod meta;
pub mod parser;
pub mod span;
pub mod token;
pub mod tree;
pub mod visitor;

pub use ast::{Block, Document, Inline, MetaValue};
pub use compiler::{compile, CompilationResult, Compiler};
pub use error::{CompileError, Diagnostic, DiagnosticKind, Diagnostics};
pub use parser::{ParseOutput, Parser};
pub use span::Span;
