//! Compile pipeline: tokenize, parse, visit, serialize.
//!
//! All-or-nothing with respect to the document. Any lexical or syntax
//! diagnostic suppresses the document; a failure while building the AST is
//! reported as a single unlocated diagnostic.

use serde::Serialize;
use tracing::debug;

use crate::ast::Document;
use crate::error::{CompileError, Diagnostic};
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::tree::DocumentNode;
use crate::visitor::visit;

/// Outcome of one compile call.
///
/// `diagnostics` is empty exactly when `document` and `document_json` are
/// present.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    #[serde(skip)]
    pub document: Option<Document>,
    pub document_json: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            document: None,
            document_json: None,
            diagnostics,
        }
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    recover: bool,
    pretty: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            recover: true,
            pretty: false,
        }
    }

    /// Keep parsing after a syntax error (the default). When disabled the
    /// first syntax error ends parsing.
    pub fn with_recovery(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    /// Indent the serialized document.
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn compile(&self, source: &str) -> CompilationResult {
        let stream = tokenize(source);
        debug!(
            tokens = stream.tokens.len(),
            errors = stream.diagnostics.len(),
            "tokenized"
        );

        let parsed = Parser::new(stream).with_recovery(self.recover).parse();
        debug!(
            blocks = parsed.tree.blocks.len(),
            errors = parsed.diagnostics.len(),
            "parsed"
        );
        if !parsed.is_ok() {
            return CompilationResult::failed(parsed.diagnostics.into_vec());
        }

        match self.build(&parsed.tree) {
            Ok((document, json)) => {
                debug!(bytes = json.len(), "serialized");
                CompilationResult {
                    document: Some(document),
                    document_json: Some(json),
                    diagnostics: Vec::new(),
                }
            }
            Err(error) => {
                debug!(%error, "compilation aborted");
                CompilationResult::failed(vec![Diagnostic::from_compile_error(&error)])
            }
        }
    }

    fn build(&self, tree: &DocumentNode<'_>) -> Result<(Document, String), CompileError> {
        let document = visit(tree)?;
        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok((document, json))
    }
}

/// Compile with the default configuration.
pub fn compile(source: &str) -> CompilationResult {
    Compiler::new().compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    #[test]
    fn success_carries_document_and_json() {
        let result = compile("Hello world");
        assert!(!result.has_errors());
        assert_eq!(result.document.as_ref().map(|d| d.blocks.len()), Some(1));
        let json = result.document_json.unwrap();
        assert!(json.starts_with(r#"{"pandoc-api-version":[1,23,1],"meta":{},"blocks":["#));
    }

    #[test]
    fn syntax_errors_suppress_the_document() {
        let result = compile("**open\n\n**again");
        assert!(result.document.is_none());
        assert!(result.document_json.is_none());
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::Syntax));
    }

    #[test]
    fn without_recovery_only_the_first_error_is_reported() {
        let result = Compiler::new()
            .with_recovery(false)
            .compile("**open\n\n**again");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn semantic_failure_is_one_unlocated_diagnostic() {
        let result = compile("1. one\na) two");
        assert!(result.document.is_none());
        let [d] = &result.diagnostics[..] else {
            panic!("expected one diagnostic, got {:?}", result.diagnostics);
        };
        assert_eq!(d.kind, DiagnosticKind::Semantic);
        assert!(d.message.starts_with("Compiler Error: list marker mismatch"));
        assert_eq!((d.line, d.column, d.start_index, d.end_index), (0, 0, 0, 0));
    }

    #[test]
    fn pretty_json_has_the_same_structure() {
        let compact = compile("# T\n\ntext").document_json.unwrap();
        let pretty = Compiler::new()
            .with_pretty_json(true)
            .compile("# T\n\ntext")
            .document_json
            .unwrap();
        assert!(pretty.contains('\n'));
        let a: serde_json::Value = serde_json::from_str(&compact).unwrap();
        let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(a, b);
    }
}
