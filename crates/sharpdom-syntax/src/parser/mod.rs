// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser with error recovery.
//!
//! The parser never fails. When a required token is absent it inserts a
//! missing token; when nothing sensible can be parsed it wraps the skipped
//! tokens in an `Error` node. Each recovery records a [`Diagnostic`].
//! Every token the tokenizer produced ends up somewhere in the tree, so code
//! generation reproduces the input exactly even for malformed source.

mod decl;
mod expr;
mod stmt;

use std::sync::Arc;

use crate::kind::{is_predefined_type, SyntaxKind, TokenKind};
use crate::tokenizer::tokenize;
use crate::tree::{Diagnostic, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree};

/// Keywords where recovery stops skipping tokens.
const RECOVERY_POINTS: &[&str] = &[
    "class", "struct", "interface", "enum", "namespace", "using", "public", "private",
    "protected", "internal", "static", "abstract", "void", "if", "for", "while", "return",
];

pub(crate) struct Parser {
    tokens: Vec<SyntaxToken>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub(crate) fn new(source: &str) -> Self {
        let (tokens, diagnostics) = tokenize(source);
        Parser {
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    fn finish(self, source: &str, root: Arc<SyntaxNode>) -> SyntaxTree {
        SyntaxTree::new(source, root, self.diagnostics)
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    /// Token at absolute index `i`, clamped to the end-of-file token.
    fn token_at(&self, i: usize) -> &SyntaxToken {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[i.min(last)]
    }

    fn nth(&self, n: usize) -> &SyntaxToken {
        self.token_at(self.pos + n)
    }

    fn current(&self) -> &SyntaxToken {
        self.nth(0)
    }

    fn nth_at(&self, n: usize, text: &str) -> bool {
        let token = self.nth(n);
        matches!(
            token.kind(),
            TokenKind::Punctuation | TokenKind::Keyword | TokenKind::Identifier
        ) && token.text() == text
    }

    fn at(&self, text: &str) -> bool {
        self.nth_at(0, text)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current().kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.at_kind(TokenKind::EndOfFile)
    }

    /// Current token is a built-in type keyword or an identifier.
    fn at_type_start(&self) -> bool {
        is_type_start(self.current())
    }

    fn bump(&mut self) -> SyntaxElement {
        let token = self.current().clone();
        if token.kind() != TokenKind::EndOfFile {
            self.pos += 1;
        }
        token.into()
    }

    fn expect(&mut self, text: &str) -> SyntaxElement {
        if self.at(text) {
            self.bump()
        } else {
            self.missing(TokenKind::Punctuation, format!("expected `{}`", text))
        }
    }

    fn expect_identifier(&mut self) -> SyntaxElement {
        if self.at_kind(TokenKind::Identifier) {
            self.bump()
        } else {
            self.missing(TokenKind::Identifier, "expected identifier".to_string())
        }
    }

    fn missing(&mut self, kind: TokenKind, message: String) -> SyntaxElement {
        let offset = self.current().offset();
        self.error_at_current(message);
        SyntaxToken::missing(kind, offset).into()
    }

    fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current().span();
        let message = message.into();
        let found = self.current().text();
        let message = if found.is_empty() {
            format!("{}, found end of input", message)
        } else {
            format!("{}, found `{}`", message, found)
        };
        self.diagnostics.push(Diagnostic::new(message, span));
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Skip tokens into an `Error` node, starting with `prefix`.
    ///
    /// Stops after a `;` or a balanced `{ ... }`, or before an unbalanced
    /// `}` or a recovery keyword. At least one token is consumed unless the
    /// prefix already holds real tokens or input is exhausted.
    fn recover(&mut self, message: &str, mut children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
        self.error_at_current(message);
        let mut consumed = children.iter().any(element_has_tokens);
        while !self.at_eof() {
            if consumed && (self.at("}") || self.at_recovery_point()) {
                break;
            }
            if self.at("{") {
                self.skip_balanced(&mut children);
                break;
            }
            let semicolon = self.at(";");
            children.push(self.bump());
            consumed = true;
            if semicolon {
                break;
            }
        }
        SyntaxNode::new(SyntaxKind::Error, children)
    }

    fn at_recovery_point(&self) -> bool {
        let token = self.current();
        token.kind() == TokenKind::Keyword && RECOVERY_POINTS.contains(&token.text())
    }

    fn skip_balanced(&mut self, out: &mut Vec<SyntaxElement>) {
        let mut depth = 0usize;
        while !self.at_eof() {
            if self.at("{") {
                depth += 1;
            } else if self.at("}") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push(self.bump());
                    return;
                }
            }
            out.push(self.bump());
        }
    }

    // ------------------------------------------------------------------
    // Lookahead without consuming
    // ------------------------------------------------------------------

    /// Scan a type starting at absolute index `i`; returns the index after
    /// it, or `None` if the tokens there do not form a type.
    fn scan_type(&self, i: usize) -> Option<usize> {
        if !is_type_start(self.token_at(i)) {
            return None;
        }
        let mut i = i + 1;
        loop {
            if self.token_at(i).is(".") && self.token_at(i + 1).kind() == TokenKind::Identifier {
                i += 2;
            } else if self.token_at(i).is("<") {
                i = self.scan_type(i + 1)?;
                while self.token_at(i).is(",") {
                    i = self.scan_type(i + 1)?;
                }
                if !self.token_at(i).is(">") {
                    return None;
                }
                i += 1;
            } else {
                break;
            }
        }
        while self.token_at(i).is("[") {
            let mut j = i + 1;
            while self.token_at(j).is(",") {
                j += 1;
            }
            if !self.token_at(j).is("]") {
                break;
            }
            i = j + 1;
        }
        if self.token_at(i).is("?") {
            i += 1;
        }
        Some(i)
    }

    /// `Type name =`, `Type name;` or `Type name,` ahead.
    fn looks_like_local_declaration(&self) -> bool {
        let Some(end) = self.scan_type(self.pos) else {
            return false;
        };
        let name = self.token_at(end);
        let next = self.token_at(end + 1);
        name.kind() == TokenKind::Identifier
            && (next.is("=") || next.is(";") || next.is(","))
    }
}

fn is_type_start(token: &SyntaxToken) -> bool {
    match token.kind() {
        TokenKind::Identifier => true,
        TokenKind::Keyword => is_predefined_type(token.text()),
        _ => false,
    }
}

fn element_has_tokens(element: &SyntaxElement) -> bool {
    match element {
        SyntaxElement::Token(token) => !token.is_missing(),
        SyntaxElement::Node(node) => node.tokens().iter().any(|t| !t.is_missing()),
    }
}

// ============================================================================
// Parsing functions
// ============================================================================

/// Parses a complete source file.
///
/// The root is a `CompilationUnit` whose last child is the end-of-file token.
///
/// # Example
///
/// ```
/// use sharpdom_syntax::parse_compilation_unit;
///
/// let source = "namespace N { public class C { } }\n";
/// let tree = parse_compilation_unit(source);
/// assert!(!tree.has_errors());
/// assert_eq!(tree.root().text(), source);
/// ```
pub fn parse_compilation_unit(source: &str) -> SyntaxTree {
    let mut parser = Parser::new(source);
    let root = parser.compilation_unit();
    tracing::trace!(
        diagnostics = parser.diagnostics.len(),
        "parsed compilation unit"
    );
    parser.finish(source, root)
}

/// Parses a single type member (method, property, field, nested type).
pub fn parse_member(source: &str) -> SyntaxTree {
    let mut parser = Parser::new(source);
    let root = parser.member_declaration(true);
    finish_fragment(parser, source, root)
}

/// Parses a single statement.
pub fn parse_statement(source: &str) -> SyntaxTree {
    let mut parser = Parser::new(source);
    let root = parser.statement();
    finish_fragment(parser, source, root)
}

/// Parses a single expression.
///
/// # Example
///
/// ```
/// use sharpdom_syntax::{parse_expression, SyntaxKind};
///
/// let tree = parse_expression("a + b * 2");
/// assert_eq!(tree.root().kind(), SyntaxKind::BinaryExpression);
/// ```
pub fn parse_expression(source: &str) -> SyntaxTree {
    let mut parser = Parser::new(source);
    let root = parser.expression();
    finish_fragment(parser, source, root)
}

/// Fragment roots have no end-of-file token; anything left over is reported.
fn finish_fragment(mut parser: Parser, source: &str, root: Arc<SyntaxNode>) -> SyntaxTree {
    if !parser.at_eof() {
        parser.error_at_current("unexpected trailing input");
    }
    parser.finish(source, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod recovery {
        use super::*;

        #[test]
        fn missing_semicolon_inserts_missing_token() {
            let tree = parse_statement("return x");
            assert_eq!(tree.root().kind(), SyntaxKind::ReturnStatement);
            assert!(tree.root().has_errors());
            assert_eq!(tree.diagnostics().len(), 1);
        }

        #[test]
        fn stray_close_brace_at_top_level() {
            let source = "} class A { }";
            let tree = parse_compilation_unit(source);
            assert!(tree.has_errors());
            let kinds: Vec<SyntaxKind> = tree.root().child_nodes().map(|n| n.kind()).collect();
            assert_eq!(kinds, vec![SyntaxKind::Error, SyntaxKind::ClassDeclaration]);
            assert_eq!(tree.root().text(), source);
        }

        #[test]
        fn unknown_statement_is_skipped_to_semicolon() {
            let tree = parse_statement(") x;");
            assert_eq!(tree.root().kind(), SyntaxKind::Error);
            assert_eq!(tree.root().text(), ") x;");
        }

        #[test]
        fn garbage_member_recovers_at_next_declaration() {
            let source = "class A { 42 void M() { } }";
            let tree = parse_compilation_unit(source);
            let class = tree.root().child_nodes().next().unwrap();
            let kinds: Vec<SyntaxKind> = class.child_nodes().map(|n| n.kind()).collect();
            assert_eq!(
                kinds,
                vec![
                    SyntaxKind::ModifierList,
                    SyntaxKind::Error,
                    SyntaxKind::MethodDeclaration
                ]
            );
            assert_eq!(tree.root().text(), source);
        }

        #[test]
        fn trailing_input_after_expression() {
            let tree = parse_expression("a b");
            assert!(tree.has_errors());
        }
    }

    mod lookahead {
        use super::*;

        fn local(source: &str) -> bool {
            Parser::new(source).looks_like_local_declaration()
        }

        #[test]
        fn declarations() {
            assert!(local("int x = 1;"));
            assert!(local("List<Dictionary<string, int>> map;"));
            assert!(local("var a = 1, b = 2;"));
            assert!(local("int? maybe = null;"));
            assert!(local("string[] names;"));
        }

        #[test]
        fn expressions() {
            assert!(!local("x = 1;"));
            assert!(!local("Console.WriteLine(x);"));
            assert!(!local("a < b;"));
            assert!(!local("i++;"));
            assert!(!local("flag ? a : b;"));
        }
    }
}
