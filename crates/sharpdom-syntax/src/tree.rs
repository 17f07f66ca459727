// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The immutable concrete syntax tree.
//!
//! # Node Identity
//!
//! Every [`SyntaxNode`] receives a process-unique [`SyntaxId`] when it is
//! constructed. Ids are the key for side tables such as the semantic model's
//! symbol index. Nodes are shared through `Arc` and never mutated, so a
//! fragment can appear in several trees (a rebuilt tree reuses expression
//! fragments of the tree it was built from) and keep its identity.
//!
//! # Trivia
//!
//! Whitespace and comments are attached to the token that follows them as
//! leading trivia. Trivia after the last real token belongs to the
//! end-of-file token, so concatenating every token's trivia and text
//! reproduces the source exactly.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sharpdom_core::types::Span;

use crate::codegen::{Codegen, CodegenState};
use crate::kind::{SyntaxKind, TokenKind};

// ============================================================================
// Node Identity
// ============================================================================

static NEXT_SYNTAX_ID: AtomicU32 = AtomicU32::new(0);

/// A stable, unique identifier for a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxId(u32);

impl SyntaxId {
    fn fresh() -> Self {
        SyntaxId(NEXT_SYNTAX_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u32 value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SyntaxId({})", self.0)
    }
}

// ============================================================================
// Trivia and Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trivia {
    Whitespace(String),
    Newline(String),
    LineComment(String),
    BlockComment(String),
}

impl Trivia {
    pub fn text(&self) -> &str {
        match self {
            Trivia::Whitespace(s)
            | Trivia::Newline(s)
            | Trivia::LineComment(s)
            | Trivia::BlockComment(s) => s,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Trivia::LineComment(_) | Trivia::BlockComment(_))
    }
}

/// A leaf of the tree.
///
/// Missing tokens are synthesized by the parser's error recovery: they have
/// empty text and mark the tree as erroneous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    kind: TokenKind,
    text: String,
    leading: Vec<Trivia>,
    offset: usize,
    missing: bool,
}

impl SyntaxToken {
    /// A token that did not come from source text (offset 0, no trivia).
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        SyntaxToken {
            kind,
            text: text.into(),
            leading: Vec::new(),
            offset: 0,
            missing: false,
        }
    }

    pub(crate) fn lexed(kind: TokenKind, text: &str, leading: Vec<Trivia>, offset: usize) -> Self {
        SyntaxToken {
            kind,
            text: text.to_string(),
            leading,
            offset,
            missing: false,
        }
    }

    pub(crate) fn missing(kind: TokenKind, offset: usize) -> Self {
        SyntaxToken {
            kind,
            text: String::new(),
            leading: Vec::new(),
            offset,
            missing: true,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading
    }

    /// Byte offset of the token text in the source it was lexed from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.text.len())
    }

    pub fn is_missing(&self) -> bool {
        self.missing
    }

    /// True for a present token spelled `text`.
    pub fn is(&self, text: &str) -> bool {
        !self.missing && self.text == text
    }

    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword)
    }

    /// Comments in the leading trivia, in source order.
    pub fn leading_comments(&self) -> impl Iterator<Item = &str> {
        self.leading.iter().filter(|t| t.is_comment()).map(Trivia::text)
    }

    pub fn with_leading(mut self, leading: Vec<Trivia>) -> Self {
        self.leading = leading;
        self
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone)]
pub enum SyntaxElement {
    Node(Arc<SyntaxNode>),
    Token(SyntaxToken),
}

impl SyntaxElement {
    pub fn as_node(&self) -> Option<&Arc<SyntaxNode>> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&SyntaxToken> {
        match self {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        }
    }
}

impl From<Arc<SyntaxNode>> for SyntaxElement {
    fn from(node: Arc<SyntaxNode>) -> Self {
        SyntaxElement::Node(node)
    }
}

impl From<SyntaxToken> for SyntaxElement {
    fn from(token: SyntaxToken) -> Self {
        SyntaxElement::Token(token)
    }
}

/// An interior node: a kind and an ordered list of child nodes and tokens.
#[derive(Debug)]
pub struct SyntaxNode {
    id: SyntaxId,
    kind: SyntaxKind,
    children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
        Arc::new(SyntaxNode {
            id: SyntaxId::fresh(),
            kind,
            children,
        })
    }

    pub fn id(&self) -> SyntaxId {
        self.id
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn children(&self) -> &[SyntaxElement] {
        &self.children
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Arc<SyntaxNode>> {
        self.children.iter().filter_map(SyntaxElement::as_node)
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        self.children.iter().filter_map(SyntaxElement::as_token)
    }

    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<&Arc<SyntaxNode>> {
        self.child_nodes().find(|n| n.kind == kind)
    }

    pub fn children_of_kind(&self, kind: SyntaxKind) -> impl Iterator<Item = &Arc<SyntaxNode>> {
        self.child_nodes().filter(move |n| n.kind == kind)
    }

    /// First direct child node that is an expression.
    pub fn child_expression(&self) -> Option<&Arc<SyntaxNode>> {
        self.child_nodes().find(|n| n.kind.is_expression())
    }

    /// First present direct token spelled `text`.
    pub fn token(&self, text: &str) -> Option<&SyntaxToken> {
        self.child_tokens().find(|t| t.is(text))
    }

    pub fn has_token(&self, text: &str) -> bool {
        self.token(text).is_some()
    }

    /// First direct identifier token, possibly a missing one.
    pub fn identifier(&self) -> Option<&SyntaxToken> {
        self.child_tokens().find(|t| t.kind() == TokenKind::Identifier)
    }

    /// Text of the first direct identifier token, if present.
    pub fn identifier_text(&self) -> Option<&str> {
        self.identifier()
            .filter(|t| !t.is_missing())
            .map(SyntaxToken::text)
    }

    /// First token of the subtree in source order.
    pub fn first_token(&self) -> Option<&SyntaxToken> {
        self.children.iter().find_map(|child| match child {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(node) => node.first_token(),
        })
    }

    /// Every token of the subtree in source order.
    pub fn tokens(&self) -> Vec<&SyntaxToken> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a SyntaxToken>) {
        for child in &self.children {
            match child {
                SyntaxElement::Token(token) => out.push(token),
                SyntaxElement::Node(node) => node.collect_tokens(out),
            }
        }
    }

    /// Byte offset of the first present token, 0 for an empty node.
    pub fn offset(&self) -> usize {
        self.tokens()
            .into_iter()
            .find(|t| !t.is_missing())
            .map(SyntaxToken::offset)
            .unwrap_or(0)
    }

    /// Comments leading the first token of this node.
    pub fn leading_comments(&self) -> Vec<&str> {
        self.first_token()
            .map(|t| t.leading_comments().collect())
            .unwrap_or_default()
    }

    /// Exact source text of the subtree, including leading trivia.
    pub fn text(&self) -> String {
        let mut state = CodegenState::default();
        self.codegen(&mut state);
        state.to_string()
    }

    /// Source text without the leading trivia of the first token.
    pub fn trimmed_text(&self) -> String {
        let mut state = CodegenState::default();
        let mut first = true;
        for token in self.tokens() {
            if first {
                state.add_token(token.text());
                first = false;
            } else {
                token.codegen(&mut state);
            }
        }
        state.to_string()
    }

    /// Pre-order walk over this node and every descendant node.
    pub fn walk<'a>(self: &'a Arc<Self>, visit: &mut impl FnMut(&'a Arc<SyntaxNode>)) {
        visit(self);
        for child in self.child_nodes() {
            child.walk(visit);
        }
    }

    /// Whether error recovery touched this subtree.
    pub fn has_errors(&self) -> bool {
        if self.kind == SyntaxKind::Error {
            return true;
        }
        self.children.iter().any(|child| match child {
            SyntaxElement::Token(token) => token.is_missing(),
            SyntaxElement::Node(node) => node.has_errors(),
        })
    }
}

// ============================================================================
// Trees and Diagnostics
// ============================================================================

/// A problem found while tokenizing or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
        }
    }
}

/// The result of a parse: the source, its root node and any diagnostics.
///
/// Parsing never fails; malformed input yields a tree containing missing
/// tokens and `Error` nodes plus at least one diagnostic.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: Arc<str>,
    root: Arc<SyntaxNode>,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub(crate) fn new(source: &str, root: Arc<SyntaxNode>, diagnostics: Vec<Diagnostic>) -> Self {
        SyntaxTree {
            source: Arc::from(source),
            root,
            diagnostics,
        }
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn root(&self) -> &Arc<SyntaxNode> {
        &self.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty() || self.root.has_errors()
    }
}
