// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Construction helpers for trees that do not come from source text.
//!
//! Generated tokens carry no trivia; [`Formatter`](crate::Formatter) lays
//! them out afterwards. Only comments are attached by hand, through
//! [`with_leading_comments`].

use std::sync::Arc;

use crate::kind::{is_keyword, SyntaxKind, TokenKind};
use crate::tokenizer::tokenize;
use crate::tree::{SyntaxElement, SyntaxNode, SyntaxToken, Trivia};

pub fn node(kind: SyntaxKind, children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
    SyntaxNode::new(kind, children)
}

pub fn punct(text: &str) -> SyntaxElement {
    SyntaxToken::new(TokenKind::Punctuation, text).into()
}

/// A keyword or identifier token, classified by spelling.
pub fn word(text: &str) -> SyntaxElement {
    let kind = if is_keyword(text) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    };
    SyntaxToken::new(kind, text).into()
}

pub fn ident(text: &str) -> SyntaxElement {
    SyntaxToken::new(TokenKind::Identifier, text).into()
}

/// `A.B.C` as a `QualifiedName` node.
pub fn qualified_name(text: &str) -> Arc<SyntaxNode> {
    let mut children = Vec::new();
    for (index, segment) in text.split('.').enumerate() {
        if index > 0 {
            children.push(punct("."));
        }
        children.push(ident(segment.trim()));
    }
    node(SyntaxKind::QualifiedName, children)
}

/// A flat `Type` node holding the tokens of `text`.
pub fn type_node(text: &str) -> Arc<SyntaxNode> {
    let children = relexed(text)
        .into_iter()
        .map(SyntaxElement::from)
        .collect();
    node(SyntaxKind::Type, children)
}

/// A `ModifierList` node holding one keyword per entry of `words`.
pub fn modifier_list<'a>(words: impl IntoIterator<Item = &'a str>) -> Arc<SyntaxNode> {
    node(SyntaxKind::ModifierList, words.into_iter().map(word).collect())
}

/// Tokens of `text` with their trivia removed.
fn relexed(text: &str) -> Vec<SyntaxToken> {
    let (tokens, _) = tokenize(text);
    tokens
        .into_iter()
        .filter(|t| t.kind() != TokenKind::EndOfFile)
        .map(|t| SyntaxToken::new(t.kind(), t.text()))
        .collect()
}

/// Copy of `node` whose first token is preceded by `comments`, one per line.
///
/// Each entry must be a complete comment (`// ...` or `/* ... */`).
pub fn with_leading_comments(node: &Arc<SyntaxNode>, comments: &[String]) -> Arc<SyntaxNode> {
    if comments.is_empty() {
        return node.clone();
    }
    let trivia: Vec<Trivia> = comments
        .iter()
        .flat_map(|comment| {
            let comment = if comment.starts_with("/*") {
                Trivia::BlockComment(comment.clone())
            } else {
                Trivia::LineComment(comment.clone())
            };
            [comment, Trivia::Newline("\n".to_string())]
        })
        .collect();
    map_first_token(node, &mut |token| {
        let mut leading = trivia.clone();
        leading.extend(token.leading_trivia().iter().cloned());
        token.clone().with_leading(leading)
    })
    .unwrap_or_else(|| node.clone())
}

/// Copy of `node` whose first token has no leading trivia.
pub fn without_leading_trivia(node: &Arc<SyntaxNode>) -> Arc<SyntaxNode> {
    map_first_token(node, &mut |token| token.clone().with_leading(Vec::new()))
        .unwrap_or_else(|| node.clone())
}

/// Rebuilds the path to the first token, replacing it with `f(token)`.
/// Returns `None` for a node without tokens.
fn map_first_token(
    node: &Arc<SyntaxNode>,
    f: &mut impl FnMut(&SyntaxToken) -> SyntaxToken,
) -> Option<Arc<SyntaxNode>> {
    let mut children = node.children().to_vec();
    for child in children.iter_mut() {
        let replaced = match child {
            SyntaxElement::Token(token) => Some(SyntaxElement::Token(f(token))),
            SyntaxElement::Node(inner) => map_first_token(inner, f).map(SyntaxElement::Node),
        };
        if let Some(replaced) = replaced {
            *child = replaced;
            return Some(SyntaxNode::new(node.kind(), children));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_splits_on_dots() {
        let name = qualified_name("System.Collections.Generic");
        assert_eq!(name.text(), "System.Collections.Generic");
        assert_eq!(name.child_tokens().count(), 5);
    }

    #[test]
    fn type_node_keeps_generic_tokens() {
        let ty = type_node("Dictionary<string, List<int>>");
        assert_eq!(ty.text(), "Dictionary<string,List<int>>");
        assert_eq!(ty.child_tokens().next().unwrap().kind(), TokenKind::Identifier);
    }

    #[test]
    fn word_classifies_keywords() {
        assert_eq!(word("public").as_token().unwrap().kind(), TokenKind::Keyword);
        assert_eq!(word("var").as_token().unwrap().kind(), TokenKind::Identifier);
    }

    #[test]
    fn comments_lead_the_first_token() {
        let field = node(
            SyntaxKind::FieldDeclaration,
            vec![modifier_list(["public"]).into(), ident("x").into(), punct(";")],
        );
        let commented = with_leading_comments(&field, &["//[[ Tag ]]".to_string()]);
        assert_eq!(commented.text(), "//[[ Tag ]]\npublicx;");
        assert_eq!(commented.leading_comments(), vec!["//[[ Tag ]]"]);
    }

    #[test]
    fn leading_trivia_is_dropped() {
        let tree = crate::parse_statement("  // lead\n  Run(a);");
        let stripped = without_leading_trivia(tree.root());
        assert_eq!(stripped.text(), "Run(a);");
        assert!(stripped.leading_comments().is_empty());
    }
}
