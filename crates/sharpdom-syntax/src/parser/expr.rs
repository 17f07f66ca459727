// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Expressions, by precedence climbing.
//!
//! ```text
//! expression  := conditional (ASSIGN_OP expression)?
//! conditional := binary(1) ("?" expression ":" expression)?
//! binary(p)   := unary (BINARY_OP{prec >= p} binary(prec + 1))*
//! unary       := PREFIX_OP unary | postfix
//! postfix     := primary ("." IDENT | argument_list | "[" args "]" | "++" | "--")*
//! ```

use std::sync::Arc;

use super::Parser;
use crate::kind::{is_predefined_type, SyntaxKind, TokenKind};
use crate::tree::{SyntaxElement, SyntaxNode, SyntaxToken};

pub const ASSIGNMENT_OPERATORS: &[&str] =
    &["=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<="];

const PREFIX_OPERATORS: &[&str] = &["!", "-", "+", "~", "++", "--"];

/// Binding power of a binary operator token; higher binds tighter.
fn binary_precedence(token: &SyntaxToken) -> Option<u8> {
    let prec = match (token.kind(), token.text()) {
        (TokenKind::Punctuation, "??") => 1,
        (TokenKind::Punctuation, "||") => 2,
        (TokenKind::Punctuation, "&&") => 3,
        (TokenKind::Punctuation, "|") => 4,
        (TokenKind::Punctuation, "^") => 5,
        (TokenKind::Punctuation, "&") => 6,
        (TokenKind::Punctuation, "==" | "!=") => 7,
        (TokenKind::Punctuation, "<" | ">" | "<=" | ">=") => 8,
        (TokenKind::Keyword, "is" | "as") => 8,
        (TokenKind::Punctuation, "<<") => 9,
        (TokenKind::Punctuation, "+" | "-") => 10,
        (TokenKind::Punctuation, "*" | "/" | "%") => 11,
        _ => return None,
    };
    Some(prec)
}

impl Parser {
    pub(crate) fn expression(&mut self) -> Arc<SyntaxNode> {
        let left = self.conditional_expression();
        let current = self.current();
        if current.kind() == TokenKind::Punctuation
            && ASSIGNMENT_OPERATORS.contains(&current.text())
        {
            let operator = self.bump();
            let right = self.expression();
            return SyntaxNode::new(
                SyntaxKind::AssignmentExpression,
                vec![left.into(), operator, right.into()],
            );
        }
        left
    }

    fn conditional_expression(&mut self) -> Arc<SyntaxNode> {
        let condition = self.binary_expression(1);
        if !self.at("?") {
            return condition;
        }
        let children = vec![
            condition.into(),
            self.bump(),
            self.expression().into(),
            self.expect(":"),
            self.expression().into(),
        ];
        SyntaxNode::new(SyntaxKind::ConditionalExpression, children)
    }

    fn binary_expression(&mut self, min_prec: u8) -> Arc<SyntaxNode> {
        let mut left = self.unary_expression();
        while let Some(prec) = binary_precedence(self.current()) {
            if prec < min_prec {
                break;
            }
            let is_type_test = self.at("is") || self.at("as");
            let operator = self.bump();
            let right = if is_type_test {
                self.parse_tested_type()
            } else {
                self.binary_expression(prec + 1)
            };
            left = SyntaxNode::new(
                SyntaxKind::BinaryExpression,
                vec![left.into(), operator, right.into()],
            );
        }
        left
    }

    fn unary_expression(&mut self) -> Arc<SyntaxNode> {
        let current = self.current();
        if current.kind() == TokenKind::Punctuation && PREFIX_OPERATORS.contains(&current.text()) {
            let children = vec![self.bump(), self.unary_expression().into()];
            return SyntaxNode::new(SyntaxKind::PrefixUnaryExpression, children);
        }
        let primary = self.primary_expression();
        self.postfix_expression(primary)
    }

    fn primary_expression(&mut self) -> Arc<SyntaxNode> {
        let token = self.current();
        let kind = match token.kind() {
            TokenKind::IntegerLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral => SyntaxKind::LiteralExpression,
            TokenKind::Identifier => SyntaxKind::IdentifierName,
            TokenKind::Keyword => match token.text() {
                "true" | "false" | "null" => SyntaxKind::LiteralExpression,
                "this" | "base" => SyntaxKind::ThisExpression,
                "new" => return self.object_creation(),
                text if is_predefined_type(text) => SyntaxKind::IdentifierName,
                _ => return self.missing_expression(),
            },
            TokenKind::Punctuation if token.text() == "(" => {
                let children = vec![self.bump(), self.expression().into(), self.expect(")")];
                return SyntaxNode::new(SyntaxKind::ParenthesizedExpression, children);
            }
            _ => return self.missing_expression(),
        };
        SyntaxNode::new(kind, vec![self.bump()])
    }

    fn missing_expression(&mut self) -> Arc<SyntaxNode> {
        let name = self.missing(TokenKind::Identifier, "expected an expression".to_string());
        SyntaxNode::new(SyntaxKind::IdentifierName, vec![name])
    }

    fn object_creation(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump(), self.parse_type().into()];
        if self.at("(") {
            children.push(self.argument_list("(", ")", SyntaxKind::ArgumentList).into());
        }
        SyntaxNode::new(SyntaxKind::ObjectCreationExpression, children)
    }

    fn postfix_expression(&mut self, mut expression: Arc<SyntaxNode>) -> Arc<SyntaxNode> {
        loop {
            if self.at(".") {
                let children = vec![expression.into(), self.bump(), self.expect_identifier()];
                expression = SyntaxNode::new(SyntaxKind::MemberAccessExpression, children);
            } else if self.at("(") {
                let args = self.argument_list("(", ")", SyntaxKind::ArgumentList);
                expression = SyntaxNode::new(
                    SyntaxKind::InvocationExpression,
                    vec![expression.into(), args.into()],
                );
            } else if self.at("[") {
                let args = self.argument_list("[", "]", SyntaxKind::BracketedArgumentList);
                expression = SyntaxNode::new(
                    SyntaxKind::ElementAccessExpression,
                    vec![expression.into(), args.into()],
                );
            } else if self.at("++") || self.at("--") {
                let children = vec![expression.into(), self.bump()];
                expression = SyntaxNode::new(SyntaxKind::PostfixUnaryExpression, children);
            } else {
                return expression;
            }
        }
    }

    fn argument_list(&mut self, open: &str, close: &str, kind: SyntaxKind) -> Arc<SyntaxNode> {
        let mut children = vec![self.expect(open)];
        while !self.at(close) && !self.at_eof() {
            children.push(self.argument().into());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(close));
        SyntaxNode::new(kind, children)
    }

    fn argument(&mut self) -> Arc<SyntaxNode> {
        let mut children: Vec<SyntaxElement> = Vec::new();
        if self.at_kind(TokenKind::Identifier) && self.nth_at(1, ":") {
            children.push(self.bump());
            children.push(self.bump());
        }
        if self.at("ref") || self.at("out") {
            children.push(self.bump());
        }
        children.push(self.expression().into());
        SyntaxNode::new(SyntaxKind::Argument, children)
    }

    /// Whether the current token can begin an expression.
    pub(crate) fn at_expression_start(&self) -> bool {
        self.nth_starts_expression(0)
    }

    pub(crate) fn nth_starts_expression(&self, n: usize) -> bool {
        let token = self.nth(n);
        match token.kind() {
            TokenKind::IntegerLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::Identifier => true,
            TokenKind::Keyword => {
                matches!(token.text(), "true" | "false" | "null" | "this" | "base" | "new")
                    || is_predefined_type(token.text())
            }
            TokenKind::Punctuation => {
                token.text() == "(" || PREFIX_OPERATORS.contains(&token.text())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::kind::SyntaxKind;
    use crate::parse_expression;
    use crate::tree::SyntaxNode;
    use std::sync::Arc;

    fn parse(source: &str) -> Arc<SyntaxNode> {
        let tree = parse_expression(source);
        assert!(!tree.has_errors(), "{}: {:?}", source, tree.diagnostics());
        assert_eq!(tree.root().text(), source);
        tree.root().clone()
    }

    /// Fully parenthesized rendering of the expression tree.
    fn shape(node: &SyntaxNode) -> String {
        match node.kind() {
            SyntaxKind::BinaryExpression | SyntaxKind::AssignmentExpression => {
                let parts: Vec<String> = node
                    .children()
                    .iter()
                    .map(|c| match c.as_node() {
                        Some(n) => shape(n),
                        None => c.as_token().map(|t| t.text().to_string()).unwrap_or_default(),
                    })
                    .collect();
                format!("({})", parts.join(" "))
            }
            _ => node.trimmed_text(),
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(shape(&parse("a + b * c")), "(a + (b * c))");
        assert_eq!(shape(&parse("a * b + c")), "((a * b) + c)");
        assert_eq!(shape(&parse("a || b && c == d")), "(a || (b && (c == d)))");
        assert_eq!(shape(&parse("a - b - c")), "((a - b) - c)");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(shape(&parse("a = b = c + 1")), "(a = (b = (c + 1)))");
    }

    #[test]
    fn postfix_chains() {
        let e = parse("obj.Items[0].Run(x, ref y)");
        assert_eq!(e.kind(), SyntaxKind::InvocationExpression);
        let callee = e.child_nodes().next().unwrap();
        assert_eq!(callee.kind(), SyntaxKind::MemberAccessExpression);
    }

    #[test]
    fn object_creation_and_conditional() {
        assert_eq!(
            parse("new List<int>()").kind(),
            SyntaxKind::ObjectCreationExpression
        );
        assert_eq!(
            parse("flag ? 1 : -1").kind(),
            SyntaxKind::ConditionalExpression
        );
    }

    #[test]
    fn type_tests() {
        let e = parse("x is string");
        assert_eq!(e.kind(), SyntaxKind::BinaryExpression);
        assert_eq!(e.child_nodes().nth(1).unwrap().kind(), SyntaxKind::Type);
    }

    #[test]
    fn type_test_inside_a_conditional() {
        let e = parse("a is B ? 1 : 2");
        assert_eq!(e.kind(), SyntaxKind::ConditionalExpression);
        let test = e.child_nodes().next().unwrap();
        assert_eq!(test.kind(), SyntaxKind::BinaryExpression);
        assert_eq!(test.child_nodes().nth(1).unwrap().trimmed_text(), "B");
    }

    #[test]
    fn nullable_type_after_as() {
        let e = parse("x as int? ?? 0");
        let cast = e.child_nodes().next().unwrap();
        assert_eq!(cast.child_nodes().nth(1).unwrap().trimmed_text(), "int?");
    }

    #[test]
    fn missing_operand_is_reported() {
        let tree = parse_expression("a +");
        assert!(tree.has_errors());
    }
}
