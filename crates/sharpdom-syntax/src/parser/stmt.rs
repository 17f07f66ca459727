// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Statements.

use std::sync::Arc;

use super::Parser;
use crate::kind::SyntaxKind;
use crate::tree::{SyntaxElement, SyntaxNode};

impl Parser {
    pub(crate) fn statement(&mut self) -> Arc<SyntaxNode> {
        if self.at("{") {
            return self.block();
        }
        if self.at("if") {
            return self.if_statement();
        }
        if self.at("for") {
            return self.for_statement();
        }
        if self.at("while") {
            return self.while_statement();
        }
        if self.at("return") {
            return self.keyword_statement(SyntaxKind::ReturnStatement, true);
        }
        if self.at("throw") {
            return self.keyword_statement(SyntaxKind::ThrowStatement, true);
        }
        if self.at("break") {
            return self.keyword_statement(SyntaxKind::BreakStatement, false);
        }
        if self.at("continue") {
            return self.keyword_statement(SyntaxKind::ContinueStatement, false);
        }
        if self.at(";") {
            return SyntaxNode::new(SyntaxKind::EmptyStatement, vec![self.bump()]);
        }
        if self.at("const") || self.looks_like_local_declaration() {
            return self.local_declaration_statement();
        }
        if self.at_expression_start() {
            let children = vec![self.expression().into(), self.expect(";")];
            return SyntaxNode::new(SyntaxKind::ExpressionStatement, children);
        }
        self.recover("expected a statement", Vec::new())
    }

    pub(crate) fn block(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.expect("{")];
        while !self.at("}") && !self.at_eof() {
            children.push(self.statement().into());
        }
        children.push(self.expect("}"));
        SyntaxNode::new(SyntaxKind::Block, children)
    }

    fn if_statement(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![
            self.bump(),
            self.expect("("),
            self.expression().into(),
            self.expect(")"),
            self.statement().into(),
        ];
        if self.at("else") {
            let clause = vec![self.bump(), self.statement().into()];
            children.push(SyntaxNode::new(SyntaxKind::ElseClause, clause).into());
        }
        SyntaxNode::new(SyntaxKind::IfStatement, children)
    }

    /// `for (init; condition; incrementors) body`
    ///
    /// The three sections are separated by the two `;` tokens, which stay
    /// direct children of the statement.
    fn for_statement(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump(), self.expect("(")];
        if !self.at(";") {
            if self.looks_like_local_declaration() {
                children.push(self.variable_declaration().into());
            } else {
                self.expression_list(&mut children, ";");
            }
        }
        children.push(self.expect(";"));
        if !self.at(";") {
            children.push(self.expression().into());
        }
        children.push(self.expect(";"));
        if !self.at(")") {
            self.expression_list(&mut children, ")");
        }
        children.push(self.expect(")"));
        children.push(self.statement().into());
        SyntaxNode::new(SyntaxKind::ForStatement, children)
    }

    fn expression_list(&mut self, out: &mut Vec<SyntaxElement>, end: &str) {
        loop {
            out.push(self.expression().into());
            if self.at(",") {
                out.push(self.bump());
            } else {
                break;
            }
            if self.at(end) {
                break;
            }
        }
    }

    fn while_statement(&mut self) -> Arc<SyntaxNode> {
        let children = vec![
            self.bump(),
            self.expect("("),
            self.expression().into(),
            self.expect(")"),
            self.statement().into(),
        ];
        SyntaxNode::new(SyntaxKind::WhileStatement, children)
    }

    /// `keyword expression? ;`
    fn keyword_statement(&mut self, kind: SyntaxKind, allows_expression: bool) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump()];
        if allows_expression && !self.at(";") && self.at_expression_start() {
            children.push(self.expression().into());
        }
        children.push(self.expect(";"));
        SyntaxNode::new(kind, children)
    }

    fn local_declaration_statement(&mut self) -> Arc<SyntaxNode> {
        let mut children = Vec::new();
        if self.at("const") {
            children.push(SyntaxNode::new(SyntaxKind::ModifierList, vec![self.bump()]).into());
        }
        children.push(self.variable_declaration().into());
        children.push(self.expect(";"));
        SyntaxNode::new(SyntaxKind::LocalDeclarationStatement, children)
    }
}

#[cfg(test)]
mod tests {
    use crate::kind::SyntaxKind;
    use crate::parse_statement;

    fn kind_of(source: &str) -> SyntaxKind {
        let tree = parse_statement(source);
        assert!(!tree.has_errors(), "{}: {:?}", source, tree.diagnostics());
        tree.root().kind()
    }

    #[test]
    fn statement_kinds() {
        assert_eq!(kind_of("{ }"), SyntaxKind::Block);
        assert_eq!(kind_of("if (a) b(); else c();"), SyntaxKind::IfStatement);
        assert_eq!(kind_of("while (x < 3) x++;"), SyntaxKind::WhileStatement);
        assert_eq!(kind_of("return;"), SyntaxKind::ReturnStatement);
        assert_eq!(kind_of("return a + 1;"), SyntaxKind::ReturnStatement);
        assert_eq!(kind_of("break;"), SyntaxKind::BreakStatement);
        assert_eq!(kind_of("throw ex;"), SyntaxKind::ThrowStatement);
        assert_eq!(kind_of(";"), SyntaxKind::EmptyStatement);
        assert_eq!(kind_of("int x = 1, y;"), SyntaxKind::LocalDeclarationStatement);
        assert_eq!(kind_of("const int k = 4;"), SyntaxKind::LocalDeclarationStatement);
        assert_eq!(kind_of("x += 2;"), SyntaxKind::ExpressionStatement);
        assert_eq!(kind_of("Console.WriteLine(\"hi\");"), SyntaxKind::ExpressionStatement);
    }

    #[test]
    fn else_if_chain_nests() {
        let tree = parse_statement("if (a) { } else if (b) { } else { }");
        let root = tree.root();
        let else_clause = root.child_of_kind(SyntaxKind::ElseClause).unwrap();
        let nested = else_clause.child_of_kind(SyntaxKind::IfStatement).unwrap();
        assert!(nested.child_of_kind(SyntaxKind::ElseClause).is_some());
    }

    #[test]
    fn for_statement_sections() {
        let tree = parse_statement("for (int i = 0; i < 10; i++) { sum += i; }");
        assert!(!tree.has_errors());
        let kinds: Vec<SyntaxKind> = tree.root().child_nodes().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::VariableDeclaration,
                SyntaxKind::BinaryExpression,
                SyntaxKind::PostfixUnaryExpression,
                SyntaxKind::Block
            ]
        );
    }

    #[test]
    fn for_statement_with_empty_sections() {
        let tree = parse_statement("for (;;) { }");
        assert!(!tree.has_errors());
        assert_eq!(tree.root().child_nodes().count(), 1);
    }
}
