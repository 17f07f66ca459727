// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Declarations: compilation units, namespaces, types and members.
//!
//! ```text
//! compilation_unit := namespace_member* EOF
//! namespace_member := using_directive | namespace_decl | member_decl
//! member_decl      := attribute_list* modifier_list
//!                     ( type_decl | enum_decl | ctor_decl
//!                     | type IDENT ( method_rest | property_rest | field_rest ) )
//! ```

use std::sync::Arc;

use super::Parser;
use crate::kind::{SyntaxKind, TokenKind, MODIFIERS};
use crate::tree::{SyntaxElement, SyntaxNode};

/// Modifiers allowed on parameters.
const PARAMETER_MODIFIERS: &[&str] = &["ref", "out", "in", "params", "this"];

impl Parser {
    pub(crate) fn compilation_unit(&mut self) -> Arc<SyntaxNode> {
        let mut children = Vec::new();
        while !self.at_eof() {
            children.push(self.namespace_member().into());
        }
        children.push(self.bump());
        SyntaxNode::new(SyntaxKind::CompilationUnit, children)
    }

    fn namespace_member(&mut self) -> Arc<SyntaxNode> {
        if self.at("using") {
            return self.using_directive();
        }
        if self.at("namespace") {
            return self.namespace_declaration();
        }
        self.member_declaration(false)
    }

    fn using_directive(&mut self) -> Arc<SyntaxNode> {
        let children = vec![
            self.bump(),
            self.qualified_name().into(),
            self.expect(";"),
        ];
        SyntaxNode::new(SyntaxKind::UsingDirective, children)
    }

    fn qualified_name(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.expect_identifier()];
        while self.at(".") && self.nth(1).kind() == TokenKind::Identifier {
            children.push(self.bump());
            children.push(self.bump());
        }
        SyntaxNode::new(SyntaxKind::QualifiedName, children)
    }

    fn namespace_declaration(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump(), self.qualified_name().into(), self.expect("{")];
        while !self.at("}") && !self.at_eof() {
            children.push(self.namespace_member().into());
        }
        children.push(self.expect("}"));
        SyntaxNode::new(SyntaxKind::NamespaceDeclaration, children)
    }

    pub(crate) fn member_declaration(&mut self, in_type: bool) -> Arc<SyntaxNode> {
        let mut children: Vec<SyntaxElement> = Vec::new();
        while self.at("[") {
            children.push(self.attribute_list().into());
        }
        children.push(self.modifier_list().into());

        if self.at("class") || self.at("struct") || self.at("interface") {
            return self.type_declaration(children);
        }
        if self.at("enum") {
            return self.enum_declaration(children);
        }
        if !in_type {
            return self.recover("expected a type declaration", children);
        }
        if self.at_kind(TokenKind::Identifier) && self.nth_at(1, "(") {
            return self.constructor_declaration(children);
        }
        if !self.at_type_start() {
            return self.recover("expected a member declaration", children);
        }

        children.push(self.parse_type().into());
        let name = self.expect_identifier();
        if self.at("(") || self.at("<") {
            self.method_declaration(children, name)
        } else if self.at("{") {
            self.property_declaration(children, name)
        } else {
            self.field_declaration(children, name)
        }
    }

    fn modifier_list(&mut self) -> Arc<SyntaxNode> {
        let mut children = Vec::new();
        loop {
            let token = self.current();
            let is_modifier = match token.kind() {
                TokenKind::Keyword => MODIFIERS.contains(&token.text()),
                TokenKind::Identifier => {
                    token.text() == "partial"
                        && (self.nth_at(1, "class")
                            || self.nth_at(1, "struct")
                            || self.nth_at(1, "interface")
                            || self.nth_at(1, "void"))
                }
                _ => false,
            };
            if !is_modifier {
                break;
            }
            children.push(self.bump());
        }
        SyntaxNode::new(SyntaxKind::ModifierList, children)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn type_declaration(&mut self, mut children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
        let kind = if self.at("class") {
            SyntaxKind::ClassDeclaration
        } else if self.at("struct") {
            SyntaxKind::StructDeclaration
        } else {
            SyntaxKind::InterfaceDeclaration
        };
        children.push(self.bump());
        children.push(self.expect_identifier());
        if self.at("<") {
            children.push(self.type_parameter_list().into());
        }
        if self.at(":") {
            children.push(self.base_list().into());
        }
        children.push(self.expect("{"));
        while !self.at("}") && !self.at_eof() {
            children.push(self.member_declaration(true).into());
        }
        children.push(self.expect("}"));
        if self.at(";") {
            children.push(self.bump());
        }
        SyntaxNode::new(kind, children)
    }

    fn enum_declaration(&mut self, mut children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
        children.push(self.bump());
        children.push(self.expect_identifier());
        if self.at(":") {
            children.push(self.base_list().into());
        }
        children.push(self.expect("{"));
        while !self.at("}") && !self.at_eof() {
            children.push(self.enum_member().into());
            if self.at(",") {
                children.push(self.bump());
            } else if !self.at("}") {
                children.push(self.recover("expected `,` or `}`", Vec::new()).into());
            }
        }
        children.push(self.expect("}"));
        SyntaxNode::new(SyntaxKind::EnumDeclaration, children)
    }

    fn enum_member(&mut self) -> Arc<SyntaxNode> {
        let mut children: Vec<SyntaxElement> = Vec::new();
        while self.at("[") {
            children.push(self.attribute_list().into());
        }
        children.push(self.expect_identifier());
        if self.at("=") {
            children.push(self.equals_value_clause().into());
        }
        SyntaxNode::new(SyntaxKind::EnumMemberDeclaration, children)
    }

    fn base_list(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump(), self.parse_type().into()];
        while self.at(",") {
            children.push(self.bump());
            children.push(self.parse_type().into());
        }
        SyntaxNode::new(SyntaxKind::BaseList, children)
    }

    fn type_parameter_list(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump()];
        loop {
            let parameter = SyntaxNode::new(SyntaxKind::TypeParameter, vec![self.expect_identifier()]);
            children.push(parameter.into());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(">"));
        SyntaxNode::new(SyntaxKind::TypeParameterList, children)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn attribute_list(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.bump()];
        loop {
            children.push(self.attribute().into());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect("]"));
        SyntaxNode::new(SyntaxKind::AttributeList, children)
    }

    fn attribute(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.qualified_name().into()];
        if self.at("(") {
            let mut args = vec![self.bump()];
            while !self.at(")") && !self.at_eof() {
                args.push(self.attribute_argument().into());
                if self.at(",") {
                    args.push(self.bump());
                } else {
                    break;
                }
            }
            args.push(self.expect(")"));
            children.push(SyntaxNode::new(SyntaxKind::AttributeArgumentList, args).into());
        }
        SyntaxNode::new(SyntaxKind::Attribute, children)
    }

    fn attribute_argument(&mut self) -> Arc<SyntaxNode> {
        let mut children = Vec::new();
        if self.at_kind(TokenKind::Identifier) && (self.nth_at(1, "=") || self.nth_at(1, ":")) {
            children.push(self.bump());
            children.push(self.bump());
        }
        children.push(self.expression().into());
        SyntaxNode::new(SyntaxKind::AttributeArgument, children)
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn method_declaration(
        &mut self,
        mut children: Vec<SyntaxElement>,
        name: SyntaxElement,
    ) -> Arc<SyntaxNode> {
        children.push(name);
        if self.at("<") {
            children.push(self.type_parameter_list().into());
        }
        children.push(self.parameter_list().into());
        children.push(self.body_or_semicolon());
        SyntaxNode::new(SyntaxKind::MethodDeclaration, children)
    }

    fn constructor_declaration(&mut self, mut children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
        children.push(self.bump());
        children.push(self.parameter_list().into());
        children.push(self.body_or_semicolon());
        SyntaxNode::new(SyntaxKind::ConstructorDeclaration, children)
    }

    fn body_or_semicolon(&mut self) -> SyntaxElement {
        if self.at("{") {
            self.block().into()
        } else {
            self.expect(";")
        }
    }

    fn parameter_list(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.expect("(")];
        while !self.at(")") && !self.at_eof() {
            children.push(self.parameter().into());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        children.push(self.expect(")"));
        SyntaxNode::new(SyntaxKind::ParameterList, children)
    }

    fn parameter(&mut self) -> Arc<SyntaxNode> {
        let mut children: Vec<SyntaxElement> = Vec::new();
        while self.at("[") {
            children.push(self.attribute_list().into());
        }
        let mut modifiers = Vec::new();
        while PARAMETER_MODIFIERS.iter().any(|m| self.at(m)) {
            modifiers.push(self.bump());
        }
        children.push(SyntaxNode::new(SyntaxKind::ModifierList, modifiers).into());
        children.push(self.parse_type().into());
        children.push(self.expect_identifier());
        if self.at("=") {
            children.push(self.equals_value_clause().into());
        }
        SyntaxNode::new(SyntaxKind::Parameter, children)
    }

    fn property_declaration(
        &mut self,
        mut children: Vec<SyntaxElement>,
        name: SyntaxElement,
    ) -> Arc<SyntaxNode> {
        children.push(name);
        let mut accessors = vec![self.bump()];
        while !self.at("}") && !self.at_eof() {
            accessors.push(self.accessor().into());
        }
        accessors.push(self.expect("}"));
        children.push(SyntaxNode::new(SyntaxKind::AccessorList, accessors).into());
        if self.at("=") {
            children.push(self.equals_value_clause().into());
            children.push(self.expect(";"));
        }
        SyntaxNode::new(SyntaxKind::PropertyDeclaration, children)
    }

    fn accessor(&mut self) -> Arc<SyntaxNode> {
        let mut children: Vec<SyntaxElement> = Vec::new();
        while self.at("[") {
            children.push(self.attribute_list().into());
        }
        children.push(self.modifier_list().into());
        if !(self.at("get") || self.at("set") || self.at("init")) {
            return self.recover("expected `get` or `set`", children);
        }
        children.push(self.bump());
        children.push(self.body_or_semicolon());
        SyntaxNode::new(SyntaxKind::AccessorDeclaration, children)
    }

    fn field_declaration(
        &mut self,
        mut children: Vec<SyntaxElement>,
        name: SyntaxElement,
    ) -> Arc<SyntaxNode> {
        // the type was parsed as part of the member prefix
        let mut declaration = Vec::new();
        if let Some(ty) = children.pop() {
            declaration.push(ty);
        }
        declaration.push(self.variable_declarator(name).into());
        while self.at(",") {
            declaration.push(self.bump());
            let name = self.expect_identifier();
            declaration.push(self.variable_declarator(name).into());
        }
        children.push(SyntaxNode::new(SyntaxKind::VariableDeclaration, declaration).into());
        children.push(self.expect(";"));
        SyntaxNode::new(SyntaxKind::FieldDeclaration, children)
    }

    // ------------------------------------------------------------------
    // Shared pieces
    // ------------------------------------------------------------------

    /// `Type declarator (, declarator)*`
    pub(crate) fn variable_declaration(&mut self) -> Arc<SyntaxNode> {
        let mut children = vec![self.parse_type().into()];
        loop {
            let name = self.expect_identifier();
            children.push(self.variable_declarator(name).into());
            if self.at(",") {
                children.push(self.bump());
            } else {
                break;
            }
        }
        SyntaxNode::new(SyntaxKind::VariableDeclaration, children)
    }

    fn variable_declarator(&mut self, name: SyntaxElement) -> Arc<SyntaxNode> {
        let mut children = vec![name];
        if self.at("=") {
            children.push(self.equals_value_clause().into());
        }
        SyntaxNode::new(SyntaxKind::VariableDeclarator, children)
    }

    fn equals_value_clause(&mut self) -> Arc<SyntaxNode> {
        let children = vec![self.bump(), self.expression().into()];
        SyntaxNode::new(SyntaxKind::EqualsValueClause, children)
    }

    /// A flat `Type` node: the type's tokens, including generic arguments.
    pub(crate) fn parse_type(&mut self) -> Arc<SyntaxNode> {
        let mut children = Vec::new();
        self.type_tokens(&mut children);
        SyntaxNode::new(SyntaxKind::Type, children)
    }

    /// The type after `is` or `as`. A trailing `?` followed by the start of
    /// an expression belongs to a conditional, not to the type.
    pub(crate) fn parse_tested_type(&mut self) -> Arc<SyntaxNode> {
        let mut children = Vec::new();
        if self.type_tokens_until_nullable(&mut children)
            && self.at("?")
            && !self.nth_starts_expression(1)
        {
            children.push(self.bump());
        }
        SyntaxNode::new(SyntaxKind::Type, children)
    }

    fn type_tokens(&mut self, out: &mut Vec<SyntaxElement>) {
        if self.type_tokens_until_nullable(out) && self.at("?") {
            out.push(self.bump());
        }
    }

    /// Returns false when no type was found.
    fn type_tokens_until_nullable(&mut self, out: &mut Vec<SyntaxElement>) -> bool {
        if !self.at_type_start() {
            out.push(self.missing(TokenKind::Identifier, "expected a type".to_string()));
            return false;
        }
        out.push(self.bump());
        loop {
            if self.at(".") && self.nth(1).kind() == TokenKind::Identifier {
                out.push(self.bump());
                out.push(self.bump());
            } else if self.at("<") {
                out.push(self.bump());
                self.type_tokens(out);
                while self.at(",") {
                    out.push(self.bump());
                    self.type_tokens(out);
                }
                out.push(self.expect(">"));
            } else {
                break;
            }
        }
        while self.at("[") && (self.nth_at(1, "]") || self.nth_at(1, ",")) {
            out.push(self.bump());
            while self.at(",") {
                out.push(self.bump());
            }
            out.push(self.expect("]"));
        }
        true
    }
}
