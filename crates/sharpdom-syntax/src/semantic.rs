// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Symbol resolution.
//!
//! [`SymbolResolver`] is the interface the model layer queries for declared
//! symbols and expression types. [`SemanticModel`] implements it by indexing
//! every declaration of the trees it is given, keyed by [`SyntaxId`].
//!
//! ## Scopes
//!
//! Indexing walks each tree with a scope that records the enclosing
//! namespaces (split at dots, so `namespace A.B` contributes `A` and `B`)
//! and the enclosing types. A declaration's symbol captures the scope it
//! was found in. Because fragments are `Arc`-shared, a node copied into
//! another model still finds its symbol under the same id.
//!
//! ## Accessibility
//!
//! Explicit modifiers win. Otherwise top-level types are `internal`, members
//! of interfaces and enums are `public`, and everything else declared in a
//! type is `private`. Accessors inherit the accessibility of their property.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use sharpdom_core::error::ResolveError;
use sharpdom_core::types::{AccessModifier, Symbol, SymbolKind};

use crate::format::normalized_text;
use crate::kind::{SyntaxKind, TokenKind};
use crate::tree::{SyntaxId, SyntaxNode};

/// Answers semantic questions about syntax fragments.
pub trait SymbolResolver: Send + Sync + fmt::Debug {
    /// Makes the declarations of `root` and its descendants resolvable.
    fn add_tree(&mut self, root: &Arc<SyntaxNode>);

    /// Symbol declared by `node`.
    fn resolve_declared(&self, node: &SyntaxNode) -> Result<Symbol, ResolveError>;

    /// Static type of the expression `node`, spelled as source text.
    fn resolve_type(&self, node: &SyntaxNode) -> Result<String, ResolveError>;
}

#[derive(Debug, Default)]
pub struct SemanticModel {
    symbols: HashMap<SyntaxId, Result<Symbol, ResolveError>>,
}

impl SemanticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed declarations, including ones that failed.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn index(&mut self, node: &SyntaxNode, scope: &Scope) {
        let kind = node.kind();
        match kind {
            SyntaxKind::NamespaceDeclaration => {
                let name = node
                    .child_of_kind(SyntaxKind::QualifiedName)
                    .map(|n| normalized_text(n))
                    .unwrap_or_default();
                let symbol = scope.symbol(&name, SymbolKind::Namespace, None);
                self.insert(node, non_empty(symbol, &name));
                let mut inner = scope.clone();
                inner
                    .namespaces
                    .extend(name.split('.').filter(|s| !s.is_empty()).map(str::to_string));
                self.index_children(node, &inner);
            }
            k if k.is_type_declaration() => {
                let access = scope.access_of(node);
                let name = declared_name(node);
                let symbol = name
                    .clone()
                    .map(|name| scope.symbol(name, SymbolKind::Type, Some(access)));
                self.insert(node, symbol);
                let mut inner = scope.clone();
                inner.types.push(name.unwrap_or_default().to_string());
                inner.container = Some(kind);
                self.index_children(node, &inner);
            }
            SyntaxKind::EnumMemberDeclaration => {
                let name = declared_name(node);
                let access = AccessModifier::Public;
                self.insert(node, name.map(|n| scope.symbol(n, SymbolKind::EnumMember, Some(access))));
            }
            SyntaxKind::MethodDeclaration | SyntaxKind::ConstructorDeclaration => {
                let access = scope.access_of(node);
                let name = declared_name(node);
                self.insert(node, name.map(|n| scope.symbol(n, SymbolKind::Method, Some(access))));
                self.index_children(node, &scope.in_member(access));
            }
            SyntaxKind::PropertyDeclaration => {
                let access = scope.access_of(node);
                let name = declared_name(node);
                self.insert(node, name.map(|n| scope.symbol(n, SymbolKind::Property, Some(access))));
                self.index_children(node, &scope.in_member(access));
            }
            SyntaxKind::AccessorDeclaration => {
                let access = explicit_access(node)
                    .or(scope.member_access)
                    .unwrap_or(AccessModifier::Private);
                let keyword = node
                    .child_tokens()
                    .find(|t| matches!(t.text(), "get" | "set" | "init"))
                    .map(|t| t.text().to_string())
                    .unwrap_or_default();
                self.insert(node, Ok(scope.symbol(&keyword, SymbolKind::Accessor, Some(access))));
                self.index_children(node, scope);
            }
            SyntaxKind::FieldDeclaration => {
                let access = scope.access_of(node);
                self.index_declarators(node, scope, SymbolKind::Field, Some(access));
            }
            SyntaxKind::LocalDeclarationStatement | SyntaxKind::ForStatement => {
                self.index_declarators(node, scope, SymbolKind::Local, None);
                self.index_children(node, scope);
            }
            SyntaxKind::Parameter => {
                let name = declared_name(node);
                self.insert(node, name.map(|n| scope.symbol(n, SymbolKind::Parameter, None)));
            }
            SyntaxKind::TypeParameter => {
                let name = declared_name(node);
                self.insert(node, name.map(|n| scope.symbol(n, SymbolKind::TypeParameter, None)));
            }
            _ => self.index_children(node, scope),
        }
    }

    fn index_children(&mut self, node: &SyntaxNode, scope: &Scope) {
        for child in node.child_nodes() {
            self.index(child, scope);
        }
    }

    fn index_declarators(
        &mut self,
        node: &SyntaxNode,
        scope: &Scope,
        kind: SymbolKind,
        access: Option<AccessModifier>,
    ) {
        let Some(declaration) = node.child_of_kind(SyntaxKind::VariableDeclaration) else {
            return;
        };
        for declarator in declaration.children_of_kind(SyntaxKind::VariableDeclarator) {
            let name = declared_name(declarator);
            self.insert(declarator, name.map(|n| scope.symbol(n, kind, access)));
            self.index_children(declarator, scope);
        }
    }

    fn insert(&mut self, node: &SyntaxNode, symbol: Result<Symbol, ResolveError>) {
        self.symbols.insert(node.id(), symbol);
    }
}

impl SymbolResolver for SemanticModel {
    fn add_tree(&mut self, root: &Arc<SyntaxNode>) {
        let before = self.symbols.len();
        self.index(root, &Scope::default());
        trace!(
            declarations = self.symbols.len() - before,
            "indexed syntax tree"
        );
    }

    fn resolve_declared(&self, node: &SyntaxNode) -> Result<Symbol, ResolveError> {
        match self.symbols.get(&node.id()) {
            Some(result) => result.clone(),
            None if is_declaration(node.kind()) => Err(ResolveError::UnknownFragment),
            None => Err(ResolveError::NotADeclaration {
                kind: node.kind().to_string(),
            }),
        }
    }

    fn resolve_type(&self, node: &SyntaxNode) -> Result<String, ResolveError> {
        static_type(node).ok_or_else(|| ResolveError::UnknownType {
            expression: normalized_text(node),
        })
    }
}

fn is_declaration(kind: SyntaxKind) -> bool {
    kind.is_member_declaration()
        || matches!(
            kind,
            SyntaxKind::NamespaceDeclaration
                | SyntaxKind::AccessorDeclaration
                | SyntaxKind::VariableDeclarator
                | SyntaxKind::Parameter
                | SyntaxKind::TypeParameter
        )
}

fn non_empty(symbol: Symbol, name: &str) -> Result<Symbol, ResolveError> {
    if name.is_empty() {
        Err(ResolveError::MissingIdentifier)
    } else {
        Ok(symbol)
    }
}

fn declared_name(node: &SyntaxNode) -> Result<&str, ResolveError> {
    node.identifier_text().ok_or(ResolveError::MissingIdentifier)
}

fn explicit_access(node: &SyntaxNode) -> Option<AccessModifier> {
    let modifiers = node.child_of_kind(SyntaxKind::ModifierList)?;
    AccessModifier::from_keywords(modifiers.child_tokens().map(|t| t.text()))
}

// ============================================================================
// Scope
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Scope {
    namespaces: Vec<String>,
    types: Vec<String>,
    /// Kind of the innermost enclosing type declaration.
    container: Option<SyntaxKind>,
    /// Accessibility of the enclosing property or method.
    member_access: Option<AccessModifier>,
}

impl Scope {
    fn symbol(&self, name: &str, kind: SymbolKind, accessibility: Option<AccessModifier>) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            containing_types: self.types.clone(),
            containing_namespaces: self.namespaces.clone(),
            accessibility,
        }
    }

    fn access_of(&self, node: &SyntaxNode) -> AccessModifier {
        explicit_access(node).unwrap_or(match self.container {
            None => AccessModifier::Internal,
            Some(SyntaxKind::InterfaceDeclaration) => AccessModifier::Public,
            Some(_) => AccessModifier::Private,
        })
    }

    fn in_member(&self, access: AccessModifier) -> Scope {
        Scope {
            member_access: Some(access),
            ..self.clone()
        }
    }
}

// ============================================================================
// Expression types
// ============================================================================

fn static_type(node: &SyntaxNode) -> Option<String> {
    match node.kind() {
        SyntaxKind::LiteralExpression => literal_type(node),
        SyntaxKind::ObjectCreationExpression => {
            node.child_of_kind(SyntaxKind::Type).map(|t| normalized_text(t))
        }
        SyntaxKind::ParenthesizedExpression => static_type(node.child_expression()?),
        SyntaxKind::PrefixUnaryExpression => {
            let operand = node.child_expression()?;
            if node.has_token("!") {
                Some("bool".to_string())
            } else {
                static_type(operand)
            }
        }
        SyntaxKind::BinaryExpression => binary_type(node),
        SyntaxKind::ConditionalExpression => {
            let mut branches = node.child_nodes().skip(1);
            let then = static_type(branches.next()?)?;
            let otherwise = static_type(branches.next()?)?;
            (then == otherwise).then_some(then)
        }
        _ => None,
    }
}

fn literal_type(node: &SyntaxNode) -> Option<String> {
    let token = node.child_tokens().next()?;
    let text = token.text().to_ascii_lowercase();
    let ty = match token.kind() {
        TokenKind::IntegerLiteral => {
            if text.ends_with("ul") || text.ends_with("lu") {
                "ulong"
            } else if text.ends_with('l') {
                "long"
            } else if text.ends_with('u') {
                "uint"
            } else {
                "int"
            }
        }
        TokenKind::RealLiteral => {
            if text.ends_with('f') {
                "float"
            } else if text.ends_with('m') {
                "decimal"
            } else {
                "double"
            }
        }
        TokenKind::StringLiteral => "string",
        TokenKind::CharLiteral => "char",
        TokenKind::Keyword if text == "true" || text == "false" => "bool",
        _ => return None,
    };
    Some(ty.to_string())
}

fn binary_type(node: &SyntaxNode) -> Option<String> {
    let operator = node.child_tokens().next()?.text();
    match operator {
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "is" => Some("bool".to_string()),
        "as" => node.child_of_kind(SyntaxKind::Type).map(|t| normalized_text(t)),
        _ => {
            let mut operands = node.child_nodes();
            let left = static_type(operands.next()?);
            let right = static_type(operands.next()?);
            match (left, right) {
                (Some(l), Some(r)) if l == r => Some(l),
                (Some(l), _) if operator == "+" && l == "string" => Some(l),
                (_, Some(r)) if operator == "+" && r == "string" => Some(r),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_compilation_unit, parse_expression};

    fn model_for(source: &str) -> (SemanticModel, Arc<SyntaxNode>) {
        let tree = parse_compilation_unit(source);
        let mut model = SemanticModel::new();
        model.add_tree(tree.root());
        (model, tree.root().clone())
    }

    /// First node of `kind` in pre-order.
    fn find(root: &Arc<SyntaxNode>, kind: SyntaxKind) -> Arc<SyntaxNode> {
        let mut found = None;
        root.walk(&mut |node| {
            if found.is_none() && node.kind() == kind {
                found = Some(node.clone());
            }
        });
        found.unwrap()
    }

    fn all(root: &Arc<SyntaxNode>, kind: SyntaxKind) -> Vec<Arc<SyntaxNode>> {
        let mut out = Vec::new();
        root.walk(&mut |node| {
            if node.kind() == kind {
                out.push(node.clone());
            }
        });
        out
    }

    mod declared {
        use super::*;

        #[test]
        fn nested_type_chain() {
            let (model, root) = model_for("namespace A.B { class Outer { public class Inner { } } }");
            let inner = &all(&root, SyntaxKind::ClassDeclaration)[1];
            let symbol = model.resolve_declared(inner).unwrap();
            assert_eq!(symbol.name, "Inner");
            assert_eq!(symbol.containing_types, vec!["Outer"]);
            assert_eq!(symbol.containing_namespaces, vec!["A", "B"]);
            assert_eq!(symbol.qualified_name(), "A.B.Outer.Inner");
            assert_eq!(symbol.accessibility, Some(AccessModifier::Public));
        }

        #[test]
        fn namespace_symbol_keeps_dotted_name() {
            let (model, root) = model_for("namespace X { namespace Y.Z { } }");
            let inner = &all(&root, SyntaxKind::NamespaceDeclaration)[1];
            let symbol = model.resolve_declared(inner).unwrap();
            assert_eq!(symbol.name, "Y.Z");
            assert_eq!(symbol.qualified_name(), "X.Y.Z");
        }

        #[test]
        fn default_accessibility() {
            let (model, root) = model_for(
                "class C { int f; void M() { } } interface I { void N(); }",
            );
            let class = find(&root, SyntaxKind::ClassDeclaration);
            assert_eq!(
                model.resolve_declared(&class).unwrap().accessibility,
                Some(AccessModifier::Internal)
            );
            let methods = all(&root, SyntaxKind::MethodDeclaration);
            assert_eq!(
                model.resolve_declared(&methods[0]).unwrap().accessibility,
                Some(AccessModifier::Private)
            );
            assert_eq!(
                model.resolve_declared(&methods[1]).unwrap().accessibility,
                Some(AccessModifier::Public)
            );
        }

        #[test]
        fn each_declarator_is_a_symbol() {
            let (model, root) = model_for("class C { protected int x = 1, y = 2; }");
            let names: Vec<String> = all(&root, SyntaxKind::VariableDeclarator)
                .iter()
                .map(|d| model.resolve_declared(d).unwrap().name)
                .collect();
            assert_eq!(names, vec!["x", "y"]);
            let y = &all(&root, SyntaxKind::VariableDeclarator)[1];
            let symbol = model.resolve_declared(y).unwrap();
            assert_eq!(symbol.kind, SymbolKind::Field);
            assert_eq!(symbol.accessibility, Some(AccessModifier::Protected));
        }

        #[test]
        fn accessors_inherit_property_access() {
            let (model, root) = model_for("class C { public int P { get; private set; } }");
            let accessors = all(&root, SyntaxKind::AccessorDeclaration);
            let get = model.resolve_declared(&accessors[0]).unwrap();
            let set = model.resolve_declared(&accessors[1]).unwrap();
            assert_eq!(get.name, "get");
            assert_eq!(get.accessibility, Some(AccessModifier::Public));
            assert_eq!(set.accessibility, Some(AccessModifier::Private));
        }

        #[test]
        fn locals_and_parameters() {
            let (model, root) = model_for("class C { void M(int a) { int b = a; } }");
            let parameter = find(&root, SyntaxKind::Parameter);
            assert_eq!(model.resolve_declared(&parameter).unwrap().kind, SymbolKind::Parameter);
            let local = find(&root, SyntaxKind::VariableDeclarator);
            let symbol = model.resolve_declared(&local).unwrap();
            assert_eq!(symbol.kind, SymbolKind::Local);
            assert_eq!(symbol.containing_types, vec!["C"]);
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn missing_identifier() {
            let (model, root) = model_for("class { }");
            let class = find(&root, SyntaxKind::ClassDeclaration);
            assert_eq!(model.resolve_declared(&class), Err(ResolveError::MissingIdentifier));
        }

        #[test]
        fn unknown_fragment() {
            let (model, _) = model_for("class C { }");
            let other = parse_compilation_unit("class D { }");
            let class = find(other.root(), SyntaxKind::ClassDeclaration);
            assert_eq!(model.resolve_declared(&class), Err(ResolveError::UnknownFragment));
        }

        #[test]
        fn not_a_declaration() {
            let (model, root) = model_for("class C { void M() { } }");
            let block = find(&root, SyntaxKind::Block);
            assert!(matches!(
                model.resolve_declared(&block),
                Err(ResolveError::NotADeclaration { .. })
            ));
        }
    }

    mod types {
        use super::*;

        fn type_of(source: &str) -> Result<String, ResolveError> {
            let tree = parse_expression(source);
            SemanticModel::new().resolve_type(tree.root())
        }

        #[test]
        fn literals() {
            assert_eq!(type_of("42").unwrap(), "int");
            assert_eq!(type_of("42L").unwrap(), "long");
            assert_eq!(type_of("1.5").unwrap(), "double");
            assert_eq!(type_of("1.5f").unwrap(), "float");
            assert_eq!(type_of("\"s\"").unwrap(), "string");
            assert_eq!(type_of("'c'").unwrap(), "char");
            assert_eq!(type_of("true").unwrap(), "bool");
        }

        #[test]
        fn composite_expressions() {
            assert_eq!(type_of("new List<int>()").unwrap(), "List<int>");
            assert_eq!(type_of("(1 + 2)").unwrap(), "int");
            assert_eq!(type_of("a < b").unwrap(), "bool");
            assert_eq!(type_of("\"n=\" + 1").unwrap(), "string");
        }

        #[test]
        fn names_are_unknown() {
            assert_eq!(
                type_of("x + 1"),
                Err(ResolveError::UnknownType {
                    expression: "x + 1".to_string()
                })
            );
        }
    }
}
