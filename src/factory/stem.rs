//! The file root, `using` directives and namespaces.

use std::sync::Arc;

use sharpdom_core::error::DomError;
use sharpdom_syntax::builder::{punct, qualified_name, word};
use sharpdom_syntax::{normalized_text, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenKind};

use super::{annotated, node_of, BuildContext, Factory, FactoryRegistry, RebuildContext};
use crate::facet::Slot;
use crate::node::{Node, NodeId, NodeKind, NodeKindTag};
use crate::view::NodeRef;

pub(crate) fn register(registry: &mut FactoryRegistry) {
    registry.register(Box::new(RootFactory));
    registry.register(Box::new(UsingFactory));
    registry.register(Box::new(NamespaceFactory));
}

/// Usings go to `Usings`; every other child node is a member.
fn build_body(cx: &mut BuildContext<'_>, owner: NodeId, syntax: &SyntaxNode) -> Result<(), DomError> {
    for child in syntax.child_nodes() {
        let slot = match child.kind() {
            SyntaxKind::UsingDirective => Slot::Usings,
            SyntaxKind::QualifiedName => continue,
            _ => Slot::Members,
        };
        cx.build_into(owner, slot, child)?;
    }
    Ok(())
}

fn rebuild_body(node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<SyntaxElement>, DomError> {
    let mut out: Vec<SyntaxElement> = Vec::new();
    for slot in [Slot::Usings, Slot::Members] {
        out.extend(cx.rebuild_slot(node, slot)?.into_iter().map(SyntaxElement::from));
    }
    Ok(out)
}

fn dotted_name(syntax: &SyntaxNode) -> String {
    syntax
        .child_of_kind(SyntaxKind::QualifiedName)
        .map(|name| normalized_text(name))
        .unwrap_or_default()
}

// ============================================================================
// Root
// ============================================================================

pub struct RootFactory;

impl Factory for RootFactory {
    fn name(&self) -> &str {
        "root"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::CompilationUnit
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let root = cx.alloc(Node::new(NodeKind::Root, syntax));
        build_body(cx, root, syntax)?;
        Ok(vec![root])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Root
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = rebuild_body(node, cx)?;
        children.push(SyntaxToken::new(TokenKind::EndOfFile, "").into());
        Ok(vec![node_of(SyntaxKind::CompilationUnit, children)])
    }
}

// ============================================================================
// Using
// ============================================================================

pub struct UsingFactory;

impl Factory for UsingFactory {
    fn name(&self) -> &str {
        "using"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::UsingDirective
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::Using, syntax)
            .with_name(dotted_name(syntax))
            .with_annotations(cx.annotations(syntax));
        Ok(vec![cx.alloc(node)])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Using
    }

    fn rebuild(&self, node: NodeRef<'_>, _cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let syntax = node_of(
            SyntaxKind::UsingDirective,
            vec![word("using"), qualified_name(&node.name()).into(), punct(";")],
        );
        Ok(vec![annotated(node, syntax)])
    }
}

// ============================================================================
// Namespace
// ============================================================================

pub struct NamespaceFactory;

impl Factory for NamespaceFactory {
    fn name(&self) -> &str {
        "namespace"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::NamespaceDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::Namespace, syntax)
            .with_name(dotted_name(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_body(cx, id, syntax)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Namespace
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = vec![
            word("namespace"),
            qualified_name(&node.name()).into(),
            punct("{"),
        ];
        children.extend(rebuild_body(node, cx)?);
        children.push(punct("}"));
        let syntax = node_of(SyntaxKind::NamespaceDeclaration, children);
        Ok(vec![annotated(node, syntax)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build, rebuild};

    #[test]
    fn usings_and_namespaces() {
        let dom = build("using System;\nusing System.Text;\nnamespace A.B { using Inner; class C { } }").unwrap();
        let root = dom.root();
        let usings: Vec<String> = root.children(Slot::Usings).iter().map(|u| u.name()).collect();
        assert_eq!(usings, vec!["System", "System.Text"]);
        let ns = root.namespaces()[0];
        assert_eq!(ns.name(), "A.B");
        assert_eq!(ns.children(Slot::Usings)[0].name(), "Inner");
        assert_eq!(ns.classes()[0].qualified_name(), "A.B.C");
    }

    #[test]
    fn rebuild_lays_out_the_file() {
        let dom = build("using System;namespace N{class C{}}").unwrap();
        let text = rebuild(&dom, dom.root_id()).unwrap();
        assert_eq!(text, "using System;\n\nnamespace N\n{\n    class C\n    {\n    }\n}\n");
    }

    #[test]
    fn renamed_namespace_rebuilds_with_the_new_name() {
        let mut dom = build("namespace Old { }").unwrap();
        let ns = dom.root().namespaces()[0].id();
        dom.set_name(ns, "New.Name").unwrap();
        let text = rebuild(&dom, ns).unwrap();
        assert_eq!(text, "namespace New.Name\n{\n}");
    }
}
