//! Members of a type: methods, properties with their accessors, fields and
//! parameters.

use std::sync::Arc;

use sharpdom_core::error::DomError;
use sharpdom_syntax::builder::{ident, modifier_list, punct, word};
use sharpdom_syntax::{SyntaxElement, SyntaxKind, SyntaxNode};

use super::types::{build_type_parameters, rebuild_type_parameters};
use super::{
    annotated, build_attributes, build_initializer, modifiers_of, node_element, node_of,
    rebuild_attributes, rebuild_initializer, separated, BuildContext, Factory, FactoryRegistry,
    RebuildContext,
};
use crate::facet::Slot;
use crate::node::{AccessorKind, Node, NodeId, NodeKind, NodeKindTag, ParameterModifier};
use crate::view::NodeRef;

pub(crate) fn register(registry: &mut FactoryRegistry) {
    registry.register(Box::new(MethodFactory));
    registry.register(Box::new(PropertyFactory));
    registry.register(Box::new(AccessorFactory));
    registry.register(Box::new(FieldFactory));
    registry.register(Box::new(ParameterFactory));
}

fn identifier(syntax: &SyntaxNode) -> String {
    syntax.identifier_text().unwrap_or_default().to_string()
}

/// Build the `Type` child of `syntax` into the `Type` slot.
fn build_type(cx: &mut BuildContext<'_>, owner: NodeId, syntax: &SyntaxNode) -> Result<(), DomError> {
    if let Some(ty) = syntax.child_of_kind(SyntaxKind::Type) {
        cx.build_into(owner, Slot::Type, ty)?;
    }
    Ok(())
}

/// Build the statements of a `Block` child of `syntax`. Returns whether
/// there was a block.
pub(crate) fn build_body(cx: &mut BuildContext<'_>, owner: NodeId, syntax: &SyntaxNode) -> Result<bool, DomError> {
    let Some(block) = syntax.child_of_kind(SyntaxKind::Block) else {
        return Ok(false);
    };
    for statement in block.child_nodes() {
        cx.build_into(owner, Slot::Statements, statement)?;
    }
    Ok(true)
}

/// `{ statements }` for the `Statements` slot of `node`.
pub(crate) fn rebuild_block(node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<SyntaxElement, DomError> {
    rebuild_block_of(node, Slot::Statements, cx)
}

pub(crate) fn rebuild_block_of(
    node: NodeRef<'_>,
    slot: Slot,
    cx: &RebuildContext<'_>,
) -> Result<SyntaxElement, DomError> {
    let mut children = vec![punct("{")];
    children.extend(cx.rebuild_slot(node, slot)?.into_iter().map(SyntaxElement::from));
    children.push(punct("}"));
    Ok(node_element(SyntaxKind::Block, children))
}

// ============================================================================
// Methods
// ============================================================================

pub struct MethodFactory;

impl Factory for MethodFactory {
    fn name(&self) -> &str {
        "method"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::MethodDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let has_body = syntax.child_of_kind(SyntaxKind::Block).is_some();
        let node = Node::new(NodeKind::Method { has_body }, syntax)
            .with_name(identifier(syntax))
            .with_modifiers(modifiers_of(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_attributes(cx, id, syntax)?;
        build_type(cx, id, syntax)?;
        build_type_parameters(cx, id, syntax)?;
        if let Some(list) = syntax.child_of_kind(SyntaxKind::ParameterList) {
            let mut ordinal = 0;
            for parameter in list.children_of_kind(SyntaxKind::Parameter) {
                for built in cx.build(parameter)? {
                    if let NodeKind::Parameter { ordinal: slot, .. } = &mut cx.dom_mut().node_mut(built).kind {
                        *slot = ordinal;
                    }
                    cx.attach(id, Slot::Parameters, built)?;
                    ordinal += 1;
                }
            }
        }
        build_body(cx, id, syntax)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Method
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let has_body = matches!(node.kind(), NodeKind::Method { has_body: true });
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(node.modifiers().keywords()).into());
        children.push(cx.require_child(node, Slot::Type, self.name())?.into());
        children.push(ident(&node.name()));
        children.extend(rebuild_type_parameters(node, cx)?);
        let mut parameters = vec![punct("(")];
        parameters.extend(separated(cx.rebuild_slot(node, Slot::Parameters)?, ","));
        parameters.push(punct(")"));
        children.push(node_element(SyntaxKind::ParameterList, parameters));
        if has_body || !node.statements().is_empty() {
            children.push(rebuild_block(node, cx)?);
        } else {
            children.push(punct(";"));
        }
        Ok(vec![annotated(node, node_of(SyntaxKind::MethodDeclaration, children))])
    }
}

pub struct ParameterFactory;

impl Factory for ParameterFactory {
    fn name(&self) -> &str {
        "parameter"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::Parameter
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let modifier = syntax
            .child_of_kind(SyntaxKind::ModifierList)
            .and_then(|list| list.child_tokens().next())
            .and_then(|token| ParameterModifier::from_keyword(token.text()))
            .unwrap_or_default();
        let kind = NodeKind::Parameter { modifier, ordinal: 0 };
        let id = cx.alloc(Node::new(kind, syntax).with_name(identifier(syntax)));
        build_attributes(cx, id, syntax)?;
        build_type(cx, id, syntax)?;
        build_initializer(cx, id, Slot::Initializer, syntax)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Parameter
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let modifier = match node.kind() {
            NodeKind::Parameter { modifier, .. } => modifier.keyword(),
            _ => None,
        };
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(modifier).into());
        children.push(cx.require_child(node, Slot::Type, self.name())?.into());
        children.push(ident(&node.name()));
        children.extend(rebuild_initializer(node, Slot::Initializer, cx)?.map(SyntaxElement::from));
        Ok(vec![node_of(SyntaxKind::Parameter, children)])
    }
}

// ============================================================================
// Properties
// ============================================================================

pub struct PropertyFactory;

impl Factory for PropertyFactory {
    fn name(&self) -> &str {
        "property"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::PropertyDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::Property, syntax)
            .with_name(identifier(syntax))
            .with_modifiers(modifiers_of(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_attributes(cx, id, syntax)?;
        build_type(cx, id, syntax)?;
        let accessors = syntax
            .child_of_kind(SyntaxKind::AccessorList)
            .ok_or_else(|| DomError::malformed(self.name(), "property without an accessor list"))?;
        for accessor in accessors
            .child_nodes()
            .filter(|n| matches!(n.kind(), SyntaxKind::AccessorDeclaration | SyntaxKind::Error))
        {
            cx.build_into(id, Slot::Accessors, accessor)?;
        }
        build_initializer(cx, id, Slot::Initializer, syntax)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Property
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(node.modifiers().keywords()).into());
        children.push(cx.require_child(node, Slot::Type, self.name())?.into());
        children.push(ident(&node.name()));
        let mut accessors = vec![punct("{")];
        accessors.extend(cx.rebuild_slot(node, Slot::Accessors)?.into_iter().map(SyntaxElement::from));
        accessors.push(punct("}"));
        children.push(node_element(SyntaxKind::AccessorList, accessors));
        if let Some(initializer) = rebuild_initializer(node, Slot::Initializer, cx)? {
            children.push(initializer.into());
            children.push(punct(";"));
        }
        Ok(vec![annotated(node, node_of(SyntaxKind::PropertyDeclaration, children))])
    }
}

pub struct AccessorFactory;

impl Factory for AccessorFactory {
    fn name(&self) -> &str {
        "accessor"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::AccessorDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let keyword = syntax
            .child_tokens()
            .find_map(|token| AccessorKind::from_keyword(token.text()))
            .ok_or_else(|| DomError::malformed(self.name(), "accessor without get, set or init"))?;
        let has_body = syntax.child_of_kind(SyntaxKind::Block).is_some();
        let node = Node::new(NodeKind::Accessor { keyword, has_body }, syntax)
            .with_name(keyword.keyword())
            .with_modifiers(modifiers_of(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_attributes(cx, id, syntax)?;
        build_body(cx, id, syntax)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Accessor
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let NodeKind::Accessor { keyword, has_body } = node.kind() else {
            return Err(DomError::malformed(self.name(), "not an accessor"));
        };
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(node.modifiers().keywords()).into());
        children.push(word(keyword.keyword()));
        if *has_body || !node.statements().is_empty() {
            children.push(rebuild_block(node, cx)?);
        } else {
            children.push(punct(";"));
        }
        Ok(vec![annotated(node, node_of(SyntaxKind::AccessorDeclaration, children))])
    }
}

// ============================================================================
// Fields
// ============================================================================

/// `int x = 1, y;` builds two fields. Each field is backed by its
/// declarator and rebuilds as a declaration of its own.
pub struct FieldFactory;

impl Factory for FieldFactory {
    fn name(&self) -> &str {
        "field"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::FieldDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let declaration = syntax
            .child_of_kind(SyntaxKind::VariableDeclaration)
            .ok_or_else(|| DomError::malformed(self.name(), "field without a variable declaration"))?;
        let modifiers = modifiers_of(syntax);
        let annotations = cx.annotations(syntax);
        let mut out = Vec::new();
        for declarator in declaration.children_of_kind(SyntaxKind::VariableDeclarator) {
            let node = Node::new(NodeKind::Field, declarator)
                .with_name(identifier(declarator))
                .with_modifiers(modifiers.clone())
                .with_annotations(annotations.clone());
            let id = cx.alloc(node);
            build_attributes(cx, id, syntax)?;
            build_type(cx, id, declaration)?;
            build_initializer(cx, id, Slot::Initializer, declarator)?;
            out.push(id);
        }
        if out.is_empty() {
            return Err(DomError::malformed(self.name(), "field without declarators"));
        }
        Ok(out)
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Field
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(node.modifiers().keywords()).into());
        children.push(rebuild_variable(node, self.name(), cx)?.into());
        children.push(punct(";"));
        Ok(vec![annotated(node, node_of(SyntaxKind::FieldDeclaration, children))])
    }
}

/// `Type name = value` as a one-declarator `VariableDeclaration`.
pub(crate) fn rebuild_variable(
    node: NodeRef<'_>,
    factory: &str,
    cx: &RebuildContext<'_>,
) -> Result<Arc<SyntaxNode>, DomError> {
    let mut declarator = vec![ident(&node.name())];
    declarator.extend(rebuild_initializer(node, Slot::Initializer, cx)?.map(SyntaxElement::from));
    Ok(node_of(
        SyntaxKind::VariableDeclaration,
        vec![
            cx.require_child(node, Slot::Type, factory)?.into(),
            node_element(SyntaxKind::VariableDeclarator, declarator),
        ],
    ))
}
