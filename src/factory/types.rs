//! Type declarations and the pieces shared by every declaration: type
//! references, type parameters and attributes.

use std::sync::Arc;

use sharpdom_core::error::DomError;
use sharpdom_syntax::builder::{ident, modifier_list, punct, qualified_name, type_node, word};
use sharpdom_syntax::{normalized_text, SyntaxElement, SyntaxKind, SyntaxNode, TokenKind};

use super::{
    annotated, build_attributes, build_initializer, modifiers_of, node_element, node_of,
    rebuild_attributes, rebuild_initializer, separated, BuildContext, Factory, FactoryRegistry,
    RebuildContext,
};
use crate::facet::Slot;
use crate::node::{AttributeValueStyle, Node, NodeId, NodeKind, NodeKindTag};
use crate::view::NodeRef;

pub(crate) fn register(registry: &mut FactoryRegistry) {
    registry.register(Box::new(TypeFactory));
    registry.register(Box::new(EnumFactory));
    registry.register(Box::new(EnumMemberFactory));
    registry.register(Box::new(TypeParameterFactory));
    registry.register(Box::new(TypeReferenceFactory));
    registry.register(Box::new(AttributeListFactory));
    registry.register(Box::new(AttributeFactory));
    registry.register(Box::new(AttributeValueFactory));
}

fn identifier(syntax: &SyntaxNode) -> String {
    syntax.identifier_text().unwrap_or_default().to_string()
}

fn build_base_list(cx: &mut BuildContext<'_>, owner: NodeId, syntax: &SyntaxNode) -> Result<(), DomError> {
    if let Some(bases) = syntax.child_of_kind(SyntaxKind::BaseList) {
        for base in bases.children_of_kind(SyntaxKind::Type) {
            cx.build_into(owner, Slot::BaseTypes, base)?;
        }
    }
    Ok(())
}

fn rebuild_base_list(node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Option<SyntaxElement>, DomError> {
    let bases = cx.rebuild_slot(node, Slot::BaseTypes)?;
    if bases.is_empty() {
        return Ok(None);
    }
    let mut children = vec![punct(":")];
    children.extend(separated(bases, ","));
    Ok(Some(node_element(SyntaxKind::BaseList, children)))
}

/// Type parameters of a type or method declaration.
pub(crate) fn build_type_parameters(
    cx: &mut BuildContext<'_>,
    owner: NodeId,
    syntax: &SyntaxNode,
) -> Result<(), DomError> {
    if let Some(list) = syntax.child_of_kind(SyntaxKind::TypeParameterList) {
        for parameter in list.children_of_kind(SyntaxKind::TypeParameter) {
            cx.build_into(owner, Slot::TypeParameters, parameter)?;
        }
    }
    Ok(())
}

pub(crate) fn rebuild_type_parameters(
    node: NodeRef<'_>,
    cx: &RebuildContext<'_>,
) -> Result<Option<SyntaxElement>, DomError> {
    let parameters = cx.rebuild_slot(node, Slot::TypeParameters)?;
    if parameters.is_empty() {
        return Ok(None);
    }
    let mut children = vec![punct("<")];
    children.extend(separated(parameters, ","));
    children.push(punct(">"));
    Ok(Some(node_element(SyntaxKind::TypeParameterList, children)))
}

// ============================================================================
// Class, struct, interface
// ============================================================================

pub struct TypeFactory;

impl TypeFactory {
    fn keyword(tag: NodeKindTag) -> Option<(&'static str, SyntaxKind)> {
        match tag {
            NodeKindTag::Class => Some(("class", SyntaxKind::ClassDeclaration)),
            NodeKindTag::Struct => Some(("struct", SyntaxKind::StructDeclaration)),
            NodeKindTag::Interface => Some(("interface", SyntaxKind::InterfaceDeclaration)),
            _ => None,
        }
    }
}

impl Factory for TypeFactory {
    fn name(&self) -> &str {
        "type"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        matches!(
            syntax.kind(),
            SyntaxKind::ClassDeclaration | SyntaxKind::StructDeclaration | SyntaxKind::InterfaceDeclaration
        )
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let kind = match syntax.kind() {
            SyntaxKind::StructDeclaration => NodeKind::Struct,
            SyntaxKind::InterfaceDeclaration => NodeKind::Interface,
            _ => NodeKind::Class,
        };
        let node = Node::new(kind, syntax)
            .with_name(identifier(syntax))
            .with_modifiers(modifiers_of(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_attributes(cx, id, syntax)?;
        build_type_parameters(cx, id, syntax)?;
        build_base_list(cx, id, syntax)?;
        for member in syntax
            .child_nodes()
            .filter(|n| n.kind().is_member_declaration() || n.kind() == SyntaxKind::Error)
        {
            cx.build_into(id, Slot::Members, member)?;
        }
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        Self::keyword(node.tag()).is_some()
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let (keyword, kind) = Self::keyword(node.tag())
            .ok_or_else(|| DomError::malformed(self.name(), "not a class, struct or interface"))?;
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(node.modifiers().keywords()).into());
        children.push(word(keyword));
        children.push(ident(&node.name()));
        children.extend(rebuild_type_parameters(node, cx)?);
        children.extend(rebuild_base_list(node, cx)?);
        children.push(punct("{"));
        children.extend(cx.rebuild_slot(node, Slot::Members)?.into_iter().map(SyntaxElement::from));
        children.push(punct("}"));
        Ok(vec![annotated(node, node_of(kind, children))])
    }
}

// ============================================================================
// Enum
// ============================================================================

pub struct EnumFactory;

impl Factory for EnumFactory {
    fn name(&self) -> &str {
        "enum"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::EnumDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::Enum, syntax)
            .with_name(identifier(syntax))
            .with_modifiers(modifiers_of(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_attributes(cx, id, syntax)?;
        build_base_list(cx, id, syntax)?;
        for member in syntax
            .child_nodes()
            .filter(|n| matches!(n.kind(), SyntaxKind::EnumMemberDeclaration | SyntaxKind::Error))
        {
            cx.build_into(id, Slot::Members, member)?;
        }
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Enum
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = rebuild_attributes(node, cx)?;
        children.push(modifier_list(node.modifiers().keywords()).into());
        children.push(word("enum"));
        children.push(ident(&node.name()));
        children.extend(rebuild_base_list(node, cx)?);
        children.push(punct("{"));
        children.extend(separated(cx.rebuild_slot(node, Slot::Members)?, ","));
        children.push(punct("}"));
        Ok(vec![annotated(node, node_of(SyntaxKind::EnumDeclaration, children))])
    }
}

pub struct EnumMemberFactory;

impl Factory for EnumMemberFactory {
    fn name(&self) -> &str {
        "enum_member"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::EnumMemberDeclaration
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::EnumMember, syntax)
            .with_name(identifier(syntax))
            .with_annotations(cx.annotations(syntax));
        let id = cx.alloc(node);
        build_attributes(cx, id, syntax)?;
        build_initializer(cx, id, Slot::Value, syntax)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::EnumMember
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = rebuild_attributes(node, cx)?;
        children.push(ident(&node.name()));
        children.extend(rebuild_initializer(node, Slot::Value, cx)?.map(SyntaxElement::from));
        Ok(vec![annotated(node, node_of(SyntaxKind::EnumMemberDeclaration, children))])
    }
}

// ============================================================================
// Type parameters and references
// ============================================================================

pub struct TypeParameterFactory;

impl Factory for TypeParameterFactory {
    fn name(&self) -> &str {
        "type_parameter"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::TypeParameter
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::TypeParameter, syntax).with_name(identifier(syntax));
        Ok(vec![cx.alloc(node)])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::TypeParameter
    }

    fn rebuild(&self, node: NodeRef<'_>, _cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        Ok(vec![node_of(SyntaxKind::TypeParameter, vec![ident(&node.name())])])
    }
}

/// A use of a type. The name is the type's normalized spelling, generic
/// arguments included.
pub struct TypeReferenceFactory;

impl Factory for TypeReferenceFactory {
    fn name(&self) -> &str {
        "type_reference"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::Type
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let node = Node::new(NodeKind::TypeReference, syntax).with_name(normalized_text(syntax));
        Ok(vec![cx.alloc(node)])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::TypeReference
    }

    fn rebuild(&self, node: NodeRef<'_>, _cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        Ok(vec![type_node(&node.name())])
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// `[A, B(1)]` builds one node per attribute. Lists are not modelled, so
/// this factory never rebuilds; owners wrap each attribute in its own list.
pub struct AttributeListFactory;

impl Factory for AttributeListFactory {
    fn name(&self) -> &str {
        "attribute_list"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::AttributeList
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let mut out = Vec::new();
        for attribute in syntax.children_of_kind(SyntaxKind::Attribute) {
            out.extend(cx.build(attribute)?);
        }
        Ok(out)
    }

    fn can_rebuild(&self, _node: NodeRef<'_>) -> bool {
        false
    }

    fn rebuild(&self, node: NodeRef<'_>, _cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        Err(DomError::UnsupportedNode {
            kind: node.kind_name().to_string(),
        })
    }
}

pub struct AttributeFactory;

impl Factory for AttributeFactory {
    fn name(&self) -> &str {
        "attribute"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::Attribute
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let name = syntax
            .child_of_kind(SyntaxKind::QualifiedName)
            .map(|n| normalized_text(n))
            .unwrap_or_default();
        let id = cx.alloc(Node::new(NodeKind::Attribute, syntax).with_name(name));
        if let Some(arguments) = syntax.child_of_kind(SyntaxKind::AttributeArgumentList) {
            for argument in arguments.children_of_kind(SyntaxKind::AttributeArgument) {
                cx.build_into(id, Slot::AttributeValues, argument)?;
            }
        }
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::Attribute
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children: Vec<SyntaxElement> = vec![qualified_name(&node.name()).into()];
        let values = cx.rebuild_slot(node, Slot::AttributeValues)?;
        if !values.is_empty() {
            let mut arguments = vec![punct("(")];
            arguments.extend(separated(values, ","));
            arguments.push(punct(")"));
            children.push(node_element(SyntaxKind::AttributeArgumentList, arguments));
        }
        Ok(vec![node_of(SyntaxKind::Attribute, children)])
    }
}

/// One attribute argument. Positional arguments have an empty name.
pub struct AttributeValueFactory;

impl Factory for AttributeValueFactory {
    fn name(&self) -> &str {
        "attribute_value"
    }

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
        syntax.kind() == SyntaxKind::AttributeArgument
    }

    fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
        let mut tokens = syntax.child_tokens();
        let (style, name) = match (tokens.next(), tokens.next()) {
            (Some(name), Some(op)) if name.kind() == TokenKind::Identifier => {
                let style = if op.is(":") {
                    AttributeValueStyle::Colon
                } else {
                    AttributeValueStyle::Equals
                };
                (style, name.text().to_string())
            }
            _ => (AttributeValueStyle::Positional, String::new()),
        };
        let id = cx.alloc(Node::new(NodeKind::AttributeValue { style }, syntax).with_name(name));
        let value = syntax
            .child_expression()
            .ok_or_else(|| DomError::malformed(self.name(), "attribute argument without a value"))?;
        cx.build_into(id, Slot::Value, value)?;
        Ok(vec![id])
    }

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
        node.tag() == NodeKindTag::AttributeValue
    }

    fn rebuild(&self, node: NodeRef<'_>, cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut children = Vec::new();
        match node.kind() {
            NodeKind::AttributeValue {
                style: AttributeValueStyle::Equals,
            } => children.extend([ident(&node.name()), punct("=")]),
            NodeKind::AttributeValue {
                style: AttributeValueStyle::Colon,
            } => children.extend([ident(&node.name()), punct(":")]),
            _ => {}
        }
        children.push(cx.require_child(node, Slot::Value, self.name())?.into());
        Ok(vec![node_of(SyntaxKind::AttributeArgument, children)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build, rebuild};

    mod types {
        use super::*;

        #[test]
        fn class_shape() {
            let dom = build("public sealed partial class C<T, U> : Base, IThing { }").unwrap();
            let class = dom.root().classes()[0];
            assert_eq!(class.name(), "C");
            let params: Vec<String> = class
                .children(Slot::TypeParameters)
                .iter()
                .map(|p| p.name())
                .collect();
            assert_eq!(params, vec!["T", "U"]);
            let bases: Vec<String> = class.children(Slot::BaseTypes).iter().map(|b| b.name()).collect();
            assert_eq!(bases, vec!["Base", "IThing"]);
            assert!(class.member_flags().unwrap().is_sealed);
            assert_eq!(class.modifiers().other, vec!["partial".to_string()]);
        }

        #[test]
        fn generic_type_references_are_normalized() {
            let dom = build("class C { Dictionary < string,List<int> > map; }").unwrap();
            let field = dom.root().classes()[0].fields()[0];
            assert_eq!(
                field.return_type().map(|t| t.name()),
                Some("Dictionary<string, List<int>>".to_string())
            );
        }

        #[test]
        fn struct_and_interface_rebuild() {
            let dom = build("public struct S { } interface I { }").unwrap();
            let root = dom.root();
            let types = root.types();
            assert_eq!(rebuild(&dom, types[0].id()).unwrap(), "public struct S\n{\n}");
            assert_eq!(rebuild(&dom, types[1].id()).unwrap(), "interface I\n{\n}");
        }
    }

    mod enums {
        use super::*;

        #[test]
        fn members_and_values() {
            let dom = build("enum Color : byte { Red = 1, Green, Blue = Red | Green }").unwrap();
            let color = dom.root().types()[0];
            let members = color.members();
            assert_eq!(members.len(), 3);
            assert!(members[0].child(Slot::Value).is_some());
            assert!(members[1].child(Slot::Value).is_none());
            assert_eq!(
                members[2].child(Slot::Value).and_then(|v| v.request_value("text")),
                Some(crate::node::Value::from("Red | Green"))
            );
            assert_eq!(color.children(Slot::BaseTypes)[0].name(), "byte");
        }

        #[test]
        fn enum_rebuild() {
            let dom = build("enum E{A=1,B}").unwrap();
            let e = dom.root().types()[0].id();
            assert_eq!(rebuild(&dom, e).unwrap(), "enum E\n{\n    A = 1,\n    B\n}");
        }
    }

    mod attributes {
        use super::*;

        #[test]
        fn one_node_per_attribute() {
            let dom = build("[A, B(1, Named = true, other: \"x\")] [C] class K { }").unwrap();
            let class = dom.root().classes()[0];
            let attributes = class.attributes().unwrap();
            let names: Vec<String> = attributes.iter().map(|a| a.name()).collect();
            assert_eq!(names, vec!["A", "B", "C"]);
            let values = attributes[1].children(Slot::AttributeValues);
            let styles: Vec<&NodeKind> = values.iter().map(|v| v.kind()).collect();
            assert!(matches!(
                styles[..],
                [
                    NodeKind::AttributeValue { style: AttributeValueStyle::Positional },
                    NodeKind::AttributeValue { style: AttributeValueStyle::Equals },
                    NodeKind::AttributeValue { style: AttributeValueStyle::Colon },
                ]
            ));
            assert_eq!(values[1].name(), "Named");
            assert_eq!(values[2].name(), "other");
        }

        #[test]
        fn each_attribute_rebuilds_in_its_own_list() {
            let dom = build("[A, B(1, Named = true)] class K { }").unwrap();
            let class = dom.root().classes()[0].id();
            assert_eq!(
                rebuild(&dom, class).unwrap(),
                "[A]\n[B(1, Named = true)]\nclass K\n{\n}"
            );
        }
    }
}
