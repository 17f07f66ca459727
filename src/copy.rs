//! Deep copies of model subtrees.
//!
//! ## Design
//!
//! Every variant states how it is copied in [`duplicate_kind`]; there is no
//! field-by-field reflection. Extension variants copy through
//! [`ExtensionNode::duplicate`](crate::ExtensionNode::duplicate) and may
//! decline, in which case the whole copy fails with `MissingCloneSupport`
//! before anything is allocated.
//!
//! A copy shares the syntax fragments of its source (they are immutable and
//! `Arc`-shared), carries the same annotations, modifiers and names, and is
//! resolved again on its own. It starts detached. Until it is attached
//! somewhere, its placement is the placement its source had, so a fresh
//! copy reports the same qualified name as the original.

use std::collections::HashMap;

use tracing::debug;

use sharpdom_core::error::DomError;

use crate::container::Container;
use crate::dom::Dom;
use crate::node::{Node, NodeId, NodeKind, ParentLink, Resolution};

impl Dom {
    /// Copy the subtree rooted at `id`, returning the detached copy.
    ///
    /// ```
    /// use sharpdom::build;
    ///
    /// let mut dom = build("namespace N { class C { int x; } }").unwrap();
    /// let class = dom.root().root_classes()[0].id();
    /// let copy = dom.copy(class).unwrap();
    /// assert!(dom.node(copy).parent().is_none());
    /// assert_eq!(dom.node(copy).qualified_name(), "N.C");
    /// assert!(dom.node(copy).same_intent(dom.node(class), true));
    /// ```
    pub fn copy(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        self.check_id(id)?;
        let order = self.subtree(id);
        let kinds = order
            .iter()
            .map(|source| {
                let kind = &self.node_ref(*source).kind;
                duplicate_kind(kind).ok_or_else(|| DomError::MissingCloneSupport {
                    kind: kind.kind_name().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let anchor = self.node(id).placement();

        let mut mapping: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
        for (source, kind) in order.iter().zip(kinds) {
            let copy = duplicate_node(self.node_ref(*source), kind);
            let copy_id = self.alloc(copy);
            mapping.insert(*source, copy_id);
        }
        for source in &order {
            let copy_id = mapping[source];
            let containers: Vec<Container> = self
                .node_ref(*source)
                .containers
                .iter()
                .map(|c| {
                    Container::with_members(
                        c.slot(),
                        c.members().iter().map(|m| mapping[m]).collect(),
                    )
                })
                .collect();
            for container in &containers {
                for member in container.members() {
                    self.node_mut(*member).parent = Some(ParentLink {
                        owner: copy_id,
                        slot: container.slot(),
                    });
                }
            }
            self.node_mut(copy_id).containers = containers;
        }

        let root = mapping[&id];
        let node = self.node_mut(root);
        node.relocated = true;
        node.anchor = Some(anchor);
        self.resolve_subtree(root);
        debug!(source = %id, copy = %root, nodes = order.len(), "copied subtree");
        Ok(root)
    }

    /// `id` and its descendants, pre-order.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for container in self.node_ref(current).containers.iter().rev() {
                stack.extend(container.members().iter().rev().copied());
            }
        }
        out
    }
}

fn duplicate_node(source: &Node, kind: NodeKind) -> Node {
    Node {
        kind,
        original_syntax: source.original_syntax.clone(),
        syntax: source.syntax.clone(),
        annotations: source.annotations.clone(),
        modifiers: source.modifiers.clone(),
        declared_name: source.declared_name.clone(),
        name_override: source.name_override.clone(),
        resolution: Resolution::Pending,
        parent: None,
        relocated: false,
        anchor: None,
        containers: Vec::new(),
    }
}

/// The variant of a copy, or `None` if the variant cannot be copied.
pub(crate) fn duplicate_kind(kind: &NodeKind) -> Option<NodeKind> {
    let copy = match kind {
        NodeKind::Root => NodeKind::Root,
        NodeKind::Using => NodeKind::Using,
        NodeKind::Namespace => NodeKind::Namespace,
        NodeKind::Class => NodeKind::Class,
        NodeKind::Struct => NodeKind::Struct,
        NodeKind::Interface => NodeKind::Interface,
        NodeKind::Enum => NodeKind::Enum,
        NodeKind::EnumMember => NodeKind::EnumMember,
        NodeKind::Method { has_body } => NodeKind::Method {
            has_body: *has_body,
        },
        NodeKind::Property => NodeKind::Property,
        NodeKind::Accessor { keyword, has_body } => NodeKind::Accessor {
            keyword: *keyword,
            has_body: *has_body,
        },
        NodeKind::Field => NodeKind::Field,
        NodeKind::Parameter { modifier, ordinal } => NodeKind::Parameter {
            modifier: *modifier,
            ordinal: *ordinal,
        },
        NodeKind::TypeParameter => NodeKind::TypeParameter,
        NodeKind::Attribute => NodeKind::Attribute,
        NodeKind::AttributeValue { style } => NodeKind::AttributeValue { style: *style },
        NodeKind::TypeReference => NodeKind::TypeReference,
        NodeKind::Block => NodeKind::Block,
        NodeKind::If {
            braced,
            else_braced,
        } => NodeKind::If {
            braced: *braced,
            else_braced: *else_braced,
        },
        NodeKind::ElseIf { braced } => NodeKind::ElseIf { braced: *braced },
        NodeKind::LocalDeclaration => NodeKind::LocalDeclaration,
        NodeKind::Assignment { operator } => NodeKind::Assignment {
            operator: operator.clone(),
        },
        NodeKind::Invocation => NodeKind::Invocation,
        NodeKind::Return => NodeKind::Return,
        NodeKind::For { braced } => NodeKind::For { braced: *braced },
        NodeKind::While { braced } => NodeKind::While { braced: *braced },
        NodeKind::Expression { syntax_kind, text } => NodeKind::Expression {
            syntax_kind: *syntax_kind,
            text: text.clone(),
        },
        NodeKind::Extension(ext) => NodeKind::Extension(ext.duplicate()?),
    };
    Some(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    use crate::build::build;
    use crate::facet::Slot;
    use crate::node::ExtensionNode;

    #[derive(Debug)]
    struct Opaque;

    impl ExtensionNode for Opaque {
        fn kind_name(&self) -> &str {
            "Opaque"
        }

        fn duplicate(&self) -> Option<Box<dyn ExtensionNode>> {
            None
        }

        fn same_shape(&self, _other: &dyn ExtensionNode) -> bool {
            true
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn copy_is_detached_and_equivalent() {
        let mut dom = build(
            "namespace N { [Serializable] public class C<T> : Base { \
             //[[ Owner(\"Fred\") ]]\n public int P { get; set; } \
             void M(int a) { if (a > 0) { Run(a); } } } }",
        )
        .unwrap();
        let class = dom.root().root_classes()[0].id();
        let copy = dom.copy(class).unwrap();

        let original = dom.node(class);
        let copied = dom.node(copy);
        assert_ne!(copy, class);
        assert!(copied.parent().is_none());
        assert_eq!(copied.qualified_name(), "N.C");
        assert_eq!(copied.access_modifier(), original.access_modifier());
        assert!(copied.same_intent(original, true));
        for member in copied.members() {
            assert_eq!(member.parent().map(|p| p.id()), Some(copy));
        }
        assert!(!copied.is_degraded());
    }

    #[test]
    fn copies_are_independent() {
        let mut dom = build("namespace N { class C { int x; } } namespace M { }").unwrap();
        let class = dom.root().root_classes()[0].id();
        let copy = dom.copy(class).unwrap();
        let x = dom.node(copy).fields()[0].id();
        dom.set_name(x, "y").unwrap();
        assert_eq!(dom.node(class).fields()[0].name(), "x");
        assert!(!dom.node(copy).same_intent(dom.node(class), false));

        let m = dom.root().namespaces()[1].id();
        dom.add_or_move(m, Slot::Members, copy).unwrap();
        assert_eq!(dom.node(copy).qualified_name(), "M.C");
        assert_eq!(dom.node(x).qualified_name(), "M.C.y");
        assert_eq!(dom.node(class).qualified_name(), "N.C");
    }

    #[test]
    fn declined_extension_fails_without_allocating() {
        let mut dom = build("class C { int x; }").unwrap();
        let class = dom.root().classes()[0].id();
        let syntax = dom.node(class).syntax().clone();
        let opaque = dom.alloc(Node::new(NodeKind::Extension(Box::new(Opaque)), &syntax));
        dom.add_or_move(class, Slot::Members, opaque).unwrap();

        let before = dom.len();
        let err = dom.copy(class).unwrap_err();
        assert!(matches!(err, DomError::MissingCloneSupport { ref kind } if kind == "Opaque"));
        assert_eq!(err.to_string(), "Opaque does not support copying");
        assert_eq!(dom.len(), before);
    }
}
