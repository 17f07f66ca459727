//! The model arena.
//!
//! A [`Dom`] owns every node of one model together with the symbol resolver
//! that answers semantic questions about their syntax. Nodes refer to each
//! other by [`NodeId`]; the root is always the first node allocated.
//!
//! Reading goes through [`NodeRef`] views; every edit goes through
//! `&mut Dom` so the parent links and container lists stay consistent.

use sharpdom_core::annotation::AnnotationList;
use sharpdom_core::error::DomError;
use sharpdom_core::types::AccessModifier;
use sharpdom_syntax::{SemanticModel, SymbolResolver};

use crate::facet::Facet;
use crate::node::{MemberFlags, Node, NodeId};
use crate::view::NodeRef;

#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
    resolver: Box<dyn SymbolResolver>,
    has_syntax_errors: bool,
}

impl Dom {
    pub(crate) fn new(resolver: Box<dyn SymbolResolver>) -> Self {
        Dom {
            nodes: Vec::new(),
            resolver,
            has_syntax_errors: false,
        }
    }

    pub(crate) fn set_has_syntax_errors(&mut self, value: bool) {
        self.has_syntax_errors = value;
    }

    /// The root node.
    ///
    /// # Panics
    ///
    /// Never for a model returned by [`build`](crate::build).
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root_id())
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// View of node `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not issued by this model. Use [`Dom::get`] for ids of
    /// unknown origin.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, id)
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then(|| NodeRef::new(self, id))
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the source the model was built from needed error recovery.
    pub fn has_syntax_errors(&self) -> bool {
        self.has_syntax_errors
    }

    pub fn resolver(&self) -> &dyn SymbolResolver {
        self.resolver.as_ref()
    }

    /// Whether two models have the same intent, starting at their roots.
    pub fn same_intent(&self, other: &Dom, include_annotations: bool) -> bool {
        self.root().same_intent(other.root(), include_annotations)
    }

    // ------------------------------------------------------------------
    // Arena access
    // ------------------------------------------------------------------

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn resolver_mut(&mut self) -> &mut dyn SymbolResolver {
        self.resolver.as_mut()
    }

    pub(crate) fn check_id(&self, id: NodeId) -> Result<(), DomError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::invalid_args(format!("unknown node {}", id)))
        }
    }

    fn check_facet(&self, id: NodeId, facet: Facet) -> Result<(), DomError> {
        self.check_id(id)?;
        let kind = self.node_ref(id).kind();
        if kind.tag().has_facet(facet) {
            Ok(())
        } else {
            Err(DomError::MissingFacet {
                kind: kind.kind_name().to_string(),
                facet: facet.name().to_string(),
            })
        }
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Override the node's name. The override wins over the resolved symbol.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), DomError> {
        self.check_id(id)?;
        self.node_mut(id).name_override = Some(name.into());
        Ok(())
    }

    /// Set the written access modifier; `None` falls back to the default for
    /// the declaration's context.
    pub fn set_access_modifier(
        &mut self,
        id: NodeId,
        access: Option<AccessModifier>,
    ) -> Result<(), DomError> {
        self.check_facet(id, Facet::AccessModifier)?;
        self.node_mut(id).modifiers.access = access;
        Ok(())
    }

    pub fn set_static(&mut self, id: NodeId, is_static: bool) -> Result<(), DomError> {
        self.check_facet(id, Facet::Static)?;
        self.node_mut(id).modifiers.is_static = is_static;
        Ok(())
    }

    pub fn set_member_flags(&mut self, id: NodeId, flags: MemberFlags) -> Result<(), DomError> {
        self.check_facet(id, Facet::MemberFlags)?;
        self.node_mut(id).modifiers.flags = flags;
        Ok(())
    }

    pub fn annotations_mut(&mut self, id: NodeId) -> Result<&mut AnnotationList, DomError> {
        self.check_id(id)?;
        Ok(&mut self.node_mut(id).annotations)
    }
}

impl Default for Dom {
    /// An empty model backed by a fresh [`SemanticModel`].
    fn default() -> Self {
        Dom::new(Box::new(SemanticModel::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use sharpdom_core::annotation::PublicAnnotation;

    mod edits {
        use super::*;

        #[test]
        fn set_access_modifier_on_a_class() {
            let mut dom = build("public class Foo { }").unwrap();
            let foo = dom.root().classes()[0].id();
            dom.set_access_modifier(foo, Some(AccessModifier::Internal)).unwrap();
            assert_eq!(dom.node(foo).access_modifier(), Some(AccessModifier::Internal));
        }

        #[test]
        fn missing_facet_is_an_error() {
            let mut dom = build("namespace N { }").unwrap();
            let ns = dom.root().namespaces()[0].id();
            let err = dom.set_static(ns, true).unwrap_err();
            assert!(matches!(err, DomError::MissingFacet { .. }));
            assert_eq!(err.to_string(), "Namespace has no static facet");
        }

        #[test]
        fn unknown_ids_are_rejected() {
            let mut dom = build("class A { }").unwrap();
            let bogus = NodeId(999);
            assert!(dom.get(bogus).is_none());
            assert!(matches!(
                dom.set_name(bogus, "B"),
                Err(DomError::InvalidArguments { .. })
            ));
        }

        #[test]
        fn annotations_are_editable() {
            let mut dom = build("class A { }").unwrap();
            let a = dom.root().classes()[0].id();
            dom.annotations_mut(a)
                .unwrap()
                .add(PublicAnnotation::new("Owner").with_value("Owner", "Fred"));
            assert_eq!(dom.node(a).annotations().len(), 1);
        }
    }

    #[test]
    fn default_model_is_empty() {
        let dom = Dom::default();
        assert!(dom.is_empty());
        assert!(!dom.has_syntax_errors());
    }
}
