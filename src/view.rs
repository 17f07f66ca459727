//! Read-only views of model nodes.
//!
//! ## Names
//!
//! [`NodeRef::name`] prefers, in order: a name set by an edit, the name of
//! the resolved symbol, the name the factory read from syntax.
//!
//! ## Placement
//!
//! The namespaces and types enclosing a node come from its symbol while the
//! node sits where it was parsed. Once the node or an ancestor has been moved
//! by a container edit, or an ancestor has been renamed, placement is
//! derived from the model tree instead, so qualified names follow edits.
//! Unresolved nodes always use the tree.

use std::fmt;
use std::sync::Arc;

use sharpdom_core::annotation::AnnotationList;
use sharpdom_core::types::{join_dotted, AccessModifier, Symbol};
use sharpdom_syntax::SyntaxNode;

use crate::container::Container;
use crate::dom::Dom;
use crate::facet::{normalize_key, Arity, Facet, Slot};
use crate::node::{
    MemberFlags, Modifiers, Node, NodeId, NodeKind, NodeKindTag, Placement, Resolution, Value,
};

/// A node together with the model that owns it.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind_name())
            .field("name", &self.name())
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(dom: &'a Dom, id: NodeId) -> Self {
        NodeRef { dom, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn dom(&self) -> &'a Dom {
        self.dom
    }

    pub(crate) fn raw(&self) -> &'a Node {
        self.dom.node_ref(self.id)
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.raw().kind
    }

    pub fn tag(&self) -> NodeKindTag {
        self.kind().tag()
    }

    pub fn kind_name(&self) -> &'a str {
        self.kind().kind_name()
    }

    /// Current syntax fragment.
    pub fn syntax(&self) -> &'a Arc<SyntaxNode> {
        &self.raw().syntax
    }

    /// The fragment the node was built from.
    pub fn original_syntax(&self) -> &'a Arc<SyntaxNode> {
        &self.raw().original_syntax
    }

    pub fn annotations(&self) -> &'a AnnotationList {
        &self.raw().annotations
    }

    pub fn modifiers(&self) -> &'a Modifiers {
        &self.raw().modifiers
    }

    pub fn resolution(&self) -> &'a Resolution {
        &self.raw().resolution
    }

    pub fn symbol(&self) -> Option<&'a Symbol> {
        self.resolution().symbol()
    }

    /// Symbol resolution failed; names and placement are best effort.
    pub fn is_degraded(&self) -> bool {
        matches!(self.resolution(), Resolution::Failed(_))
    }

    /// Static type of an expression node, when the resolver knew it.
    pub fn static_type(&self) -> Option<&'a str> {
        match self.resolution() {
            Resolution::Typed(ty) => Some(ty),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.raw().parent.map(|link| NodeRef::new(self.dom, link.owner))
    }

    pub fn parent_slot(&self) -> Option<Slot> {
        self.raw().parent.map(|link| link.slot)
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn slots(&self) -> &'static [Slot] {
        self.kind().slots()
    }

    pub fn container(&self, slot: Slot) -> Option<&'a Container> {
        self.raw().container(slot)
    }

    /// Members of `slot`, empty if the variant has no such slot.
    pub fn children(&self, slot: Slot) -> Vec<NodeRef<'a>> {
        self.container(slot)
            .map(|c| c.members().iter().map(|id| NodeRef::new(self.dom, *id)).collect())
            .unwrap_or_default()
    }

    /// The member of a single-child slot.
    pub fn child(&self, slot: Slot) -> Option<NodeRef<'a>> {
        self.container(slot)
            .and_then(|c| c.members().first())
            .map(|id| NodeRef::new(self.dom, *id))
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    pub fn name(&self) -> String {
        let node = self.raw();
        if let Some(name) = &node.name_override {
            return name.clone();
        }
        if let Some(symbol) = node.resolution.symbol() {
            return symbol.name.clone();
        }
        node.declared_name.clone()
    }

    /// Name qualified by the containing types. A namespace's outer name is
    /// its own declared name.
    pub fn outer_name(&self) -> String {
        if self.tag() == NodeKindTag::Namespace {
            return self.name();
        }
        let placement = self.placement();
        join_dotted(placement.types.iter().map(String::as_str), &self.name())
    }

    /// Namespaces, containing types and name.
    pub fn qualified_name(&self) -> String {
        let placement = self.placement();
        join_dotted(
            placement
                .namespaces
                .iter()
                .chain(placement.types.iter())
                .map(String::as_str),
            &self.name(),
        )
    }

    /// The containing namespace, dotted.
    pub fn namespace(&self) -> String {
        self.placement().namespaces.join(".")
    }

    pub(crate) fn placement(&self) -> Placement {
        if let Some(symbol) = self.symbol() {
            if self.placement_follows_symbol() {
                return Placement {
                    namespaces: symbol.containing_namespaces.clone(),
                    types: symbol.containing_types.clone(),
                };
            }
        }
        self.structural_placement()
    }

    fn placement_follows_symbol(&self) -> bool {
        !self.raw().relocated
            && self
                .ancestors()
                .all(|a| !a.raw().relocated && a.raw().name_override.is_none())
    }

    /// Placement read off the enclosing namespace and type nodes.
    pub(crate) fn structural_placement(&self) -> Placement {
        let mut namespaces: Vec<String> = Vec::new();
        let mut types: Vec<String> = Vec::new();
        let mut top = *self;
        for ancestor in self.ancestors() {
            let tag = ancestor.tag();
            if tag == NodeKindTag::Namespace {
                let name = ancestor.name();
                for segment in name.rsplit('.').filter(|s| !s.is_empty()) {
                    namespaces.push(segment.to_string());
                }
            } else if tag.is_type() {
                types.push(ancestor.name());
            }
            top = ancestor;
        }
        namespaces.reverse();
        types.reverse();
        match &top.raw().anchor {
            Some(anchor) => Placement {
                namespaces: anchor.namespaces.iter().cloned().chain(namespaces).collect(),
                types: anchor.types.iter().cloned().chain(types).collect(),
            },
            None => Placement { namespaces, types },
        }
    }

    // ------------------------------------------------------------------
    // Facets
    // ------------------------------------------------------------------

    /// Written access, else the default the resolver reported.
    pub fn access_modifier(&self) -> Option<AccessModifier> {
        if !self.tag().has_facet(Facet::AccessModifier) {
            return None;
        }
        self.modifiers()
            .access
            .or_else(|| self.symbol().and_then(|s| s.accessibility))
    }

    pub fn is_static(&self) -> Option<bool> {
        self.tag()
            .has_facet(Facet::Static)
            .then(|| self.modifiers().is_static)
    }

    pub fn member_flags(&self) -> Option<MemberFlags> {
        self.tag()
            .has_facet(Facet::MemberFlags)
            .then(|| self.modifiers().flags)
    }

    pub fn return_type(&self) -> Option<NodeRef<'a>> {
        if !self.tag().has_facet(Facet::ReturnType) {
            return None;
        }
        self.child(Slot::Type)
    }

    pub fn attributes(&self) -> Option<Vec<NodeRef<'a>>> {
        self.tag()
            .has_facet(Facet::Attributes)
            .then(|| self.children(Slot::Attributes))
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    pub fn members(&self) -> Vec<NodeRef<'a>> {
        self.children(Slot::Members)
    }

    pub fn statements(&self) -> Vec<NodeRef<'a>> {
        self.children(Slot::Statements)
    }

    pub fn members_of_kind(&self, tag: NodeKindTag) -> Vec<NodeRef<'a>> {
        self.members().into_iter().filter(|m| m.tag() == tag).collect()
    }

    pub fn methods(&self) -> Vec<NodeRef<'a>> {
        self.members_of_kind(NodeKindTag::Method)
    }

    pub fn properties(&self) -> Vec<NodeRef<'a>> {
        self.members_of_kind(NodeKindTag::Property)
    }

    pub fn fields(&self) -> Vec<NodeRef<'a>> {
        self.members_of_kind(NodeKindTag::Field)
    }

    pub fn classes(&self) -> Vec<NodeRef<'a>> {
        self.members_of_kind(NodeKindTag::Class)
    }

    /// Classes, structs, interfaces and enums.
    pub fn types(&self) -> Vec<NodeRef<'a>> {
        self.members().into_iter().filter(|m| m.tag().is_type()).collect()
    }

    pub fn namespaces(&self) -> Vec<NodeRef<'a>> {
        self.members_of_kind(NodeKindTag::Namespace)
    }

    /// Every namespace below this node, in pre-order.
    pub fn all_child_namespaces(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        for namespace in self.namespaces() {
            out.push(namespace);
            out.extend(namespace.all_child_namespaces());
        }
        out
    }

    /// Namespaces below this node that hold something besides namespaces.
    pub fn non_empty_namespaces(&self) -> Vec<NodeRef<'a>> {
        self.all_child_namespaces()
            .into_iter()
            .filter(|ns| ns.members().iter().any(|m| m.tag() != NodeKindTag::Namespace))
            .collect()
    }

    /// Classes declared here or in any nested namespace, not nested classes.
    pub fn root_classes(&self) -> Vec<NodeRef<'a>> {
        self.root_members_of_kind(NodeKindTag::Class)
    }

    pub fn root_structs(&self) -> Vec<NodeRef<'a>> {
        self.root_members_of_kind(NodeKindTag::Struct)
    }

    pub fn root_interfaces(&self) -> Vec<NodeRef<'a>> {
        self.root_members_of_kind(NodeKindTag::Interface)
    }

    pub fn root_enums(&self) -> Vec<NodeRef<'a>> {
        self.root_members_of_kind(NodeKindTag::Enum)
    }

    fn root_members_of_kind(&self, tag: NodeKindTag) -> Vec<NodeRef<'a>> {
        let mut out = self.members_of_kind(tag);
        for namespace in self.non_empty_namespaces() {
            out.extend(namespace.members_of_kind(tag));
        }
        out
    }

    // ------------------------------------------------------------------
    // Generic access
    // ------------------------------------------------------------------

    /// Look up a property by name.
    ///
    /// Keys ignore case and underscores. Every slot is available under its
    /// name. Returns `None` for keys the variant does not have.
    ///
    /// ```
    /// use sharpdom::{build, Value};
    ///
    /// let dom = build("namespace N { public class C { } }").unwrap();
    /// let class = dom.root().root_classes()[0];
    /// assert_eq!(class.request_value("QualifiedName"), Some(Value::Text("N.C".into())));
    /// assert_eq!(class.request_value("access_modifier"), Some(Value::Text("public".into())));
    /// assert_eq!(class.request_value("no_such_key"), None);
    /// ```
    pub fn request_value(&self, key: &str) -> Option<Value> {
        let key = normalize_key(key);
        let value = match key.as_str() {
            "name" => Some(Value::Text(self.name())),
            "outername" => Some(Value::Text(self.outer_name())),
            "qualifiedname" => Some(Value::Text(self.qualified_name())),
            "namespace" => Some(Value::Text(self.namespace())),
            "kind" => Some(Value::from(self.kind_name())),
            "isdegraded" => Some(Value::Bool(self.is_degraded())),
            "accessmodifier" => self.access_modifier().map(|a| Value::Text(a.to_string())),
            "isstatic" => self.is_static().map(Value::Bool),
            "isabstract" => self.member_flags().map(|f| Value::Bool(f.is_abstract)),
            "isoverride" => self.member_flags().map(|f| Value::Bool(f.is_override)),
            "issealed" => self.member_flags().map(|f| Value::Bool(f.is_sealed)),
            "isvirtual" => self.member_flags().map(|f| Value::Bool(f.is_virtual)),
            "returntype" => self.return_type().map(|t| Value::Text(t.name())),
            "statictype" => self.static_type().map(Value::from),
            "hassyntaxerrors" if self.tag() == NodeKindTag::Root => {
                Some(Value::Bool(self.dom.has_syntax_errors()))
            }
            _ => None,
        };
        value
            .or_else(|| self.shape_value(&key))
            .or_else(|| self.slot_value(&key))
    }

    fn shape_value(&self, key: &str) -> Option<Value> {
        match (self.kind(), key) {
            (NodeKind::Method { has_body }, "hasbody") => Some(Value::Bool(*has_body)),
            (NodeKind::Accessor { has_body, .. }, "hasbody") => Some(Value::Bool(*has_body)),
            (NodeKind::Accessor { keyword, .. }, "keyword") => Some(Value::from(keyword.keyword())),
            (NodeKind::Parameter { modifier, .. }, "modifier") => {
                Some(Value::from(modifier.keyword().unwrap_or("none")))
            }
            (NodeKind::Parameter { ordinal, .. }, "ordinal") => Some(Value::Int(*ordinal as i64)),
            (NodeKind::Assignment { operator }, "operator") => Some(Value::Text(operator.clone())),
            (NodeKind::Expression { text, .. }, "text") => Some(Value::Text(text.clone())),
            (NodeKind::Expression { syntax_kind, .. }, "syntaxkind") => {
                Some(Value::Text(syntax_kind.to_string()))
            }
            (NodeKind::Extension(ext), key) => ext.value(key),
            _ => None,
        }
    }

    fn slot_value(&self, key: &str) -> Option<Value> {
        let slot = Slot::from_name(key)?;
        let container = self.container(slot)?;
        match slot.arity() {
            Arity::One => container.members().first().map(|id| Value::Node(*id)),
            Arity::Many => Some(Value::Nodes(container.members().to_vec())),
        }
    }

    /// See [`crate::same_intent`].
    pub fn same_intent(&self, other: NodeRef<'_>, include_annotations: bool) -> bool {
        crate::same_intent::same_intent(*self, other, include_annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;

    mod names {
        use super::*;

        #[test]
        fn nested_type_names() {
            let dom = build("namespace A.B { class Outer { class Inner { int x; } } }").unwrap();
            let outer = dom.root().root_classes()[0];
            let inner = outer.classes()[0];
            let x = inner.fields()[0];
            assert_eq!(inner.outer_name(), "Outer.Inner");
            assert_eq!(inner.qualified_name(), "A.B.Outer.Inner");
            assert_eq!(inner.namespace(), "A.B");
            assert_eq!(x.outer_name(), "Outer.Inner.x");
        }

        #[test]
        fn namespace_outer_name_is_its_declared_name() {
            let dom = build("namespace A { namespace B.C { } }").unwrap();
            let nested = dom.root().all_child_namespaces()[1];
            assert_eq!(nested.outer_name(), "B.C");
            assert_eq!(nested.qualified_name(), "A.B.C");
            assert_eq!(nested.namespace(), "A");
        }

        #[test]
        fn override_wins_and_moves_descendants() {
            let mut dom = build("namespace N { class C { int x; } }").unwrap();
            let class = dom.root().root_classes()[0].id();
            let x = dom.node(class).fields()[0].id();
            dom.set_name(class, "Renamed").unwrap();
            assert_eq!(dom.node(class).name(), "Renamed");
            assert_eq!(dom.node(x).qualified_name(), "N.Renamed.x");
        }

        #[test]
        fn moved_nodes_follow_the_tree() {
            let mut dom = build("namespace A { class C { } } namespace B { }").unwrap();
            let c = dom.root().root_classes()[0].id();
            let b = dom.root().namespaces()[1].id();
            dom.add_or_move(b, Slot::Members, c).unwrap();
            assert_eq!(dom.node(c).qualified_name(), "B.C");
        }
    }

    mod facets {
        use super::*;

        #[test]
        fn default_access_comes_from_the_symbol() {
            let dom = build("class C { int x; public int y; }").unwrap();
            let class = dom.root().classes()[0];
            assert_eq!(class.access_modifier(), Some(AccessModifier::Internal));
            let fields = class.fields();
            assert_eq!(fields[0].access_modifier(), Some(AccessModifier::Private));
            assert_eq!(fields[1].access_modifier(), Some(AccessModifier::Public));
        }

        #[test]
        fn absent_facets_are_none() {
            let dom = build("namespace N { struct S { } }").unwrap();
            let ns = dom.root().namespaces()[0];
            assert_eq!(ns.access_modifier(), None);
            assert_eq!(ns.is_static(), None);
            let s = ns.types()[0];
            assert_eq!(s.is_static(), None);
            assert_eq!(s.member_flags(), None);
            assert_eq!(s.attributes().map(|a| a.len()), Some(0));
        }

        #[test]
        fn return_type_and_flags() {
            let dom = build("abstract class A { public abstract string Name(); }").unwrap();
            let class = dom.root().classes()[0];
            let method = class.methods()[0];
            assert_eq!(method.return_type().map(|t| t.name()), Some("string".to_string()));
            assert!(method.member_flags().unwrap().is_abstract);
            assert!(class.member_flags().unwrap().is_abstract);
        }
    }

    mod views {
        use super::*;

        #[test]
        fn root_conveniences() {
            let dom = build(
                "class Top { class Nested { } }\n\
                 namespace A { namespace B { class InB { } } }\n\
                 namespace C { interface I { } }\n\
                 struct Point { int x; }\n\
                 namespace A.D { enum Color { Red } struct Size { } }",
            )
            .unwrap();
            let root = dom.root();
            fn names(nodes: Vec<NodeRef<'_>>) -> Vec<String> {
                nodes.iter().map(|n| n.name()).collect()
            }
            assert_eq!(names(root.root_classes()), vec!["Top", "InB"]);
            assert_eq!(names(root.root_interfaces()), vec!["I"]);
            assert_eq!(names(root.root_structs()), vec!["Point", "Size"]);
            assert_eq!(names(root.root_enums()), vec!["Color"]);
            let all: Vec<String> = root
                .all_child_namespaces()
                .iter()
                .map(|n| n.qualified_name())
                .collect();
            assert_eq!(all, vec!["A", "A.B", "C", "A.D"]);
            let non_empty: Vec<String> = root
                .non_empty_namespaces()
                .iter()
                .map(|n| n.qualified_name())
                .collect();
            assert_eq!(non_empty, vec!["A.B", "C", "A.D"]);
        }

        #[test]
        fn member_filters() {
            let dom = build("class A { int f; int P { get; } void M() { } enum E { X } }").unwrap();
            let class = dom.root().classes()[0];
            assert_eq!(class.fields().len(), 1);
            assert_eq!(class.properties().len(), 1);
            assert_eq!(class.methods().len(), 1);
            assert_eq!(class.types().len(), 1);
            assert_eq!(class.members_of_kind(NodeKindTag::Enum)[0].name(), "E");
        }
    }

    mod request_value {
        use super::*;

        #[test]
        fn slots_by_name() {
            let dom = build("class A { void M(int a, int b) { } }").unwrap();
            let method = dom.root().classes()[0].methods()[0];
            match method.request_value("Parameters") {
                Some(Value::Nodes(ids)) => assert_eq!(ids.len(), 2),
                other => panic!("unexpected {:?}", other),
            }
            assert!(matches!(method.request_value("type"), Some(Value::Node(_))));
            assert_eq!(method.request_value("HasBody"), Some(Value::Bool(true)));
            assert_eq!(method.request_value("members"), None);
        }

        #[test]
        fn parameter_shape() {
            let dom = build("class A { void M(int a, ref int b) { } }").unwrap();
            let method = dom.root().classes()[0].methods()[0];
            let b = method.children(Slot::Parameters)[1];
            assert_eq!(b.request_value("modifier"), Some(Value::from("ref")));
            assert_eq!(b.request_value("ordinal"), Some(Value::Int(1)));
            assert_eq!(b.request_value("return_type"), Some(Value::from("int")));
        }

        #[test]
        fn unknown_keys_are_none() {
            let dom = build("class A { }").unwrap();
            assert_eq!(dom.root().request_value("whatever"), None);
            assert_eq!(
                dom.root().request_value("has_syntax_errors"),
                Some(Value::Bool(false))
            );
        }
    }
}
