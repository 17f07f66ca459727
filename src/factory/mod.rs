//! Factories: the two-way mapping between syntax fragments and model nodes.
//!
//! A [`Factory`] claims syntax fragments through a predicate, builds model
//! nodes from them, and regenerates syntax from nodes it recognizes. The
//! [`FactoryRegistry`] holds factories in a fixed order and dispatches to
//! the first one whose predicate accepts.
//!
//! ## Design
//!
//! - **One-to-many**: `build` returns every node a fragment expands to, in
//!   source order. `int x = 1, y = 2;` is one fragment and two fields; an
//!   attribute list is one fragment and one node per attribute.
//! - **Recursive dispatch**: factories build their children through
//!   [`BuildContext::build`] and [`BuildContext::build_into`], so a caller
//!   registering a factory first can take over any fragment at any depth.
//! - **Error nodes are skipped**: fragments produced by the parser's error
//!   recovery build nothing. They are logged and surface only through
//!   [`Dom::has_syntax_errors`](crate::Dom::has_syntax_errors).
//! - **Unformatted output**: `rebuild` returns bare fragments; the rebuild
//!   pipeline formats the result once.
//!
//! The default set covers declarations ([`stem`], [`types`], [`members`]),
//! statements ([`statements`]) and opaque expressions ([`expressions`]).

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use sharpdom_core::annotation::AnnotationList;
use sharpdom_core::error::DomError;
use sharpdom_core::text::{offset_to_position, snippet};
use sharpdom_syntax::builder::{node, punct, with_leading_comments};
use sharpdom_syntax::{SyntaxElement, SyntaxKind, SyntaxNode};

use crate::dom::Dom;
use crate::facet::Slot;
use crate::node::{Modifiers, Node, NodeId};
use crate::view::NodeRef;

pub mod expressions;
pub mod members;
pub mod statements;
pub mod stem;
pub mod types;

/// Longest source excerpt carried by an `UnsupportedConstruct` error.
const SNIPPET_CHARS: usize = 40;

// ============================================================================
// Factory trait
// ============================================================================

/// Builds model nodes from syntax and syntax from model nodes.
///
/// # Example
///
/// A factory that models `break;` statements as an extension variant:
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
///
/// use sharpdom::{
///     build_with, BuildContext, DomError, ExtensionNode, Factory, FactoryRegistry, Node,
///     NodeId, NodeKind, NodeRef, RebuildContext,
/// };
/// use sharpdom_syntax::builder::{node, punct, word};
/// use sharpdom_syntax::{SyntaxKind, SyntaxNode};
///
/// #[derive(Debug)]
/// struct Break;
///
/// impl ExtensionNode for Break {
///     fn kind_name(&self) -> &str { "Break" }
///     fn duplicate(&self) -> Option<Box<dyn ExtensionNode>> { Some(Box::new(Break)) }
///     fn same_shape(&self, _other: &dyn ExtensionNode) -> bool { true }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// struct BreakFactory;
///
/// impl Factory for BreakFactory {
///     fn name(&self) -> &str { "break" }
///
///     fn can_build_from(&self, syntax: &SyntaxNode) -> bool {
///         syntax.kind() == SyntaxKind::BreakStatement
///     }
///
///     fn build(&self, syntax: &Arc<SyntaxNode>, cx: &mut BuildContext<'_>) -> Result<Vec<NodeId>, DomError> {
///         Ok(vec![cx.alloc(Node::new(NodeKind::Extension(Box::new(Break)), syntax))])
///     }
///
///     fn can_rebuild(&self, node: NodeRef<'_>) -> bool {
///         node.kind_name() == "Break"
///     }
///
///     fn rebuild(&self, _node: NodeRef<'_>, _cx: &RebuildContext<'_>) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
///         Ok(vec![node(SyntaxKind::BreakStatement, vec![word("break"), punct(";")])])
///     }
/// }
///
/// let mut registry = FactoryRegistry::with_defaults();
/// registry.register_first(Box::new(BreakFactory));
/// let dom = build_with("class C { void M() { break; } }", &registry).unwrap();
/// let method = dom.root().classes()[0].methods()[0];
/// assert_eq!(method.statements()[0].kind_name(), "Break");
/// ```
pub trait Factory: Send + Sync {
    /// Short name used in logs and `MalformedInput` errors.
    fn name(&self) -> &str;

    fn can_build_from(&self, syntax: &SyntaxNode) -> bool;

    /// Build the nodes `syntax` expands to, in source order. The nodes are
    /// returned detached; the caller attaches them.
    fn build(
        &self,
        syntax: &Arc<SyntaxNode>,
        cx: &mut BuildContext<'_>,
    ) -> Result<Vec<NodeId>, DomError>;

    fn can_rebuild(&self, node: NodeRef<'_>) -> bool;

    /// Syntax for `node` and its subtree, unformatted.
    fn rebuild(
        &self,
        node: NodeRef<'_>,
        cx: &RebuildContext<'_>,
    ) -> Result<Vec<Arc<SyntaxNode>>, DomError>;
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered factories; the first accepting predicate wins.
pub struct FactoryRegistry {
    factories: Vec<Box<dyn Factory>>,
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("factories", &self.factory_names())
            .finish()
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FactoryRegistry {
    /// A registry with no factories.
    pub fn new() -> Self {
        FactoryRegistry {
            factories: Vec::new(),
        }
    }

    /// The built-in factories, in dispatch order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        stem::register(&mut registry);
        types::register(&mut registry);
        members::register(&mut registry);
        statements::register(&mut registry);
        expressions::register(&mut registry);
        registry
    }

    /// Add a factory after every registered one.
    pub fn register(&mut self, factory: Box<dyn Factory>) {
        self.factories.push(factory);
    }

    /// Add a factory ahead of every registered one.
    pub fn register_first(&mut self, factory: Box<dyn Factory>) {
        self.factories.insert(0, factory);
    }

    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    pub(crate) fn build_node(
        &self,
        syntax: &Arc<SyntaxNode>,
        cx: &mut BuildContext<'_>,
    ) -> Result<Vec<NodeId>, DomError> {
        if syntax.kind() == SyntaxKind::Error {
            let (line, col) = offset_to_position(&cx.source, syntax.offset());
            warn!(line, col, "skipping unparsable fragment");
            return Ok(Vec::new());
        }
        let Some(factory) = self.factories.iter().find(|f| f.can_build_from(syntax)) else {
            let (line, col) = offset_to_position(&cx.source, syntax.offset());
            return Err(DomError::UnsupportedConstruct {
                kind: syntax.kind().to_string(),
                line,
                col,
                snippet: snippet(&syntax.trimmed_text(), SNIPPET_CHARS),
            });
        };
        debug!(factory = factory.name(), kind = %syntax.kind(), "build");
        factory.build(syntax, cx)
    }

    pub(crate) fn rebuild_node(
        &self,
        node: NodeRef<'_>,
        cx: &RebuildContext<'_>,
    ) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let factory = self
            .factories
            .iter()
            .find(|f| f.can_rebuild(node))
            .ok_or_else(|| DomError::UnsupportedNode {
                kind: node.kind_name().to_string(),
            })?;
        debug!(factory = factory.name(), node = %node.id(), "rebuild");
        factory.rebuild(node, cx)
    }
}

// ============================================================================
// Contexts
// ============================================================================

/// State shared by the factories of one build pass.
pub struct BuildContext<'a> {
    dom: &'a mut Dom,
    registry: &'a FactoryRegistry,
    source: Arc<str>,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(dom: &'a mut Dom, registry: &'a FactoryRegistry, source: Arc<str>) -> Self {
        BuildContext {
            dom,
            registry,
            source,
        }
    }

    /// Dispatch `syntax` to the registry.
    pub fn build(&mut self, syntax: &Arc<SyntaxNode>) -> Result<Vec<NodeId>, DomError> {
        let registry = self.registry;
        registry.build_node(syntax, self)
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.dom.alloc(node)
    }

    /// Append a detached `member` to `slot` of `owner`.
    pub fn attach(&mut self, owner: NodeId, slot: Slot, member: NodeId) -> Result<(), DomError> {
        self.dom.append_child(owner, slot, member)
    }

    /// Build `syntax` and append every resulting node to `slot` of `owner`.
    pub fn build_into(
        &mut self,
        owner: NodeId,
        slot: Slot,
        syntax: &Arc<SyntaxNode>,
    ) -> Result<(), DomError> {
        for member in self.build(syntax)? {
            self.attach(owner, slot, member)?;
        }
        Ok(())
    }

    /// Annotation comments leading `syntax`.
    pub fn annotations(&self, syntax: &SyntaxNode) -> AnnotationList {
        AnnotationList::from_comments(syntax.leading_comments())
    }

    pub fn dom(&self) -> &Dom {
        self.dom
    }

    pub(crate) fn dom_mut(&mut self) -> &mut Dom {
        self.dom
    }
}

/// State shared by the factories of one rebuild pass.
pub struct RebuildContext<'a> {
    dom: &'a Dom,
    registry: &'a FactoryRegistry,
}

impl<'a> RebuildContext<'a> {
    pub(crate) fn new(dom: &'a Dom, registry: &'a FactoryRegistry) -> Self {
        RebuildContext { dom, registry }
    }

    pub fn dom(&self) -> &'a Dom {
        self.dom
    }

    /// Syntax for node `id`.
    pub fn rebuild(&self, id: NodeId) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        self.registry.rebuild_node(self.dom.node(id), self)
    }

    /// Syntax for a node that regenerates as exactly one fragment.
    pub fn rebuild_one(&self, id: NodeId) -> Result<Arc<SyntaxNode>, DomError> {
        let mut fragments = self.rebuild(id)?;
        if fragments.len() != 1 {
            return Err(DomError::malformed(
                self.dom.node(id).kind_name(),
                format!("expected one fragment, got {}", fragments.len()),
            ));
        }
        Ok(fragments.remove(0))
    }

    /// Syntax for every member of `slot`, in order.
    pub fn rebuild_slot(&self, node: NodeRef<'_>, slot: Slot) -> Result<Vec<Arc<SyntaxNode>>, DomError> {
        let mut out = Vec::new();
        for child in node.children(slot) {
            out.extend(self.rebuild(child.id())?);
        }
        Ok(out)
    }

    /// Syntax for the member of a single-child slot, if any.
    pub fn rebuild_child(&self, node: NodeRef<'_>, slot: Slot) -> Result<Option<Arc<SyntaxNode>>, DomError> {
        node.child(slot).map(|child| self.rebuild_one(child.id())).transpose()
    }

    /// Like [`rebuild_child`](Self::rebuild_child) for slots the syntax
    /// cannot do without.
    pub(crate) fn require_child(
        &self,
        node: NodeRef<'_>,
        slot: Slot,
        factory: &str,
    ) -> Result<Arc<SyntaxNode>, DomError> {
        self.rebuild_child(node, slot)?.ok_or_else(|| {
            DomError::malformed(factory, format!("{} has no {}", node.kind_name(), slot))
        })
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

/// Modifiers of the `ModifierList` child of `syntax`.
pub(crate) fn modifiers_of(syntax: &SyntaxNode) -> Modifiers {
    syntax
        .child_of_kind(SyntaxKind::ModifierList)
        .map(|list| Modifiers::from_words(list.child_tokens().map(|t| t.text())))
        .unwrap_or_default()
}

/// Build every `AttributeList` child of `syntax` into the `Attributes` slot.
pub(crate) fn build_attributes(
    cx: &mut BuildContext<'_>,
    owner: NodeId,
    syntax: &SyntaxNode,
) -> Result<(), DomError> {
    for list in syntax.children_of_kind(SyntaxKind::AttributeList) {
        cx.build_into(owner, Slot::Attributes, list)?;
    }
    Ok(())
}

/// Build the expression of the `EqualsValueClause` child of `syntax` into
/// `slot`.
pub(crate) fn build_initializer(
    cx: &mut BuildContext<'_>,
    owner: NodeId,
    slot: Slot,
    syntax: &SyntaxNode,
) -> Result<(), DomError> {
    let clause = syntax.child_of_kind(SyntaxKind::EqualsValueClause);
    if let Some(value) = clause.and_then(|c| c.child_expression()) {
        cx.build_into(owner, slot, value)?;
    }
    Ok(())
}

/// One `[...]` list per attribute.
pub(crate) fn rebuild_attributes(
    node: NodeRef<'_>,
    cx: &RebuildContext<'_>,
) -> Result<Vec<SyntaxElement>, DomError> {
    let mut out = Vec::new();
    for attribute in cx.rebuild_slot(node, Slot::Attributes)? {
        out.push(node_element(
            SyntaxKind::AttributeList,
            vec![punct("["), attribute.into(), punct("]")],
        ));
    }
    Ok(out)
}

/// `= value` for the member of `slot`, if any.
pub(crate) fn rebuild_initializer(
    node: NodeRef<'_>,
    slot: Slot,
    cx: &RebuildContext<'_>,
) -> Result<Option<Arc<SyntaxNode>>, DomError> {
    Ok(cx
        .rebuild_child(node, slot)?
        .map(|value| node_of(SyntaxKind::EqualsValueClause, vec![punct("="), value.into()])))
}

/// Leading annotation comments for a rebuilt fragment.
pub(crate) fn annotated(owner: NodeRef<'_>, syntax: Arc<SyntaxNode>) -> Arc<SyntaxNode> {
    let comments: Vec<String> = owner.annotations().iter().map(|a| a.to_comment()).collect();
    with_leading_comments(&syntax, &comments)
}

/// `items` separated by `separator` tokens.
pub(crate) fn separated(items: Vec<Arc<SyntaxNode>>, separator: &str) -> Vec<SyntaxElement> {
    let mut out = Vec::with_capacity(items.len() * 2);
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            out.push(punct(separator));
        }
        out.push(item.into());
    }
    out
}

pub(crate) fn node_of(kind: SyntaxKind, children: Vec<SyntaxElement>) -> Arc<SyntaxNode> {
    node(kind, children)
}

pub(crate) fn node_element(kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxElement {
    node(kind, children).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build, build_with};

    mod dispatch {
        use super::*;

        #[test]
        fn unmatched_fragment_reports_position() {
            let err = build("class C\n{\n    C() { }\n}").unwrap_err();
            match err {
                DomError::UnsupportedConstruct {
                    kind,
                    line,
                    col,
                    snippet,
                } => {
                    assert_eq!(kind, "ConstructorDeclaration");
                    assert_eq!((line, col), (3, 5));
                    assert_eq!(snippet, "C() { }");
                }
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn unmodelled_statements_are_unsupported() {
            for body in ["break;", "i++;", "throw e;", ";"] {
                let source = format!("class C {{ void M() {{ {} }} }}", body);
                assert!(
                    matches!(build(&source), Err(DomError::UnsupportedConstruct { .. })),
                    "{}",
                    body
                );
            }
        }

        #[test]
        fn error_nodes_are_skipped() {
            let dom = build("class C { int x; ??? int y; }").unwrap();
            assert!(dom.has_syntax_errors());
            let names: Vec<String> = dom.root().classes()[0]
                .fields()
                .iter()
                .map(|f| f.name())
                .collect();
            assert!(names.contains(&"x".to_string()));
        }

        #[test]
        fn empty_registry_supports_nothing() {
            let err = build_with("class C { }", &FactoryRegistry::new()).unwrap_err();
            assert!(matches!(err, DomError::UnsupportedConstruct { ref kind, .. } if kind == "CompilationUnit"));
        }
    }

    mod registry {
        use super::*;

        #[test]
        fn default_order_starts_with_the_root() {
            let registry = FactoryRegistry::with_defaults();
            let names = registry.factory_names();
            assert_eq!(names[0], "root");
            assert_eq!(names.last().copied(), Some("expression"));
        }

        #[test]
        fn modifiers_are_read_from_the_list() {
            let tree = sharpdom_syntax::parse_member("protected internal static readonly int x;");
            let modifiers = modifiers_of(tree.root());
            assert_eq!(
                modifiers.access,
                Some(sharpdom_core::types::AccessModifier::ProtectedInternal)
            );
            assert!(modifiers.is_static);
            assert_eq!(modifiers.other, vec!["readonly".to_string()]);
        }
    }
}
