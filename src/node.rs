//! Model nodes.
//!
//! A [`Node`] pairs a syntax fragment with the editable data a factory read
//! from it: the variant ([`NodeKind`]), modifiers, annotations, an optional
//! name override, one [`Container`] per slot of its variant, and the
//! [`Resolution`] filled in by the resolve pass.
//!
//! ## Design
//!
//! - **Two fragments**: `original_syntax` is the fragment the node was built
//!   from and never changes. `syntax` is the current fragment, replaced only
//!   by explicit edits such as [`Dom::set_expression_text`].
//! - **Tagged variants**: shape data specific to a variant (an accessor's
//!   keyword, a parameter's ordinal) lives in its `NodeKind` case. Which
//!   facets and slots a variant has is a static property of its
//!   [`NodeKindTag`], see [`crate::facet`].
//! - **Open set**: callers add variants through [`NodeKind::Extension`],
//!   which carries a boxed [`ExtensionNode`].
//!
//! [`Dom::set_expression_text`]: crate::Dom::set_expression_text

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sharpdom_core::annotation::AnnotationList;
use sharpdom_core::error::ResolveError;
use sharpdom_core::types::{AccessModifier, Symbol};
use sharpdom_syntax::{SyntaxKind, SyntaxNode};

use crate::container::Container;
use crate::facet::Slot;

// ============================================================================
// Identity
// ============================================================================

/// Index of a node in its [`Dom`](crate::Dom).
///
/// Ids are never reused while the model lives. An id is only meaningful for
/// the model that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Variant shape data
// ============================================================================

/// Passing mode of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterModifier {
    #[default]
    None,
    Ref,
    Out,
    In,
    Params,
    This,
}

impl ParameterModifier {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ParameterModifier::None => None,
            ParameterModifier::Ref => Some("ref"),
            ParameterModifier::Out => Some("out"),
            ParameterModifier::In => Some("in"),
            ParameterModifier::Params => Some("params"),
            ParameterModifier::This => Some("this"),
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "ref" => Some(ParameterModifier::Ref),
            "out" => Some(ParameterModifier::Out),
            "in" => Some(ParameterModifier::In),
            "params" => Some(ParameterModifier::Params),
            "this" => Some(ParameterModifier::This),
            _ => None,
        }
    }
}

/// Which accessor of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorKind {
    Get,
    Set,
    Init,
}

impl AccessorKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AccessorKind::Get => "get",
            AccessorKind::Set => "set",
            AccessorKind::Init => "init",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "get" => Some(AccessorKind::Get),
            "set" => Some(AccessorKind::Set),
            "init" => Some(AccessorKind::Init),
            _ => None,
        }
    }
}

/// How an attribute argument names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValueStyle {
    /// `Obsolete("text")`
    Positional,
    /// `Obsolete(Error = true)`, a named property.
    Equals,
    /// `Obsolete(error: true)`, a named parameter.
    Colon,
}

/// Variant of a node together with its variant-specific shape data.
#[derive(Debug)]
pub enum NodeKind {
    Root,
    Using,
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    EnumMember,
    Method {
        has_body: bool,
    },
    Property,
    Accessor {
        keyword: AccessorKind,
        has_body: bool,
    },
    Field,
    Parameter {
        modifier: ParameterModifier,
        ordinal: usize,
    },
    TypeParameter,
    Attribute,
    AttributeValue {
        style: AttributeValueStyle,
    },
    TypeReference,
    Block,
    If {
        /// The `if` body was written with braces.
        braced: bool,
        /// `None` without an `else` clause, otherwise whether it had braces.
        else_braced: Option<bool>,
    },
    ElseIf {
        braced: bool,
    },
    LocalDeclaration,
    Assignment {
        operator: String,
    },
    Invocation,
    Return,
    For {
        braced: bool,
    },
    While {
        braced: bool,
    },
    Expression {
        syntax_kind: SyntaxKind,
        /// Normalized text, see [`sharpdom_syntax::normalized_text`].
        text: String,
    },
    Extension(Box<dyn ExtensionNode>),
}

/// Field-less discriminant of [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKindTag {
    Root,
    Using,
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    EnumMember,
    Method,
    Property,
    Accessor,
    Field,
    Parameter,
    TypeParameter,
    Attribute,
    AttributeValue,
    TypeReference,
    Block,
    If,
    ElseIf,
    LocalDeclaration,
    Assignment,
    Invocation,
    Return,
    For,
    While,
    Expression,
    Extension,
}

impl NodeKindTag {
    pub fn name(self) -> &'static str {
        match self {
            NodeKindTag::Root => "Root",
            NodeKindTag::Using => "Using",
            NodeKindTag::Namespace => "Namespace",
            NodeKindTag::Class => "Class",
            NodeKindTag::Struct => "Struct",
            NodeKindTag::Interface => "Interface",
            NodeKindTag::Enum => "Enum",
            NodeKindTag::EnumMember => "EnumMember",
            NodeKindTag::Method => "Method",
            NodeKindTag::Property => "Property",
            NodeKindTag::Accessor => "Accessor",
            NodeKindTag::Field => "Field",
            NodeKindTag::Parameter => "Parameter",
            NodeKindTag::TypeParameter => "TypeParameter",
            NodeKindTag::Attribute => "Attribute",
            NodeKindTag::AttributeValue => "AttributeValue",
            NodeKindTag::TypeReference => "TypeReference",
            NodeKindTag::Block => "Block",
            NodeKindTag::If => "If",
            NodeKindTag::ElseIf => "ElseIf",
            NodeKindTag::LocalDeclaration => "LocalDeclaration",
            NodeKindTag::Assignment => "Assignment",
            NodeKindTag::Invocation => "Invocation",
            NodeKindTag::Return => "Return",
            NodeKindTag::For => "For",
            NodeKindTag::While => "While",
            NodeKindTag::Expression => "Expression",
            NodeKindTag::Extension => "Extension",
        }
    }

    /// Class, struct, interface or enum.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeKindTag::Class | NodeKindTag::Struct | NodeKindTag::Interface | NodeKindTag::Enum
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKindTag::Block
                | NodeKindTag::If
                | NodeKindTag::LocalDeclaration
                | NodeKindTag::Assignment
                | NodeKindTag::Invocation
                | NodeKindTag::Return
                | NodeKindTag::For
                | NodeKindTag::While
        )
    }

    /// Variants whose fragment declares a symbol.
    pub fn is_declaration(self) -> bool {
        self.is_type()
            || matches!(
                self,
                NodeKindTag::Namespace
                    | NodeKindTag::EnumMember
                    | NodeKindTag::Method
                    | NodeKindTag::Property
                    | NodeKindTag::Accessor
                    | NodeKindTag::Field
                    | NodeKindTag::Parameter
                    | NodeKindTag::TypeParameter
                    | NodeKindTag::LocalDeclaration
            )
    }
}

impl fmt::Display for NodeKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl NodeKind {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::Root => NodeKindTag::Root,
            NodeKind::Using => NodeKindTag::Using,
            NodeKind::Namespace => NodeKindTag::Namespace,
            NodeKind::Class => NodeKindTag::Class,
            NodeKind::Struct => NodeKindTag::Struct,
            NodeKind::Interface => NodeKindTag::Interface,
            NodeKind::Enum => NodeKindTag::Enum,
            NodeKind::EnumMember => NodeKindTag::EnumMember,
            NodeKind::Method { .. } => NodeKindTag::Method,
            NodeKind::Property => NodeKindTag::Property,
            NodeKind::Accessor { .. } => NodeKindTag::Accessor,
            NodeKind::Field => NodeKindTag::Field,
            NodeKind::Parameter { .. } => NodeKindTag::Parameter,
            NodeKind::TypeParameter => NodeKindTag::TypeParameter,
            NodeKind::Attribute => NodeKindTag::Attribute,
            NodeKind::AttributeValue { .. } => NodeKindTag::AttributeValue,
            NodeKind::TypeReference => NodeKindTag::TypeReference,
            NodeKind::Block => NodeKindTag::Block,
            NodeKind::If { .. } => NodeKindTag::If,
            NodeKind::ElseIf { .. } => NodeKindTag::ElseIf,
            NodeKind::LocalDeclaration => NodeKindTag::LocalDeclaration,
            NodeKind::Assignment { .. } => NodeKindTag::Assignment,
            NodeKind::Invocation => NodeKindTag::Invocation,
            NodeKind::Return => NodeKindTag::Return,
            NodeKind::For { .. } => NodeKindTag::For,
            NodeKind::While { .. } => NodeKindTag::While,
            NodeKind::Expression { .. } => NodeKindTag::Expression,
            NodeKind::Extension(_) => NodeKindTag::Extension,
        }
    }

    /// Tag name, or the extension's own kind name.
    pub fn kind_name(&self) -> &str {
        match self {
            NodeKind::Extension(ext) => ext.kind_name(),
            other => other.tag().name(),
        }
    }

    pub fn slots(&self) -> &'static [Slot] {
        match self {
            NodeKind::Extension(ext) => ext.slots(),
            other => other.tag().slots(),
        }
    }

    pub fn as_extension(&self) -> Option<&dyn ExtensionNode> {
        match self {
            NodeKind::Extension(ext) => Some(ext.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Extension nodes
// ============================================================================

/// A node variant supplied by a caller-registered factory.
///
/// `duplicate` is the variant's copy operation. Returning `None` declines
/// copying, and [`Dom::copy`](crate::Dom::copy) then fails with
/// `MissingCloneSupport`.
pub trait ExtensionNode: fmt::Debug + Send + Sync {
    fn kind_name(&self) -> &str;

    fn duplicate(&self) -> Option<Box<dyn ExtensionNode>>;

    /// Shape equality for the equivalence check. `other` always has the
    /// same `kind_name`.
    fn same_shape(&self, other: &dyn ExtensionNode) -> bool;

    /// Child containers of this variant. Any non-root node is accepted.
    fn slots(&self) -> &'static [Slot] {
        &[]
    }

    /// Variant-specific values for [`NodeRef::request_value`](crate::NodeRef::request_value).
    fn value(&self, _key: &str) -> Option<Value> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Facet data
// ============================================================================

/// `abstract`, `override`, `sealed` and `virtual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MemberFlags {
    pub is_abstract: bool,
    pub is_override: bool,
    pub is_sealed: bool,
    pub is_virtual: bool,
}

impl MemberFlags {
    /// Keywords in emission order.
    pub fn keywords(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.is_abstract {
            out.push("abstract");
        }
        if self.is_virtual {
            out.push("virtual");
        }
        if self.is_override {
            out.push("override");
        }
        if self.is_sealed {
            out.push("sealed");
        }
        out
    }
}

/// Modifier keywords split into the facets they feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Access written in source or set by an edit. Defaults implied by the
    /// declaration's context are not recorded here.
    pub access: Option<AccessModifier>,
    pub is_static: bool,
    pub flags: MemberFlags,
    /// Every other modifier (`readonly`, `const`, `partial`, ...) in source
    /// order.
    pub other: Vec<String>,
}

impl Modifiers {
    /// Sort modifier words into facets.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut modifiers = Modifiers::default();
        let mut access_words = Vec::new();
        for word in words {
            match word {
                w if AccessModifier::is_access_keyword(w) => access_words.push(w),
                "static" => modifiers.is_static = true,
                "abstract" => modifiers.flags.is_abstract = true,
                "override" => modifiers.flags.is_override = true,
                "sealed" => modifiers.flags.is_sealed = true,
                "virtual" => modifiers.flags.is_virtual = true,
                other => modifiers.other.push(other.to_string()),
            }
        }
        modifiers.access = AccessModifier::from_keywords(access_words);
        modifiers
    }

    /// Keywords in emission order: access, `static`, flags, the rest.
    pub fn keywords(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        if let Some(access) = self.access {
            out.extend(access.keywords().iter().copied());
        }
        if self.is_static {
            out.push("static");
        }
        out.extend(self.flags.keywords());
        out.extend(self.other.iter().map(String::as_str));
        out
    }

    /// The non-facet modifiers, order-insensitive.
    pub(crate) fn sorted_other(&self) -> Vec<&str> {
        let mut other: Vec<&str> = self.other.iter().map(String::as_str).collect();
        other.sort_unstable();
        other
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Result of the resolve pass for one node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Not resolved yet.
    #[default]
    Pending,
    /// The variant has nothing to resolve.
    NotApplicable,
    Declared(Symbol),
    /// Static type of an expression.
    Typed(String),
    /// Resolution failed; the node is degraded.
    Failed(ResolveError),
}

impl Resolution {
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Resolution::Declared(symbol) => Some(symbol),
            _ => None,
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// Result of a generic property lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i64),
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ============================================================================
// Node
// ============================================================================

/// Owner and slot of an attached node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub owner: NodeId,
    pub slot: Slot,
}

/// Namespaces and types enclosing a detached node, captured when it was
/// copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Placement {
    pub namespaces: Vec<String>,
    pub types: Vec<String>,
}

#[derive(Debug)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) original_syntax: Arc<SyntaxNode>,
    pub(crate) syntax: Arc<SyntaxNode>,
    pub(crate) annotations: AnnotationList,
    pub(crate) modifiers: Modifiers,
    /// Name as read from syntax by the factory.
    pub(crate) declared_name: String,
    pub(crate) name_override: Option<String>,
    pub(crate) resolution: Resolution,
    pub(crate) parent: Option<ParentLink>,
    /// Moved by a container edit since it was built or copied; placement is
    /// then derived from the tree instead of the symbol.
    pub(crate) relocated: bool,
    pub(crate) anchor: Option<Placement>,
    pub(crate) containers: Vec<Container>,
}

impl Node {
    /// A detached, unresolved node backed by `syntax`, with one empty
    /// container per slot of `kind`.
    pub fn new(kind: NodeKind, syntax: &Arc<SyntaxNode>) -> Self {
        let containers = kind.slots().iter().map(|slot| Container::new(*slot)).collect();
        Node {
            kind,
            original_syntax: syntax.clone(),
            syntax: syntax.clone(),
            annotations: AnnotationList::new(),
            modifiers: Modifiers::default(),
            declared_name: String::new(),
            name_override: None,
            resolution: Resolution::Pending,
            parent: None,
            relocated: false,
            anchor: None,
            containers,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.declared_name = name.into();
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotations(mut self, annotations: AnnotationList) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub(crate) fn container(&self, slot: Slot) -> Option<&Container> {
        self.containers.iter().find(|c| c.slot() == slot)
    }

    pub(crate) fn container_mut(&mut self, slot: Slot) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.slot() == slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod modifiers {
        use super::*;

        #[test]
        fn words_feed_facets() {
            let m = Modifiers::from_words(["public", "static", "readonly", "override"]);
            assert_eq!(m.access, Some(AccessModifier::Public));
            assert!(m.is_static);
            assert!(m.flags.is_override);
            assert_eq!(m.other, vec!["readonly".to_string()]);
        }

        #[test]
        fn keywords_put_access_first() {
            let m = Modifiers::from_words(["new", "static", "protected", "internal", "virtual"]);
            assert_eq!(
                m.keywords(),
                vec!["protected", "internal", "static", "virtual", "new"]
            );
        }

        #[test]
        fn sorted_other_ignores_order() {
            let a = Modifiers::from_words(["readonly", "new"]);
            let b = Modifiers::from_words(["new", "readonly"]);
            assert_eq!(a.sorted_other(), b.sorted_other());
        }
    }

    mod tags {
        use super::*;

        #[test]
        fn kind_reports_its_tag() {
            let kind = NodeKind::Parameter {
                modifier: ParameterModifier::Ref,
                ordinal: 2,
            };
            assert_eq!(kind.tag(), NodeKindTag::Parameter);
            assert_eq!(kind.kind_name(), "Parameter");
            assert!(NodeKindTag::Parameter.is_declaration());
            assert!(!NodeKindTag::Expression.is_declaration());
        }

        #[test]
        fn keyword_round_trips() {
            for word in ["ref", "out", "in", "params", "this"] {
                let modifier = ParameterModifier::from_keyword(word).unwrap();
                assert_eq!(modifier.keyword(), Some(word));
            }
            assert_eq!(AccessorKind::from_keyword("init"), Some(AccessorKind::Init));
            assert_eq!(AccessorKind::from_keyword("add"), None);
        }
    }
}
