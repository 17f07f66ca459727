//! Slots and facets: what each node variant can hold and carry.
//!
//! Both are static properties of a [`NodeKindTag`]. Callers query them
//! through `Option`-returning accessors on [`NodeRef`](crate::NodeRef)
//! instead of probing a node's concrete type.
//!
//! ## Slots
//!
//! | Variant | Slots |
//! |---------|-------|
//! | Root, Namespace | Usings, Members |
//! | Class, Struct, Interface | Attributes, TypeParameters, BaseTypes, Members |
//! | Enum | Attributes, BaseTypes, Members |
//! | Method | Attributes, Type, TypeParameters, Parameters, Statements |
//! | Property | Attributes, Type, Accessors, Initializer |
//! | Field, Parameter | Attributes, Type, Initializer |
//! | If | Condition, Statements, ElseIfs, ElseStatements |
//! | For | Variable, Condition, Incrementor, Statements |
//!
//! The remaining variants are listed in [`NodeKindTag::slots`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeKindTag;

// ============================================================================
// Slots
// ============================================================================

/// How many members a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// At most one member (a return type, a condition).
    One,
    /// An ordered list.
    Many,
}

/// A named child container of a node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Usings,
    Members,
    Attributes,
    TypeParameters,
    BaseTypes,
    Parameters,
    Type,
    Accessors,
    Initializer,
    AttributeValues,
    Value,
    Statements,
    Condition,
    ElseIfs,
    ElseStatements,
    Variable,
    Incrementor,
}

impl Slot {
    pub const ALL: &'static [Slot] = &[
        Slot::Usings,
        Slot::Members,
        Slot::Attributes,
        Slot::TypeParameters,
        Slot::BaseTypes,
        Slot::Parameters,
        Slot::Type,
        Slot::Accessors,
        Slot::Initializer,
        Slot::AttributeValues,
        Slot::Value,
        Slot::Statements,
        Slot::Condition,
        Slot::ElseIfs,
        Slot::ElseStatements,
        Slot::Variable,
        Slot::Incrementor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Slot::Usings => "usings",
            Slot::Members => "members",
            Slot::Attributes => "attributes",
            Slot::TypeParameters => "type_parameters",
            Slot::BaseTypes => "base_types",
            Slot::Parameters => "parameters",
            Slot::Type => "type",
            Slot::Accessors => "accessors",
            Slot::Initializer => "initializer",
            Slot::AttributeValues => "attribute_values",
            Slot::Value => "value",
            Slot::Statements => "statements",
            Slot::Condition => "condition",
            Slot::ElseIfs => "else_ifs",
            Slot::ElseStatements => "else_statements",
            Slot::Variable => "variable",
            Slot::Incrementor => "incrementor",
        }
    }

    /// Look a slot up by name, ignoring case and underscores.
    pub fn from_name(name: &str) -> Option<Slot> {
        let wanted = normalize_key(name);
        Slot::ALL
            .iter()
            .copied()
            .find(|slot| normalize_key(slot.name()) == wanted)
    }

    pub fn arity(self) -> Arity {
        match self {
            Slot::Type
            | Slot::Initializer
            | Slot::Value
            | Slot::Condition
            | Slot::Variable
            | Slot::Incrementor => Arity::One,
            _ => Arity::Many,
        }
    }

    /// Slots holding statements.
    pub fn holds_statements(self) -> bool {
        matches!(self, Slot::Statements | Slot::ElseStatements)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase with underscores removed: `QualifiedName` and `qualified_name`
/// are the same key.
pub(crate) fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// Facets
// ============================================================================

/// Optional capability data a variant may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// Containing namespace and qualified name.
    NamespacePlacement,
    AccessModifier,
    Static,
    /// The attribute set, compared unordered by name.
    Attributes,
    /// The declared type (the `Type` slot).
    ReturnType,
    /// `abstract`, `override`, `sealed`, `virtual`.
    MemberFlags,
}

impl Facet {
    pub fn name(self) -> &'static str {
        match self {
            Facet::NamespacePlacement => "namespace_placement",
            Facet::AccessModifier => "access_modifier",
            Facet::Static => "static",
            Facet::Attributes => "attributes",
            Facet::ReturnType => "return_type",
            Facet::MemberFlags => "member_flags",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Per-variant tables
// ============================================================================

const NAMESPACE_SLOTS: &[Slot] = &[Slot::Usings, Slot::Members];
const TYPE_SLOTS: &[Slot] = &[
    Slot::Attributes,
    Slot::TypeParameters,
    Slot::BaseTypes,
    Slot::Members,
];
const ENUM_SLOTS: &[Slot] = &[Slot::Attributes, Slot::BaseTypes, Slot::Members];
const METHOD_SLOTS: &[Slot] = &[
    Slot::Attributes,
    Slot::Type,
    Slot::TypeParameters,
    Slot::Parameters,
    Slot::Statements,
];
const PROPERTY_SLOTS: &[Slot] = &[
    Slot::Attributes,
    Slot::Type,
    Slot::Accessors,
    Slot::Initializer,
];
const VARIABLE_SLOTS: &[Slot] = &[Slot::Attributes, Slot::Type, Slot::Initializer];
const IF_SLOTS: &[Slot] = &[
    Slot::Condition,
    Slot::Statements,
    Slot::ElseIfs,
    Slot::ElseStatements,
];
const FOR_SLOTS: &[Slot] = &[
    Slot::Variable,
    Slot::Condition,
    Slot::Incrementor,
    Slot::Statements,
];

const CLASS_FACETS: &[Facet] = &[
    Facet::NamespacePlacement,
    Facet::AccessModifier,
    Facet::Static,
    Facet::Attributes,
    Facet::MemberFlags,
];
const TYPE_FACETS: &[Facet] = &[
    Facet::NamespacePlacement,
    Facet::AccessModifier,
    Facet::Attributes,
];
const MEMBER_FACETS: &[Facet] = &[
    Facet::AccessModifier,
    Facet::Static,
    Facet::Attributes,
    Facet::ReturnType,
    Facet::MemberFlags,
];
const FIELD_FACETS: &[Facet] = &[
    Facet::AccessModifier,
    Facet::Static,
    Facet::Attributes,
    Facet::ReturnType,
];

impl NodeKindTag {
    /// Child containers of the variant, in regeneration order.
    ///
    /// Extension variants report their slots through
    /// [`ExtensionNode::slots`](crate::ExtensionNode::slots); the tag itself
    /// has none.
    pub fn slots(self) -> &'static [Slot] {
        match self {
            NodeKindTag::Root | NodeKindTag::Namespace => NAMESPACE_SLOTS,
            NodeKindTag::Class | NodeKindTag::Struct | NodeKindTag::Interface => TYPE_SLOTS,
            NodeKindTag::Enum => ENUM_SLOTS,
            NodeKindTag::EnumMember => &[Slot::Attributes, Slot::Value],
            NodeKindTag::Method => METHOD_SLOTS,
            NodeKindTag::Property => PROPERTY_SLOTS,
            NodeKindTag::Accessor => &[Slot::Attributes, Slot::Statements],
            NodeKindTag::Field | NodeKindTag::Parameter => VARIABLE_SLOTS,
            NodeKindTag::Attribute => &[Slot::AttributeValues],
            NodeKindTag::AttributeValue => &[Slot::Value],
            NodeKindTag::Block => &[Slot::Statements],
            NodeKindTag::If => IF_SLOTS,
            NodeKindTag::ElseIf => &[Slot::Condition, Slot::Statements],
            NodeKindTag::LocalDeclaration => &[Slot::Type, Slot::Initializer],
            NodeKindTag::Assignment => &[Slot::Variable, Slot::Value],
            NodeKindTag::Invocation | NodeKindTag::Return => &[Slot::Value],
            NodeKindTag::For => FOR_SLOTS,
            NodeKindTag::While => &[Slot::Condition, Slot::Statements],
            NodeKindTag::Using
            | NodeKindTag::TypeParameter
            | NodeKindTag::TypeReference
            | NodeKindTag::Expression
            | NodeKindTag::Extension => &[],
        }
    }

    pub fn has_slot(self, slot: Slot) -> bool {
        self.slots().contains(&slot)
    }

    pub fn facets(self) -> &'static [Facet] {
        match self {
            NodeKindTag::Namespace => &[Facet::NamespacePlacement],
            NodeKindTag::Class => CLASS_FACETS,
            NodeKindTag::Struct | NodeKindTag::Interface | NodeKindTag::Enum => TYPE_FACETS,
            NodeKindTag::Method | NodeKindTag::Property => MEMBER_FACETS,
            NodeKindTag::Field => FIELD_FACETS,
            NodeKindTag::Accessor => &[Facet::AccessModifier, Facet::Attributes],
            NodeKindTag::EnumMember => &[Facet::Attributes],
            NodeKindTag::Parameter => &[Facet::Attributes, Facet::ReturnType],
            NodeKindTag::LocalDeclaration => &[Facet::ReturnType],
            _ => &[],
        }
    }

    pub fn has_facet(self, facet: Facet) -> bool {
        self.facets().contains(&facet)
    }

    /// Whether `slot` of an owner of this variant may hold a `member`.
    ///
    /// Extension owners accept any non-root member in their slots.
    pub fn accepts(self, slot: Slot, member: NodeKindTag) -> bool {
        use NodeKindTag as T;

        if member == T::Root {
            return false;
        }
        if self == T::Extension {
            return true;
        }
        if !self.has_slot(slot) {
            return false;
        }
        match slot {
            Slot::Usings => member == T::Using,
            Slot::Members => match self {
                T::Root | T::Namespace => {
                    member == T::Namespace || member.is_type() || member == T::Extension
                }
                T::Enum => member == T::EnumMember,
                _ => {
                    member.is_type()
                        || matches!(member, T::Method | T::Property | T::Field | T::Extension)
                }
            },
            Slot::Attributes => member == T::Attribute,
            Slot::TypeParameters => member == T::TypeParameter,
            Slot::BaseTypes | Slot::Type => member == T::TypeReference,
            Slot::Parameters => member == T::Parameter,
            Slot::Accessors => member == T::Accessor,
            Slot::AttributeValues => member == T::AttributeValue,
            Slot::Statements | Slot::ElseStatements => {
                member.is_statement() || member == T::Extension
            }
            Slot::ElseIfs => member == T::ElseIf,
            Slot::Variable if self == T::For => member == T::LocalDeclaration,
            Slot::Initializer
            | Slot::Value
            | Slot::Condition
            | Slot::Variable
            | Slot::Incrementor => member == T::Expression,
        }
    }
}
