//! Shared types used by the syntax and model layers.
//!
//! - [`Span`]: byte range into a source text
//! - [`AccessModifier`]: declared accessibility
//! - [`Symbol`]: what the semantic service knows about a declaration

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Spans
// ============================================================================

/// Half-open byte range `[start, end)` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

// ============================================================================
// Access Modifiers
// ============================================================================

/// Declared accessibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessModifier {
    Private,
    /// `private protected`
    PrivateProtected,
    Protected,
    Internal,
    /// `protected internal`
    ProtectedInternal,
    Public,
}

impl AccessModifier {
    /// The keywords that spell this modifier in source, in canonical order.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            AccessModifier::Private => &["private"],
            AccessModifier::PrivateProtected => &["private", "protected"],
            AccessModifier::Protected => &["protected"],
            AccessModifier::Internal => &["internal"],
            AccessModifier::ProtectedInternal => &["protected", "internal"],
            AccessModifier::Public => &["public"],
        }
    }

    /// Interpret the accessibility keywords found in a modifier list.
    ///
    /// Keyword order is irrelevant (`internal protected` is accepted).
    /// Returns `None` when no accessibility keyword is present or the
    /// combination is not a legal one.
    pub fn from_keywords<'a>(words: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut public = false;
        let mut private = false;
        let mut protected = false;
        let mut internal = false;
        for word in words {
            match word {
                "public" => public = true,
                "private" => private = true,
                "protected" => protected = true,
                "internal" => internal = true,
                _ => {}
            }
        }
        match (public, private, protected, internal) {
            (true, false, false, false) => Some(AccessModifier::Public),
            (false, true, false, false) => Some(AccessModifier::Private),
            (false, false, true, false) => Some(AccessModifier::Protected),
            (false, false, false, true) => Some(AccessModifier::Internal),
            (false, true, true, false) => Some(AccessModifier::PrivateProtected),
            (false, false, true, true) => Some(AccessModifier::ProtectedInternal),
            _ => None,
        }
    }

    /// Whether `word` is one of the accessibility keywords.
    pub fn is_access_keyword(word: &str) -> bool {
        matches!(word, "public" | "private" | "protected" | "internal")
    }
}

impl fmt::Display for AccessModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keywords().join(" "))
    }
}

// ============================================================================
// Symbols
// ============================================================================

/// Kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Namespace,
    Type,
    Method,
    Property,
    Accessor,
    Field,
    EnumMember,
    Parameter,
    TypeParameter,
    Local,
}

/// Resolved information about a declaration.
///
/// Containing chains are outermost first: a class `C` nested in `B` inside
/// namespace `N.M` has `containing_types == ["B"]` and
/// `containing_namespaces == ["N", "M"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub containing_types: Vec<String>,
    pub containing_namespaces: Vec<String>,
    pub accessibility: Option<AccessModifier>,
}

impl Symbol {
    /// Dotted containing namespace, empty for the global namespace.
    pub fn namespace(&self) -> String {
        self.containing_namespaces.join(".")
    }

    /// Name qualified by containing types only.
    pub fn outer_name(&self) -> String {
        join_dotted(self.containing_types.iter().map(String::as_str), &self.name)
    }

    /// Name qualified by containing namespaces and types.
    pub fn qualified_name(&self) -> String {
        join_dotted(
            self.containing_namespaces
                .iter()
                .chain(self.containing_types.iter())
                .map(String::as_str),
            &self.name,
        )
    }
}

/// Join `prefix` segments and `last` with dots, skipping empty segments.
pub fn join_dotted<'a>(prefix: impl IntoIterator<Item = &'a str>, last: &'a str) -> String {
    let mut out = String::new();
    for segment in prefix.into_iter().chain(std::iter::once(last)) {
        if segment.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}
