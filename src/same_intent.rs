//! Structural equivalence ("same intent") between model subtrees.
//!
//! Two nodes have the same intent when they mean the same thing regardless
//! of formatting, comments, sibling order, and (unless asked for)
//! annotations. The comparison runs in a fixed order and stops at the first
//! difference:
//!
//! 1. variant (a mismatch is simply `false`)
//! 2. annotations, only when `include_annotations` is set
//! 3. name
//! 4. variant shape data and the non-facet modifiers
//! 5. each facet the variant carries
//! 6. each child slot the facets did not already cover
//!
//! ## Matching child lists
//!
//! Lists are equal when they have the same length and every left item
//! matches a distinct right item with an equal key for which the comparison
//! recurses to `true`. Matching is greedy: each left item takes the first
//! unmatched right candidate that passes. With several same-key siblings
//! that differ elsewhere, an early match can claim the partner a later item
//! needed, producing a false negative. This is the documented policy.
//!
//! Members and statements are keyed by variant and name; other lists by
//! name. Below a root or namespace, nesting is irrelevant: namespaces are
//! compared as the flattened list of non-empty namespaces keyed by
//! qualified name, so `namespace A.B { }` matches `namespace A { namespace
//! B { } }`.
//!
//! The comparison never fails and never mutates.

use crate::facet::{Arity, Facet, Slot};
use crate::node::{AttributeValueStyle, NodeKind, NodeKindTag};
use crate::view::NodeRef;

/// Whether `left` and `right` have the same intent.
///
/// ```
/// use sharpdom::build;
///
/// let a = build("public class Foo {}").unwrap();
/// let b = build("public  class   Foo { }").unwrap();
/// let c = build("internal class Foo {}").unwrap();
/// assert!(a.same_intent(&b, false));
/// assert!(!a.same_intent(&c, false));
/// ```
pub fn same_intent(left: NodeRef<'_>, right: NodeRef<'_>, include_annotations: bool) -> bool {
    if left.tag() != right.tag() || left.kind_name() != right.kind_name() {
        return false;
    }
    if include_annotations && !left.annotations().same_intent(right.annotations()) {
        return false;
    }
    if !same_name(left, right) {
        return false;
    }
    if !same_shape(left, right) {
        return false;
    }
    let tag = left.tag();
    if !tag
        .facets()
        .iter()
        .all(|facet| same_facet(*facet, left, right, include_annotations))
    {
        return false;
    }
    match tag {
        NodeKindTag::Root | NodeKindTag::Namespace => {
            same_namespace_body(left, right, include_annotations)
        }
        _ => same_slots(left, right, include_annotations),
    }
}

/// Both absent, or both present with the same intent.
pub fn same_intent_opt(
    left: Option<NodeRef<'_>>,
    right: Option<NodeRef<'_>>,
    include_annotations: bool,
) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(l), Some(r)) => same_intent(l, r, include_annotations),
        _ => false,
    }
}

/// Greedy, order-insensitive list comparison with a caller-chosen key.
///
/// Each left node takes the first untaken right node with an equal key that
/// also has the same intent. Matching is not optimal: when several siblings
/// share a key, an early pairing can leave a later node without a partner
/// that an exhaustive assignment would have found.
///
/// ```
/// use sharpdom::{build, same_intent_list_by};
///
/// let a = build("class A { int x; int y; }").unwrap();
/// let b = build("class A { int y; int x; }").unwrap();
/// let left = a.root().classes()[0].fields();
/// let right = b.root().classes()[0].fields();
/// assert!(same_intent_list_by(&left, &right, |n| n.name(), false));
/// ```
pub fn same_intent_list_by<K: PartialEq>(
    left: &[NodeRef<'_>],
    right: &[NodeRef<'_>],
    key: impl Fn(NodeRef<'_>) -> K,
    include_annotations: bool,
) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let right_keys: Vec<K> = right.iter().map(|r| key(*r)).collect();
    let mut taken = vec![false; right.len()];
    for l in left {
        let l_key = key(*l);
        let found = (0..right.len()).find(|i| {
            !taken[*i] && right_keys[*i] == l_key && same_intent(*l, right[*i], include_annotations)
        });
        match found {
            Some(i) => taken[i] = true,
            None => return false,
        }
    }
    true
}

// ============================================================================
// Steps
// ============================================================================

fn same_name(left: NodeRef<'_>, right: NodeRef<'_>) -> bool {
    if left.tag() == NodeKindTag::Namespace {
        return left.qualified_name() == right.qualified_name();
    }
    left.name() == right.name()
}

/// Variant shape data plus modifiers that no facet covers. Brace style is
/// layout and is ignored.
fn same_shape(left: NodeRef<'_>, right: NodeRef<'_>) -> bool {
    if left.modifiers().sorted_other() != right.modifiers().sorted_other() {
        return false;
    }
    match (left.kind(), right.kind()) {
        (NodeKind::Method { has_body: a }, NodeKind::Method { has_body: b }) => a == b,
        (
            NodeKind::Accessor {
                keyword: ka,
                has_body: ba,
            },
            NodeKind::Accessor {
                keyword: kb,
                has_body: bb,
            },
        ) => ka == kb && ba == bb,
        (
            NodeKind::Parameter {
                modifier: ma,
                ordinal: oa,
            },
            NodeKind::Parameter {
                modifier: mb,
                ordinal: ob,
            },
        ) => ma == mb && oa == ob,
        (NodeKind::AttributeValue { style: a }, NodeKind::AttributeValue { style: b }) => a == b,
        (NodeKind::If { else_braced: a, .. }, NodeKind::If { else_braced: b, .. }) => {
            a.is_some() == b.is_some()
        }
        (NodeKind::Assignment { operator: a }, NodeKind::Assignment { operator: b }) => a == b,
        (NodeKind::Expression { text: a, .. }, NodeKind::Expression { text: b, .. }) => a == b,
        (NodeKind::Extension(a), NodeKind::Extension(b)) => a.same_shape(b.as_ref()),
        _ => true,
    }
}

fn same_facet(facet: Facet, left: NodeRef<'_>, right: NodeRef<'_>, include_annotations: bool) -> bool {
    match facet {
        Facet::NamespacePlacement => {
            left.namespace() == right.namespace() && left.qualified_name() == right.qualified_name()
        }
        Facet::AccessModifier => left.access_modifier() == right.access_modifier(),
        Facet::Static => left.is_static() == right.is_static(),
        Facet::MemberFlags => left.member_flags() == right.member_flags(),
        Facet::Attributes => same_intent_list_by(
            &left.children(Slot::Attributes),
            &right.children(Slot::Attributes),
            |n| n.name(),
            include_annotations,
        ),
        Facet::ReturnType => same_intent_opt(
            left.child(Slot::Type),
            right.child(Slot::Type),
            include_annotations,
        ),
    }
}

/// The slot a facet already compared.
fn covered_by_facet(tag: NodeKindTag, slot: Slot) -> bool {
    match slot {
        Slot::Attributes => tag.has_facet(Facet::Attributes),
        Slot::Type => tag.has_facet(Facet::ReturnType),
        _ => false,
    }
}

fn same_slots(left: NodeRef<'_>, right: NodeRef<'_>, include_annotations: bool) -> bool {
    let tag = left.tag();
    left.slots()
        .iter()
        .filter(|slot| !covered_by_facet(tag, **slot))
        .all(|slot| match slot.arity() {
            Arity::One => same_intent_opt(
                left.child(*slot),
                right.child(*slot),
                include_annotations,
            ),
            Arity::Many => {
                let l = left.children(*slot);
                let r = right.children(*slot);
                if *slot == Slot::AttributeValues {
                    same_attribute_values(&l, &r, include_annotations)
                } else if matches!(slot, Slot::Members | Slot::Statements | Slot::ElseStatements) {
                    same_intent_list_by(&l, &r, kind_and_name, include_annotations)
                } else {
                    same_intent_list_by(&l, &r, |n| n.name(), include_annotations)
                }
            }
        })
}

/// Positional values pair up in order; named ones in any order.
fn same_attribute_values(left: &[NodeRef<'_>], right: &[NodeRef<'_>], include_annotations: bool) -> bool {
    let positional = |n: &NodeRef<'_>| {
        matches!(
            n.kind(),
            NodeKind::AttributeValue {
                style: AttributeValueStyle::Positional
            }
        )
    };
    let (l_pos, l_named): (Vec<NodeRef<'_>>, Vec<NodeRef<'_>>) = left.iter().partition(|n| positional(*n));
    let (r_pos, r_named): (Vec<NodeRef<'_>>, Vec<NodeRef<'_>>) = right.iter().partition(|n| positional(*n));
    l_pos.len() == r_pos.len()
        && l_pos
            .iter()
            .zip(&r_pos)
            .all(|(l, r)| same_intent(*l, *r, include_annotations))
        && same_intent_list_by(&l_named, &r_named, |n| n.name(), include_annotations)
}

fn kind_and_name(node: NodeRef<'_>) -> (String, String) {
    (node.kind_name().to_string(), node.name())
}

/// Usings, the non-namespace members, and every non-empty namespace below,
/// flattened.
fn same_namespace_body(left: NodeRef<'_>, right: NodeRef<'_>, include_annotations: bool) -> bool {
    let usings = same_intent_list_by(
        &left.children(Slot::Usings),
        &right.children(Slot::Usings),
        |n| n.name(),
        include_annotations,
    );
    if !usings {
        return false;
    }
    fn direct(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
        node.members()
            .into_iter()
            .filter(|m| m.tag() != NodeKindTag::Namespace)
            .collect()
    }
    if !same_intent_list_by(&direct(left), &direct(right), kind_and_name, include_annotations) {
        return false;
    }
    same_intent_list_by(
        &left.non_empty_namespaces(),
        &right.non_empty_namespaces(),
        |n| n.qualified_name(),
        include_annotations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use sharpdom_core::annotation::PublicAnnotation;

    fn same(a: &str, b: &str) -> bool {
        let left = build(a).unwrap();
        let right = build(b).unwrap();
        let forward = left.same_intent(&right, false);
        assert_eq!(forward, right.same_intent(&left, false), "asymmetric: {} / {}", a, b);
        forward
    }

    mod scenarios {
        use super::*;

        #[test]
        fn formatting_is_ignored() {
            assert!(same("public class Foo {}", "public  class   Foo { }"));
            assert!(same(
                "class A { void M() { x = 1; } }",
                "class A\n{\n    void M()\n    {\n        x   =   1;\n    }\n}\n"
            ));
        }

        #[test]
        fn access_modifier_matters() {
            assert!(!same("public class Foo{}", "internal class Foo{}"));
            assert!(same("class Foo{}", "internal class Foo{}"));
        }

        #[test]
        fn member_order_is_ignored() {
            assert!(same(
                "class C { int A; void B() { } }",
                "class C { void B() { } int A; }"
            ));
        }

        #[test]
        fn namespace_nesting_is_ignored() {
            assert!(same(
                "namespace A { namespace B { class C { } } }",
                "namespace A.B { class C { } }"
            ));
            assert!(!same(
                "namespace A { class C { } }",
                "namespace B { class C { } }"
            ));
        }

        #[test]
        fn comments_are_ignored() {
            assert!(same("// lead\nclass A { /* x */ int y; }", "class A { int y; }"));
        }
    }

    mod differences {
        use super::*;

        #[test]
        fn names_types_and_flags() {
            assert!(!same("class A { int x; }", "class A { int y; }"));
            assert!(!same("class A { int x; }", "class A { long x; }"));
            assert!(!same("class A { void M(); }", "class A { void M() { } }"));
            assert!(!same("class A { static int x; }", "class A { int x; }"));
            assert!(!same("class A { readonly int x; }", "class A { int x; }"));
            assert!(!same("class A { int x = 1; }", "class A { int x = 2; }"));
        }

        #[test]
        fn cardinality() {
            assert!(!same("class A { int x; }", "class A { int x; int y; }"));
        }

        #[test]
        fn attributes_compare_unordered() {
            assert!(same("[A, B] class C { }", "[B] [A] class C { }"));
            assert!(!same("[A] class C { }", "[A(1)] class C { }"));
            assert!(!same("[A(1, 2)] class C { }", "[A(2, 1)] class C { }"));
            assert!(same("[A(1, X = 2, Y = 3)] class C { }", "[A(1, Y = 3, X = 2)] class C { }"));
        }

        #[test]
        fn parameters_compare_by_modifier_and_position() {
            assert!(!same("class A { void M(ref int a) { } }", "class A { void M(int a) { } }"));
            assert!(!same(
                "class A { void M(int a, int b) { } }",
                "class A { void M(int b, int a) { } }"
            ));
        }

        #[test]
        fn statements() {
            assert!(same(
                "class A { void M() { if (a) { b(); } } }",
                "class A { void M() { if (a) b(); } }"
            ));
            assert!(!same(
                "class A { void M() { if (a) b(); } }",
                "class A { void M() { if (a) b(); else c(); } }"
            ));
            assert!(!same(
                "class A { void M() { x += 1; } }",
                "class A { void M() { x -= 1; } }"
            ));
        }
    }

    mod annotations {
        use super::*;

        #[test]
        fn only_compared_on_request() {
            let left = build("//[[ Owner(\"Fred\") ]]\nclass A { }").unwrap();
            let right = build("class A { }").unwrap();
            assert!(left.same_intent(&right, false));
            assert!(!left.same_intent(&right, true));
        }

        #[test]
        fn edited_annotations_do_not_change_the_plain_result() {
            let left = build("class A { int x; }").unwrap();
            let mut right = build("class A { int x; }").unwrap();
            let x = right.root().classes()[0].fields()[0].id();
            right
                .annotations_mut(x)
                .unwrap()
                .add(PublicAnnotation::new("Tag"));
            assert!(left.same_intent(&right, false));
            assert!(!left.same_intent(&right, true));
        }
    }

    mod greedy {
        use super::*;

        #[test]
        fn custom_key_lists() {
            let a = build("class A { int x; int y; }").unwrap();
            let b = build("class B { long x; int y; }").unwrap();
            let left = a.root().classes()[0].fields();
            let right = b.root().classes()[0].fields();
            assert!(!same_intent_list_by(&left, &right, |n| n.name(), false));
            assert!(same_intent_list_by(&left[1..], &right[1..], |n| n.name(), false));
        }

        #[test]
        fn mismatched_variants_are_not_equal() {
            let dom = build("class A { int x; void M() { } }").unwrap();
            let class = dom.root().classes()[0];
            assert!(!same_intent(class.fields()[0], class.methods()[0], false));
            assert!(!same_intent_opt(Some(class), None, false));
            assert!(same_intent_opt(None, None, true));
        }

        #[test]
        fn every_node_matches_itself() {
            let dom = build(
                "namespace N { [Obsolete] public class C<T> : Base { \
                 public int P { get; private set; } \
                 void M(int a) { for (int i = 0; i < a; i++) { Run(i); } return; } } }",
            )
            .unwrap();
            for index in 0..dom.len() {
                let node = dom.node(crate::node::NodeId(index as u32));
                assert!(node.same_intent(node, true), "{:?}", node);
            }
        }
    }
}
