//! Containers and the edits that move nodes between them.
//!
//! ## Ownership
//!
//! A node belongs to at most one container. Every edit keeps the member's
//! parent link and the container lists in agreement:
//!
//! - [`Dom::add_or_move`] detaches the member from wherever it is before
//!   appending it, so a list never holds the same member twice.
//! - [`Dom::remove`] removes the member from the container that actually
//!   owns it, even when the caller names a different one.
//! - [`Dom::clear`] empties a list and detaches every removed member.

use tracing::debug;

use sharpdom_core::error::DomError;

use crate::dom::Dom;
use crate::facet::{Arity, Slot};
use crate::node::{NodeId, ParentLink};

/// Ordered members of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    slot: Slot,
    members: Vec<NodeId>,
}

impl Container {
    pub(crate) fn new(slot: Slot) -> Self {
        Container {
            slot,
            members: Vec::new(),
        }
    }

    pub(crate) fn with_members(slot: Slot, members: Vec<NodeId>) -> Self {
        Container { slot, members }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, member: NodeId) -> bool {
        self.members.contains(&member)
    }

    fn push(&mut self, member: NodeId) {
        self.members.push(member);
    }

    fn remove_member(&mut self, member: NodeId) -> bool {
        match self.members.iter().position(|m| *m == member) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Container edits
// ============================================================================

impl Dom {
    /// Append `member` to `owner`'s `slot`, detaching it from its current
    /// container first.
    ///
    /// # Errors
    ///
    /// - `NoSuchSlot` if the owner's variant has no such slot
    /// - `InvalidArguments` for a single-child slot (use [`Dom::set_child`])
    /// - `InvalidMember` if the slot does not accept the member's variant
    /// - `CyclicMove` if `member` is `owner` or one of its ancestors
    pub fn add_or_move(&mut self, owner: NodeId, slot: Slot, member: NodeId) -> Result<(), DomError> {
        self.check_slot(owner, slot)?;
        if slot.arity() == Arity::One {
            return Err(DomError::invalid_args(format!(
                "{} holds a single child; use set_child",
                slot
            )));
        }
        self.check_member(owner, slot, member)?;
        self.check_not_ancestor(owner, member)?;

        let previous = self.detach(member);
        self.attach(owner, slot, member);
        self.node_mut(member).relocated = true;
        debug!(
            member = %member,
            owner = %owner,
            slot = %slot,
            from = ?previous.map(|p| p.owner),
            "moved node"
        );
        Ok(())
    }

    /// Remove `member` from `owner`'s `slot`.
    ///
    /// When another container owns the member, it is removed from that one
    /// instead. Returns whether the member was removed from anywhere.
    pub fn remove(&mut self, owner: NodeId, slot: Slot, member: NodeId) -> Result<bool, DomError> {
        self.check_slot(owner, slot)?;
        self.check_id(member)?;
        let Some(link) = self.node_ref(member).parent else {
            return Ok(false);
        };
        if link.owner != owner || link.slot != slot {
            debug!(
                member = %member,
                owner = %link.owner,
                slot = %link.slot,
                "removing from actual owner"
            );
        }
        Ok(self.detach(member).is_some())
    }

    /// Empty `owner`'s `slot`, returning the removed members in order.
    ///
    /// Every removed member is detached.
    pub fn clear(&mut self, owner: NodeId, slot: Slot) -> Result<Vec<NodeId>, DomError> {
        self.check_slot(owner, slot)?;
        let removed = match self.node_mut(owner).container_mut(slot) {
            Some(container) => std::mem::take(&mut container.members),
            None => Vec::new(),
        };
        for member in &removed {
            self.node_mut(*member).parent = None;
        }
        Ok(removed)
    }

    /// Replace the child of a single-child slot, returning the previous one
    /// (now detached).
    pub fn set_child(
        &mut self,
        owner: NodeId,
        slot: Slot,
        member: Option<NodeId>,
    ) -> Result<Option<NodeId>, DomError> {
        self.check_slot(owner, slot)?;
        if slot.arity() == Arity::Many {
            return Err(DomError::invalid_args(format!(
                "{} holds a list; use add_or_move",
                slot
            )));
        }
        if let Some(member) = member {
            self.check_member(owner, slot, member)?;
            self.check_not_ancestor(owner, member)?;
        }
        let previous = self.clear(owner, slot)?.into_iter().next();
        if let Some(member) = member {
            self.detach(member);
            self.attach(owner, slot, member);
            self.node_mut(member).relocated = true;
        }
        Ok(previous)
    }

    /// Append a freshly built `member` during a build pass.
    ///
    /// The member must be detached. Unlike [`Dom::add_or_move`] this keeps
    /// the member's placement tied to its symbol.
    pub(crate) fn append_child(&mut self, owner: NodeId, slot: Slot, member: NodeId) -> Result<(), DomError> {
        self.check_slot(owner, slot)?;
        self.check_member(owner, slot, member)?;
        if self.node_ref(member).parent.is_some() {
            return Err(DomError::invalid_args(format!("{} is already attached", member)));
        }
        let occupied = self
            .node_ref(owner)
            .container(slot)
            .is_some_and(|c| !c.is_empty());
        if slot.arity() == Arity::One && occupied {
            return Err(DomError::invalid_args(format!(
                "{} of {} already holds a child",
                slot, owner
            )));
        }
        self.attach(owner, slot, member);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn attach(&mut self, owner: NodeId, slot: Slot, member: NodeId) {
        if let Some(container) = self.node_mut(owner).container_mut(slot) {
            container.push(member);
        }
        self.node_mut(member).parent = Some(ParentLink { owner, slot });
    }

    /// Remove `member` from its container, returning the old link.
    fn detach(&mut self, member: NodeId) -> Option<ParentLink> {
        let link = self.node_mut(member).parent.take()?;
        if let Some(container) = self.node_mut(link.owner).container_mut(link.slot) {
            container.remove_member(member);
        }
        Some(link)
    }

    fn check_slot(&self, owner: NodeId, slot: Slot) -> Result<(), DomError> {
        self.check_id(owner)?;
        let node = self.node_ref(owner);
        if node.container(slot).is_none() {
            return Err(DomError::NoSuchSlot {
                owner: node.kind().kind_name().to_string(),
                slot: slot.name().to_string(),
            });
        }
        Ok(())
    }

    fn check_member(&self, owner: NodeId, slot: Slot, member: NodeId) -> Result<(), DomError> {
        self.check_id(member)?;
        let owner_kind = self.node_ref(owner).kind();
        let member_kind = self.node_ref(member).kind();
        if !owner_kind.tag().accepts(slot, member_kind.tag()) {
            return Err(DomError::InvalidMember {
                owner: owner_kind.kind_name().to_string(),
                slot: slot.name().to_string(),
                member: member_kind.kind_name().to_string(),
            });
        }
        Ok(())
    }

    fn check_not_ancestor(&self, owner: NodeId, member: NodeId) -> Result<(), DomError> {
        let mut current = Some(owner);
        while let Some(id) = current {
            if id == member {
                return Err(DomError::CyclicMove {
                    member: self.node_ref(member).kind().kind_name().to_string(),
                });
            }
            current = self.node_ref(id).parent.map(|link| link.owner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;

    fn class_ids(dom: &Dom) -> Vec<NodeId> {
        dom.root().classes().iter().map(|c| c.id()).collect()
    }

    mod add_or_move {
        use super::*;

        #[test]
        fn reparents_between_types() {
            let mut dom = build("class A { int x; } class B { }").unwrap();
            let [a, b] = class_ids(&dom)[..] else {
                panic!("expected two classes")
            };
            let x = dom.node(a).fields()[0].id();

            dom.add_or_move(b, Slot::Members, x).unwrap();

            assert!(dom.node(a).fields().is_empty());
            assert_eq!(dom.node(b).fields()[0].id(), x);
            assert_eq!(dom.node(x).parent().map(|p| p.id()), Some(b));
        }

        #[test]
        fn moving_within_a_list_appends() {
            let mut dom = build("class A { int x; int y; }").unwrap();
            let a = class_ids(&dom)[0];
            let x = dom.node(a).fields()[0].id();

            dom.add_or_move(a, Slot::Members, x).unwrap();

            let names: Vec<String> = dom.node(a).fields().iter().map(|f| f.name()).collect();
            assert_eq!(names, vec!["y", "x"]);
        }

        #[test]
        fn rejects_wrong_member_kind() {
            let mut dom = build("namespace N { } class A { void M() { } }").unwrap();
            let ns = dom.root().namespaces()[0].id();
            let method = dom.root().classes()[0].methods()[0].id();
            let err = dom.add_or_move(ns, Slot::Members, method).unwrap_err();
            assert!(matches!(err, DomError::InvalidMember { .. }));
        }

        #[test]
        fn rejects_missing_slot() {
            let mut dom = build("class A { int x; } class B { }").unwrap();
            let a = class_ids(&dom)[0];
            let x = dom.node(a).fields()[0].id();
            let b = class_ids(&dom)[1];
            let err = dom.add_or_move(x, Slot::Members, b).unwrap_err();
            assert!(matches!(err, DomError::NoSuchSlot { .. }));
        }

        #[test]
        fn rejects_cycles() {
            let mut dom = build("class A { class B { } }").unwrap();
            let a = class_ids(&dom)[0];
            let b = dom.node(a).classes()[0].id();
            let err = dom.add_or_move(b, Slot::Members, a).unwrap_err();
            assert!(matches!(err, DomError::CyclicMove { .. }));
            let err = dom.add_or_move(a, Slot::Members, a).unwrap_err();
            assert!(matches!(err, DomError::CyclicMove { .. }));
        }

        #[test]
        fn single_child_slots_need_set_child() {
            let mut dom = build("class A { int x; int y; }").unwrap();
            let a = class_ids(&dom)[0];
            let fields = dom.node(a).fields();
            let x = fields[0].id();
            let ty = fields[1].child(Slot::Type).unwrap().id();
            let err = dom.add_or_move(x, Slot::Type, ty).unwrap_err();
            assert!(matches!(err, DomError::InvalidArguments { .. }));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn delegates_to_the_actual_owner() {
            let mut dom = build("class A { int x; } class B { }").unwrap();
            let [a, b] = class_ids(&dom)[..] else {
                panic!("expected two classes")
            };
            let x = dom.node(a).fields()[0].id();

            assert!(dom.remove(b, Slot::Members, x).unwrap());
            assert!(dom.node(a).fields().is_empty());
            assert!(dom.node(x).parent().is_none());
            assert!(!dom.remove(a, Slot::Members, x).unwrap());
        }
    }

    mod clear {
        use super::*;

        #[test]
        fn detaches_every_member() {
            let mut dom = build("class A { int x; int y; }").unwrap();
            let a = class_ids(&dom)[0];

            let removed = dom.clear(a, Slot::Members).unwrap();

            assert_eq!(removed.len(), 2);
            assert!(dom.node(a).fields().is_empty());
            for member in removed {
                assert!(dom.node(member).parent().is_none());
            }
        }

        #[test]
        fn cleared_members_can_be_added_elsewhere() {
            let mut dom = build("class A { int x; } class B { }").unwrap();
            let [a, b] = class_ids(&dom)[..] else {
                panic!("expected two classes")
            };
            let removed = dom.clear(a, Slot::Members).unwrap();
            dom.add_or_move(b, Slot::Members, removed[0]).unwrap();
            assert_eq!(dom.node(b).fields().len(), 1);
        }
    }

    mod set_child {
        use super::*;

        #[test]
        fn replaces_and_detaches_previous() {
            let mut dom = build("class A { int x; string y; }").unwrap();
            let a = class_ids(&dom)[0];
            let fields = dom.node(a).fields();
            let (x, y) = (fields[0].id(), fields[1].id());
            let old = dom.node(x).child(Slot::Type).unwrap().id();
            let string_ty = dom.node(y).child(Slot::Type).unwrap().id();

            let previous = dom.set_child(x, Slot::Type, Some(string_ty)).unwrap();

            assert_eq!(previous, Some(old));
            assert!(dom.node(old).parent().is_none());
            assert_eq!(dom.node(x).child(Slot::Type).map(|t| t.name()), Some("string".into()));
            assert!(dom.node(y).child(Slot::Type).is_none());
        }

        #[test]
        fn list_slots_are_rejected() {
            let mut dom = build("class A { }").unwrap();
            let a = class_ids(&dom)[0];
            assert!(dom.set_child(a, Slot::Members, None).is_err());
        }
    }
}
