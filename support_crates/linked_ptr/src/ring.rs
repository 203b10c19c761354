//! The ring bookkeeping shared by all [`LinkedPtr`](crate::LinkedPtr) handles.
//!
//! Every handle owns exactly one heap allocated [`RingLink`].
//! The links of all handles which currently share a value form a circular double-linked list, the *ring*:
//!
//! ```text
//!    ┌─────────────────────────────────────────────────────┐
//!    │   ┌──────────┐       ┌──────────┐       ┌──────────┐ │
//!    └──►│ handle a ├──────►│ handle b ├──────►│ handle c ├─┘
//!        └──────────┘ next  └──────────┘ next  └──────────┘
//! ```
//!
//! The `prev` links run the same ring in the opposite direction.
//!
//! A link whose `prev` (and therefore `next`) pointer points back at itself is *solitary*.
//! It is the only member of its ring which makes the owning handle the unique owner of its value.
//!
//! ## Aliasing Rules
//!
//! Links are only ever accessed through shared references and all mutation goes through the two `Cell`s.
//! Handles of different element types may be part of the same ring which is why a link does not know anything about
//! the value it tracks.

use alloc::boxed::Box;
use core::cell::Cell;
use core::ptr::{self, NonNull};

/// The two non-owning links of a single ring member.
pub(crate) struct RingLink {
    prev: Cell<NonNull<RingLink>>,
    next: Cell<NonNull<RingLink>>,
}

impl RingLink {
    /// Allocate a new link which is solitary, i.e. only linked to itself.
    pub(crate) fn alloc_solitary() -> NonNull<RingLink> {
        let link = NonNull::from(Box::leak(Box::new(RingLink {
            prev: Cell::new(NonNull::dangling()),
            next: Cell::new(NonNull::dangling()),
        })));

        let link_ref = unsafe { link.as_ref() };
        link_ref.prev.set(link);
        link_ref.next.set(link);
        link
    }

    /// Free a link that was previously returned by [`alloc_solitary()`](Self::alloc_solitary).
    ///
    /// # Safety
    /// - `link` must not have been freed already.
    /// - No references to the link may exist anymore.
    /// - The link must be solitary because otherwise its neighbours would be left with dangling pointers.
    pub(crate) unsafe fn free(link: NonNull<RingLink>) {
        debug_assert!(
            link.as_ref().is_solitary(),
            "ring link was freed while still being part of a ring"
        );
        drop(Box::from_raw(link.as_ptr()));
    }

    fn as_ptr(&self) -> NonNull<RingLink> {
        NonNull::from(self)
    }

    fn next_link(&self) -> &RingLink {
        // the ring invariant guarantees that neighbours are alive for as long as self is
        unsafe { self.next.get().as_ref() }
    }

    fn prev_link(&self) -> &RingLink {
        unsafe { self.prev.get().as_ref() }
    }

    /// Whether this link is the only member of its ring
    pub(crate) fn is_solitary(&self) -> bool {
        self.prev.get() == self.as_ptr()
    }

    /// Count the members of this links ring, including itself.
    ///
    /// This walks the whole ring and is therefore O(n).
    pub(crate) fn len(&self) -> usize {
        let mut len = 1;
        let mut current = self.next_link();
        while !ptr::eq(current, self) {
            len += 1;
            current = current.next_link();
        }
        len
    }

    /// Whether `other` is a member of the same ring as `self`.
    pub(crate) fn shares_ring_with(&self, other: &RingLink) -> bool {
        let mut current = self;
        loop {
            if ptr::eq(current, other) {
                return true;
            }
            current = current.next_link();
            if ptr::eq(current, self) {
                return false;
            }
        }
    }

    /// Insert `self` into the ring of `anchor`, directly after `anchor`.
    ///
    /// # Panics
    /// This function panics if `self` is already part of a ring with other members.
    pub(crate) fn join_after(&self, anchor: &RingLink) {
        assert!(
            self.is_solitary(),
            "cannot join a ring while still being linked into another one"
        );

        let next_ptr = anchor.next.get();

        // link self to its new neighbours
        self.prev.set(anchor.as_ptr());
        self.next.set(next_ptr);

        // link the neighbours to self
        unsafe { next_ptr.as_ref() }.prev.set(self.as_ptr());
        anchor.next.set(self.as_ptr());

        self.validate();
    }

    /// Remove `self` from its ring, leaving the remaining members linked to each other.
    ///
    /// Afterwards `self` is solitary. Unlinking an already solitary link does nothing.
    pub(crate) fn unlink(&self) {
        let prev = self.prev_link();
        let next = self.next_link();

        prev.next.set(next.as_ptr());
        next.prev.set(prev.as_ptr());
        self.prev.set(self.as_ptr());
        self.next.set(self.as_ptr());

        prev.validate();
    }

    /// Let `a` and `b` trade their places so that each one ends up in the ring the other one was part of.
    ///
    /// The former neighbours of both links stay where they are and are relinked to the opposite link.
    /// At no point does a link lack a valid position in some ring.
    ///
    /// `a` and `b` must be members of different rings.
    /// Exchanging two members of the same ring is only detected when ring validation is enabled.
    pub(crate) fn exchange(a: &RingLink, b: &RingLink) {
        if ptr::eq(a, b) {
            return;
        }
        #[cfg(any(test, feature = "validate_rings"))]
        assert!(
            !a.shares_ring_with(b),
            "cannot exchange two members of the same ring"
        );

        match (a.is_solitary(), b.is_solitary()) {
            (true, true) => {}
            (true, false) => a.take_position_of(b),
            (false, true) => b.take_position_of(a),
            (false, false) => {
                a.next_link().prev.swap(&b.next_link().prev);
                a.prev_link().next.swap(&b.prev_link().next);
                a.prev.swap(&b.prev);
                a.next.swap(&b.next);
            }
        }

        a.validate();
        b.validate();
    }

    /// Move the solitary `self` into the ring position of `other`, leaving `other` solitary.
    fn take_position_of(&self, other: &RingLink) {
        debug_assert!(self.is_solitary());

        self.prev.set(other.prev.get());
        self.next.set(other.next.get());
        other.next_link().prev.set(self.as_ptr());
        other.prev_link().next.set(self.as_ptr());
        other.prev.set(other.as_ptr());
        other.next.set(other.as_ptr());
    }

    /// Walk the ring of `self` and assert that all `prev` and `next` links agree with each other.
    #[cfg(any(test, feature = "validate_rings"))]
    pub(crate) fn validate(&self) {
        let mut current = self;
        loop {
            let next = current.next_link();
            assert!(
                ptr::eq(next.prev_link(), current),
                "ring links disagree: {:p} points forward to {:p} which points back to {:p}",
                current,
                next,
                next.prev_link()
            );
            current = next;
            if ptr::eq(current, self) {
                break;
            }
        }
    }

    #[cfg(not(any(test, feature = "validate_rings")))]
    #[inline(always)]
    pub(crate) fn validate(&self) {}
}

/// Access to the ring bookkeeping of a handle, independent of the handles element type.
///
/// This is what allows handles of different element types to join each others rings without being able to see each
/// others values.
///
/// # Safety
/// `ring_link()` must always return the same link for the same handle and that link must stay valid for as long as
/// the handle is alive.
pub(crate) unsafe trait RingMember {
    /// Get the link which places this handle inside its ring.
    fn ring_link(&self) -> &RingLink;

    fn is_solitary(&self) -> bool {
        self.ring_link().is_solitary()
    }

    /// Join the ring of `other`, directly after it.
    fn join_ring_of(&self, other: &impl RingMember) {
        self.ring_link().join_after(other.ring_link())
    }

    fn leave_ring(&self) {
        self.ring_link().unlink()
    }
}
