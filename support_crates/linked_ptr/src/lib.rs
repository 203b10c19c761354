//! A shared-ownership pointer which tracks its owners in a ring instead of a counter.
//!
//! All [`LinkedPtr`]s which share a value are linked into a circular double-linked list.
//! Cloning a pointer inserts the clone into that ring, dropping or resetting a pointer removes it again.
//! The value itself is dropped exactly once: when the last member of the ring lets go of it, which is detected by
//! that member being linked only to itself.
//!
//! ```
//! use linked_ptr::LinkedPtr;
//!
//! let first = LinkedPtr::new(1111);
//! let second = first.clone();
//! assert_eq!(first.ring_len(), 2);
//! assert!(first == second);
//!
//! drop(first);
//! assert!(second.is_unique());
//! assert_eq!(*second, 1111);
//! ```
//!
//! The ring is not synchronised in any way so pointers can neither be sent to nor shared with other threads.

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod cmp;
mod error;
mod linked_ptr;
mod ring;

pub use error::AccessError;
pub use linked_ptr::{make_linked, swap, LinkedPtr};

static_assertions::assert_not_impl_any!(LinkedPtr<u8>: Send, Sync);

/// Create a pointer to another type which shares the value and ring of an existing [`LinkedPtr`].
///
/// Only unsizing coercions are accepted, most notably the conversion to a trait object:
///
/// ```
/// use linked_ptr::{linked_coerce, LinkedPtr};
/// use core::fmt::Display;
///
/// let number = LinkedPtr::new(42);
/// let display = linked_coerce!(number => dyn Display);
///
/// assert_eq!(display.ring_len(), 2);
/// assert!(display == number);
/// ```
#[macro_export]
macro_rules! linked_coerce {
    ($ptr:expr => $target:ty) => {
        // implicit pointer coercion only allows unsizing which keeps the address and the drop glue intact
        unsafe { $crate::LinkedPtr::share_cast(&$ptr, |raw| -> *mut $target { raw }) }
    };
}
