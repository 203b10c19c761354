//! Comparisons of [`LinkedPtr`]s.
//!
//! Pointers are compared by the address of the value they point to, not by the value itself and not by their ring
//! membership.
//! A null pointer compares like the null address and therefore sorts before all other pointers.
//! Pointers of different element types can be compared too, e.g. a `LinkedPtr<dyn Trait>` with the
//! `LinkedPtr<Concrete>` it was coerced from.

use crate::LinkedPtr;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

impl<T: ?Sized, U: ?Sized> PartialEq<LinkedPtr<U>> for LinkedPtr<T> {
    fn eq(&self, other: &LinkedPtr<U>) -> bool {
        self.address() == other.address()
    }
}

impl<T: ?Sized> Eq for LinkedPtr<T> {}

impl<T: ?Sized, U: ?Sized> PartialOrd<LinkedPtr<U>> for LinkedPtr<T> {
    fn partial_cmp(&self, other: &LinkedPtr<U>) -> Option<Ordering> {
        Some(self.address().cmp(&other.address()))
    }
}

impl<T: ?Sized> Ord for LinkedPtr<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address().cmp(&other.address())
    }
}

impl<T: ?Sized> Hash for LinkedPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state)
    }
}
