use crate::error::AccessError;
use crate::ring::{RingLink, RingMember};
use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, Not};
use core::ptr::{self, NonNull};

/// A pointer which shares ownership of a heap allocated value with all of its clones.
///
/// Unlike [`Rc`](alloc::rc::Rc), there is no reference counter stored next to the value.
/// Instead, all handles which point to the same value are linked into a ring and the value is dropped when the last
/// member of that ring lets go of it.
///
/// # Note on Threads
///
/// The ring is updated without any synchronisation which is why `LinkedPtr` is neither `Send` nor `Sync`:
///
/// ```compile_fail
/// use linked_ptr::LinkedPtr;
///
/// let ptr = LinkedPtr::new(42);
/// std::thread::spawn(move || drop(ptr));
/// ```
///
/// Callers needing to share a value between threads must put the whole ring behind external synchronisation or
/// use an atomically counted pointer like `Arc` instead.
///
/// # Note on Raw Pointers
///
/// A raw pointer can only be adopted by a `LinkedPtr` of the same element type:
///
/// ```compile_fail
/// use linked_ptr::LinkedPtr;
///
/// let raw: *mut u32 = Box::into_raw(Box::new(1));
/// let ptr: LinkedPtr<u64> = unsafe { LinkedPtr::from_raw(raw) };
/// ```
///
/// Handles of a different element type may only share a ring through the explicit
/// [`share_cast()`](LinkedPtr::share_cast) or the [`linked_coerce!`](crate::linked_coerce) macro.
pub struct LinkedPtr<T: ?Sized> {
    /// The node placing this handle in its ring, owned exclusively by this handle
    link: NonNull<RingLink>,
    /// The shared value or `None` if this is a null pointer
    value: Option<NonNull<T>>,
    _owns: PhantomData<T>,
}

/// The address of a value, with `None` being treated as the null address
fn address<T: ?Sized>(value: Option<NonNull<T>>) -> usize {
    value.map_or(0, |value| value.cast::<()>().as_ptr() as usize)
}

impl<T> LinkedPtr<T> {
    /// Move `value` to the heap and create a unique pointer to it.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }
}

impl<T: ?Sized> LinkedPtr<T> {
    /// Create a pointer which does not hold a value.
    pub fn null() -> Self {
        Self::with_value(None)
    }

    /// Create a unique pointer which takes over ownership of the boxed value.
    pub fn from_box(value: Box<T>) -> Self {
        Self::with_value(Some(NonNull::from(Box::leak(value))))
    }

    /// Create a unique pointer which takes over ownership of `raw`.
    ///
    /// A null `raw` pointer results in a null `LinkedPtr`.
    ///
    /// # Safety
    /// - `raw` must either be null or have been returned by [`Box::into_raw`].
    /// - Ownership is transferred to the returned pointer.
    ///   `raw` must not be freed by other means afterwards and must not be handed to another independently created
    ///   `LinkedPtr` since both would then try to drop it.
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        Self::with_value(NonNull::new(raw))
    }

    fn with_value(value: Option<NonNull<T>>) -> Self {
        Self {
            link: RingLink::alloc_solitary(),
            value,
            _owns: PhantomData,
        }
    }

    /// Create a pointer of a different element type which shares the value (and ring) of `this`.
    ///
    /// `cast` is called with the raw value pointer of `this` (if there is one) and returns the same pointer as a
    /// `*mut U`.
    /// Prefer [`linked_coerce!`](crate::linked_coerce) which restricts the cast to unsizing coercions and is therefore
    /// safe.
    ///
    /// # Safety
    /// `cast` must return a pointer to the same allocation which can be turned into a `Box<U>` and dropped in place
    /// of a `Box<T>`.
    /// Unsizing coercions like `*mut S` to `*mut dyn Trait` or `*mut [T; N]` to `*mut [T]` fulfill this.
    ///
    /// # Panics
    /// This function panics if `cast` returns a pointer to a different address.
    pub unsafe fn share_cast<U: ?Sized>(
        this: &Self,
        cast: impl FnOnce(*mut T) -> *mut U,
    ) -> LinkedPtr<U> {
        let value = this.value.map(|value| {
            let cast_value = cast(value.as_ptr());
            assert_eq!(
                cast_value.cast::<()>(),
                value.as_ptr().cast::<()>(),
                "casting a linked pointer must not change its address"
            );
            unsafe { NonNull::new_unchecked(cast_value) }
        });

        let shared = LinkedPtr::with_value(value);
        if shared.value.is_some() {
            shared.join_ring_of(this);
        }
        shared
    }

    /// Let `self` share the value of a pointer with a different element type.
    ///
    /// This is the assigning counterpart to [`share_cast()`](Self::share_cast).
    /// The previous value of `self` is dropped if `self` was its last owner.
    ///
    /// # Safety
    /// The same requirements as for [`share_cast()`](Self::share_cast) apply to `cast`.
    pub unsafe fn assign_cast<U: ?Sized>(
        &mut self,
        source: &LinkedPtr<U>,
        cast: impl FnOnce(*mut U) -> *mut T,
    ) {
        let mut shared = LinkedPtr::share_cast(source, cast);
        self.swap(&mut shared);
    }

    /// Let go of the value, turning `self` into a null pointer.
    ///
    /// If `self` was the last member of its ring, the value is dropped.
    pub fn reset(&mut self) {
        self.release();
    }

    /// Let go of the current value and take ownership of `value` instead.
    ///
    /// If `self` was the last member of its ring, the old value is dropped.
    /// Afterwards `self` is always unique.
    pub fn reset_to(&mut self, value: Box<T>) {
        self.release();
        self.value = Some(NonNull::from(Box::leak(value)));
    }

    /// Let go of the current value and take ownership of `raw` instead.
    ///
    /// Passing the pointer that `self` already holds does nothing.
    /// For zero-sized values every raw pointer counts as the one already held.
    ///
    /// # Safety
    /// The same requirements as for [`from_raw()`](Self::from_raw) apply to `raw`.
    pub unsafe fn reset_raw(&mut self, raw: *mut T) {
        let raw = NonNull::new(raw);
        if address(raw) == address(self.value) {
            return;
        }

        self.release();
        self.value = raw;
    }

    /// Give up this handle's share of the value, leaving it solitary and null.
    fn release(&mut self) {
        if self.is_solitary() {
            if let Some(value) = self.value.take() {
                log::trace!("last linked pointer to {:p} is dropping the value", value);
                drop(unsafe { Box::from_raw(value.as_ptr()) });
            }
        } else {
            if let Some(value) = self.value {
                log::trace!("linked pointer is leaving the ring of {:p}", value);
            }
            self.leave_ring();
            self.value = None;
        }
    }

    /// Exchange values with `other`.
    ///
    /// Both handles also trade their ring memberships so that each of them ends up in the ring which the other one
    /// was part of.
    /// Neither value is moved or dropped.
    pub fn swap(&mut self, other: &mut Self) {
        // both are null or already part of the same ring
        if address(self.value) == address(other.value) && !self.is_distinct_zst_owner(other) {
            return;
        }

        mem::swap(&mut self.value, &mut other.value);
        RingLink::exchange(self.ring_link(), other.ring_link());
    }

    /// Whether `self` and `other` own zero-sized values through different rings.
    ///
    /// All zero-sized values share one address, so only ring membership tells their owners apart.
    fn is_distinct_zst_owner(&self, other: &Self) -> bool {
        match self.value() {
            Some(value) if mem::size_of_val(value) == 0 => {
                !self.ring_link().shares_ring_with(other.ring_link())
            }
            _ => false,
        }
    }

    /// Whether `self` is the only member of its ring.
    ///
    /// This is also the case for null pointers.
    pub fn is_unique(&self) -> bool {
        self.is_solitary()
    }

    /// The number of pointers in the ring of `self`, including `self`.
    ///
    /// Computing this requires walking the ring.
    pub fn ring_len(&self) -> usize {
        self.ring_link().len()
    }

    /// The raw pointer to the shared value
    pub fn get(&self) -> Option<NonNull<T>> {
        self.value
    }

    /// The shared value or `None` for a null pointer
    pub fn value(&self) -> Option<&T> {
        self.value.map(|value| unsafe { value.as_ref() })
    }

    /// The shared value or [`AccessError::Null`] for a null pointer
    pub fn try_value(&self) -> Result<&T, AccessError> {
        self.value().ok_or(AccessError::Null)
    }

    /// Get mutable access to the value.
    ///
    /// This is only possible while `self` is the only pointer to it.
    pub fn get_mut(&mut self) -> Result<&mut T, AccessError> {
        match self.value {
            None => Err(AccessError::Null),
            Some(_) if !self.is_solitary() => Err(AccessError::Shared {
                ring_len: self.ring_len(),
            }),
            Some(mut value) => Ok(unsafe { value.as_mut() }),
        }
    }

    /// Whether `self` does not hold a value
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Take the value out of `this` if it is its only owner.
    ///
    /// Otherwise, `this` is handed back unchanged.
    pub fn try_unwrap(mut this: Self) -> Result<Box<T>, Self> {
        let value = this.value;
        match value {
            Some(value) if this.is_solitary() => {
                this.value = None;
                Ok(unsafe { Box::from_raw(value.as_ptr()) })
            }
            _ => Err(this),
        }
    }

    /// The address of the value which is used for comparing and hashing pointers
    pub(crate) fn address(&self) -> usize {
        address(self.value)
    }
}

unsafe impl<T: ?Sized> RingMember for LinkedPtr<T> {
    fn ring_link(&self) -> &RingLink {
        unsafe { self.link.as_ref() }
    }
}

impl<T: ?Sized> Drop for LinkedPtr<T> {
    fn drop(&mut self) {
        self.release();
        unsafe { RingLink::free(self.link) }
    }
}

impl<T: ?Sized> Clone for LinkedPtr<T> {
    /// Create another pointer to the same value which joins the ring of `self`.
    fn clone(&self) -> Self {
        let copy = Self::with_value(self.value);
        if copy.value.is_some() {
            copy.join_ring_of(self);
        }
        copy
    }

    /// Let `self` share the value of `source`, dropping the old value if `self` was its last owner.
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        self.swap(&mut copy);
    }
}

impl<T: ?Sized> Default for LinkedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Deref for LinkedPtr<T> {
    type Target = T;

    /// # Panics
    /// Dereferencing a null pointer panics.
    fn deref(&self) -> &Self::Target {
        match self.value() {
            Some(value) => value,
            None => panic!("dereferenced a null LinkedPtr"),
        }
    }
}

impl<T: ?Sized> Not for &LinkedPtr<T> {
    type Output = bool;

    fn not(self) -> Self::Output {
        self.is_null()
    }
}

impl<T> From<T> for LinkedPtr<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized> From<Box<T>> for LinkedPtr<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T: ?Sized> fmt::Debug for LinkedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedPtr")
            .field("value", &self.value)
            .field("ring_len", &self.ring_len())
            .finish()
    }
}

impl<T: ?Sized> fmt::Pointer for LinkedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self
            .value
            .map_or(ptr::null(), |value| value.cast::<()>().as_ptr().cast_const());
        fmt::Pointer::fmt(&value, f)
    }
}

/// Create a unique [`LinkedPtr`] which takes over ownership of the boxed value.
///
/// Taking a `Box` keeps this factory safe.
/// Use [`LinkedPtr::from_raw()`] to adopt a raw pointer obtained from [`Box::into_raw`] instead.
pub fn make_linked<T: ?Sized>(value: Box<T>) -> LinkedPtr<T> {
    LinkedPtr::from_box(value)
}

/// Exchange the values and ring memberships of `a` and `b`.
///
/// See [`LinkedPtr::swap()`].
pub fn swap<T: ?Sized>(a: &mut LinkedPtr<T>, b: &mut LinkedPtr<T>) {
    a.swap(b)
}
