//! Unchecked access across suspension points.
//!
//! [`UncheckedMut`] is the escape hatch handed to
//! [`DeferredOwner::with_unchecked_mut`](super::DeferredOwner::with_unchecked_mut)
//! bodies. The handle itself is inert and freely copyable; only dereferencing
//! it is `unsafe`. This keeps the unchecked entry points concentrated in one
//! small, auditable surface while letting the handle live across `.await`s,
//! which a checked borrow guard must not.

use core::marker::PhantomData;

/// Unchecked handle to the value owned by a
/// [`DeferredOwner`](super::DeferredOwner).
///
/// Valid for the duration of the `with_unchecked_mut` call that produced it.
/// The runtime borrow flag is not consulted by its accessors: that check is
/// exactly what cannot be revalidated across a suspension point, and
/// bypassing it is this type's purpose. In exchange, the data-race-freedom
/// burden moves from the wrapper to the caller: keep at most one unchecked
/// mutation in flight per owner, or restrict yourself to conflict-free
/// operations.
///
/// The handle is not `Send`: it may not leave the thread its owner lives on.
pub struct UncheckedMut<'owner, T> {
    pub(super) ptr: *mut T,
    pub(super) _owner: PhantomData<&'owner ()>,
}

impl<'owner, T> Clone for UncheckedMut<'owner, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'owner, T> Copy for UncheckedMut<'owner, T> {}

impl<'owner, T> UncheckedMut<'owner, T> {
    /// Reads through the handle.
    ///
    /// # Safety
    /// - No `&mut T` to the same value may be live for the duration of the
    ///   returned borrow. That includes an outstanding
    ///   [`RefMut`](super::RefMut) guard and references produced by
    ///   [`get_mut`](Self::get_mut) on any copy of this handle.
    /// - Do not hold the returned `&T` across an `.await`; re-derive it after
    ///   every suspension point instead.
    #[inline(always)]
    pub unsafe fn get(&self) -> &T {
        // SAFETY: the owner forced construction before handing out the
        // handle, so the pointee is initialized; aliasing is the caller's
        // contract above.
        unsafe { &*self.ptr }
    }

    /// Writes through the handle.
    ///
    /// # Safety
    /// - The returned `&mut T` must be exclusive for its lifetime: no other
    ///   reference to the value (checked guard, [`get`](Self::get), or
    ///   another `get_mut`) may overlap it.
    /// - Do not hold the returned `&mut T` across an `.await`; re-derive it
    ///   after every suspension point instead.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut T {
        // SAFETY: initialization as in `get`; exclusivity is the caller's
        // contract above.
        unsafe { &mut *self.ptr }
    }
}
