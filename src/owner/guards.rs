//! Borrow guards for [`DeferredOwner`].

use super::DeferredOwner;

/// Immutable borrow guard for [`DeferredOwner`].
///
/// Derefs to the owned value; dropping it releases the shared borrow.
pub struct Ref<'owner, T, F = fn() -> T> {
    pub(super) owner: &'owner DeferredOwner<T, F>,
}

impl<'owner, T, F> core::ops::Deref for Ref<'owner, T, F> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        // SAFETY:
        // - `Ref` exists only after forcing succeeded (state is `Ready`) and
        //   the reader count was incremented.
        // - While the reader count > 0, no `RefMut` can be created, so no
        //   checked `&mut T` overlaps this `&T`.
        unsafe { (*self.owner.slot.get()).value_ref() }
    }
}

impl<'owner, T, F> Drop for Ref<'owner, T, F> {
    fn drop(&mut self) {
        // Decrement reader count.
        let prev = self.owner.borrow.get();
        debug_assert!(prev > 0, "borrow count underflow");
        self.owner.borrow.set(prev - 1);
    }
}

/// Mutable borrow guard for [`DeferredOwner`].
///
/// Derefs to the owned value; dropping it releases the exclusive borrow.
pub struct RefMut<'owner, T, F = fn() -> T> {
    pub(super) owner: &'owner DeferredOwner<T, F>,
}

impl<'owner, T, F> core::ops::Deref for RefMut<'owner, T, F> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        // SAFETY: `RefMut` exists only after transitioning the borrow flag
        // 0 -> -1 (exclusive) over a `Ready` owner.
        unsafe { (*self.owner.slot.get()).value_ref() }
    }
}

impl<'owner, T, F> core::ops::DerefMut for RefMut<'owner, T, F> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: `RefMut` exists only after transitioning the borrow flag
        // 0 -> -1 (exclusive) over a `Ready` owner.
        unsafe { (*self.owner.slot.get()).value_mut() }
    }
}

impl<'owner, T, F> Drop for RefMut<'owner, T, F> {
    fn drop(&mut self) {
        // Clear writer flag.
        let prev = self.owner.borrow.get();
        debug_assert_eq!(prev, -1, "expected writer borrow flag");
        self.owner.borrow.set(0);
    }
}
