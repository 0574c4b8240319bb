//! `DeferredOwner` - a construct-once owner for reference-typed state.
//!
//! The module tree is intentionally stratified:
//! - `inner` is the minimal unsafe storage (union slot + state discriminant).
//! - `guards` are the checked, ref-cell style access guards.
//! - `unchecked` is the explicitly-unsafe surface for use across suspension
//!   points.

mod guards;
mod inner;
mod unchecked;


pub use guards::{Ref, RefMut};
pub use unchecked::UncheckedMut;

use core::{
    cell::{Cell, UnsafeCell},
    future::Future,
    marker::PhantomData,
    mem::ManuallyDrop,
};

use inner::{Slot, State};

/// An owner for a value that is constructed on first access and reused, in
/// place, for every access after that.
///
/// A `DeferredOwner` is created with a zero-argument factory that is *not*
/// invoked at creation. The first access of any kind - a guard borrow,
/// [`with_mut`](Self::with_mut), or
/// [`with_unchecked_mut`](Self::with_unchecked_mut) - runs the factory
/// exactly once and stores the result; the factory can never run again. The
/// owner is typically kept in a host framework's persistent per-identity
/// state slot (e.g. behind an `Rc`), so that the value survives however many
/// times the surrounding value-type structures are rebuilt.
///
/// ## Poisoning
///
/// If the factory panics, or re-entrantly accesses the owner it is
/// constructing for, the owner is permanently poisoned: the factory has been
/// consumed and is never retried, and every later access panics. This is the
/// same failure latch `std::sync::Once` uses, shifted to first-access time -
/// a factory that can fail does so at the first use of the value, not at the
/// owner's creation.
///
/// ## Threading
///
/// The owner is `!Sync` by construction and introduces no threads, locks, or
/// schedulers of its own. It is `Send` when `T` and `F` are.
pub struct DeferredOwner<T, F = fn() -> T> {
    // Borrow flag for the guard surface: negative = writing, positive =
    // reading, zero = free.
    borrow: Cell<isize>,
    state: Cell<State>,
    slot: UnsafeCell<Slot<T, F>>,
}

impl<T, F> DeferredOwner<T, F>
where
    F: FnOnce() -> T,
{
    /// Creates a new owner with the given factory.
    ///
    /// The factory is not invoked; creation has no side effects.
    pub const fn new(factory: F) -> Self {
        Self {
            borrow: Cell::new(0),
            state: Cell::new(State::Unset),
            slot: UnsafeCell::new(Slot::new(factory)),
        }
    }

    /// Returns `true` if the value has been constructed.
    ///
    /// Does not force construction.
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.state.get() == State::Ready
    }

    /// Returns `true` if an earlier construction attempt failed and latched
    /// the owner.
    #[inline(always)]
    pub fn is_poisoned(&self) -> bool {
        self.state.get() == State::Poisoned
    }

    /// Immutably borrows the owned value, constructing it on first access.
    ///
    /// The guard derefs to `&T`, so fields and methods of the value are
    /// reachable as if the owner were the value itself.
    ///
    /// # Panics
    /// Panics if the value is currently mutably borrowed, or if the owner is
    /// poisoned.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T, F> {
        self.force();
        let current = self.borrow.get();
        if current < 0 {
            panic!("already mutably borrowed");
        }
        self.borrow.set(current + 1);
        Ref { owner: self }
    }

    /// Mutably borrows the owned value, constructing it on first access.
    ///
    /// # Panics
    /// Panics if the value is currently borrowed, or if the owner is
    /// poisoned.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, T, F> {
        self.force();
        if self.borrow.get() != 0 {
            panic!("already borrowed");
        }
        self.borrow.set(-1);
        RefMut { owner: self }
    }

    /// Attempts to immutably borrow the owned value, constructing it on
    /// first access.
    ///
    /// Returns `None` if the value is currently mutably borrowed.
    ///
    /// # Panics
    /// Panics if the owner is poisoned.
    #[inline]
    pub fn try_borrow(&self) -> Option<Ref<'_, T, F>> {
        self.force();
        let current = self.borrow.get();
        if current < 0 {
            return None;
        }
        self.borrow.set(current + 1);
        Some(Ref { owner: self })
    }

    /// Attempts to mutably borrow the owned value, constructing it on first
    /// access.
    ///
    /// Returns `None` if the value is currently borrowed.
    ///
    /// # Panics
    /// Panics if the owner is poisoned.
    #[inline]
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, T, F>> {
        self.force();
        if self.borrow.get() != 0 {
            return None;
        }
        self.borrow.set(-1);
        Some(RefMut { owner: self })
    }

    /// Runs `body` over the owned value, constructing it on first access,
    /// and returns whatever `body` returns.
    ///
    /// The exclusive borrow is held for exactly the duration of `body`, so a
    /// sequence of reads and writes becomes one visible operation at the
    /// call site. `with_mut` never suspends; nothing can interleave with it
    /// from the same logical task. A panic inside `body` propagates
    /// unchanged, and the borrow is released during unwinding.
    ///
    /// # Panics
    /// Panics if the value is currently borrowed, or if the owner is
    /// poisoned.
    #[inline]
    pub fn with_mut<R>(&self, body: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.borrow_mut();
        body(&mut *guard)
    }

    /// Runs an asynchronous `body` over the owned value, constructing it on
    /// first access, and returns whatever `body` returns. The caller
    /// suspends until `body` completes.
    ///
    /// `body` receives an [`UncheckedMut`] handle instead of a checked
    /// guard: the runtime borrow flag cannot be revalidated across the
    /// suspension points inside `body`, so it is deliberately bypassed. The
    /// handle's accessors are `unsafe` and carry the resulting obligations.
    ///
    /// This operation does **not** serialize concurrent invocations. Two
    /// tasks calling it on the same owner both receive handles to the same
    /// value and may interleave mutations at suspension points with no
    /// ordering guarantee - a documented hazard, not a bug. Callers are
    /// responsible for keeping at most one such call in flight per owner, or
    /// for only performing conflict-free operations.
    ///
    /// A panic inside `body` propagates unchanged. If the task running this
    /// call is cancelled, `body` is dropped at its current suspension point;
    /// no cleanup is performed here.
    ///
    /// # Panics
    /// Panics if the owner is poisoned.
    pub async fn with_unchecked_mut<'a, B, Fut, R>(&'a self, body: B) -> R
    where
        B: FnOnce(UncheckedMut<'a, T>) -> Fut,
        Fut: Future<Output = R> + 'a,
    {
        self.force();
        let handle = UncheckedMut {
            // SAFETY: pure projection to the value slot; `force` left the
            // state `Ready`, and the pointer stays valid while `self` is
            // borrowed for `'a`.
            ptr: unsafe { Slot::value_ptr(self.slot.get()) },
            _owner: PhantomData,
        };
        body(handle).await
    }

    /// Ensures the value exists, running the factory if this is the first
    /// access.
    #[inline]
    fn force(&self) {
        match self.state.get() {
            State::Ready => {}
            State::Unset => self.construct(),
            State::Poisoned => {
                panic!("deferred value poisoned: its factory panicked or re-entered the owner")
            }
        }
    }

    #[cold]
    fn construct(&self) {
        debug_assert!(self.state.get() == State::Unset);
        let factory = {
            // SAFETY: state is `Unset`, so no guard or handle references the
            // slot; this borrow is the only live access, and it ends before
            // the factory runs.
            let slot = unsafe { &mut *self.slot.get() };
            // SAFETY: state is `Unset`; the factory bytes are moved out
            // exactly once, and the state transitions right below.
            unsafe { slot.take_factory() }
        };
        // Poison before running the factory: a panicking or re-entrant
        // factory must observe the latch, never a half-built slot.
        self.state.set(State::Poisoned);
        #[cfg(feature = "tracing")]
        tracing::trace!("constructing deferred value");
        let value = factory();
        // SAFETY: state is `Poisoned`, so no other access aliases the slot.
        let slot = unsafe { &mut *self.slot.get() };
        slot.value = ManuallyDrop::new(value);
        self.state.set(State::Ready);
    }
}

impl<T: Default> Default for DeferredOwner<T, fn() -> T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

impl<T, F> Drop for DeferredOwner<T, F> {
    fn drop(&mut self) {
        let slot = self.slot.get_mut();
        match self.state.get() {
            // SAFETY: in drop we have exclusive access, and the state cell
            // names the initialized union field.
            State::Unset => unsafe { ManuallyDrop::drop(&mut slot.factory) },
            State::Ready => unsafe { ManuallyDrop::drop(&mut slot.value) },
            State::Poisoned => {}
        }
    }
}
