//! # `deferred-owner` - Construct-Once State for Value-Type Re-Renders
//!
//! A lazy-initialization owner for reference-typed state used inside
//! declarative, retained-mode UIs: the view-describing structures are cheap
//! value types rebuilt on every re-render, while some of their dependencies
//! are expensive or stateful objects that must be created exactly once and
//! reused for as long as the surrounding identity lives.
//!
//! [`DeferredOwner`] holds a zero-argument factory and an in-place slot for
//! the value it produces. The factory runs on the *first* access of any kind,
//! never at construction and never more than once. Every later access
//! observes the same value, in place, so a mutation made through one access
//! mode is visible through all of them.
//!
//! ## Access Modes
//!
//! 1. **Transparent access** - [`DeferredOwner::borrow`] and
//!    [`DeferredOwner::borrow_mut`] return guards that deref straight to the
//!    owned value, so field reads and writes look like plain member access.
//!    Borrows are checked at runtime, ref-cell style.
//! 2. **Synchronous grouped mutation** - [`DeferredOwner::with_mut`] runs a
//!    closure over `&mut T` to completion, batching several reads and writes
//!    into one visible operation. It never suspends, so nothing can
//!    interleave with it from the same logical task.
//! 3. **Unchecked asynchronous mutation** - [`DeferredOwner::with_unchecked_mut`]
//!    hands an async body an [`UncheckedMut`] handle that stays usable across
//!    suspension points. The runtime borrow flag is deliberately not
//!    consulted; the handle's `unsafe` accessors carry the aliasing contract
//!    instead.
//!
//! ## Safety Guarantees
//!
//! - **Single construction**: the factory is consumed by the first forced
//!   access; the state machine makes a second invocation unrepresentable.
//! - **Checked borrows**: the guard surface enforces the usual
//!   many-readers-xor-one-writer discipline at runtime and releases the flag
//!   during unwinding.
//! - **Poison latch**: a factory that panics (or re-enters the owner) poisons
//!   the owner permanently; later accesses panic instead of observing a
//!   half-built value.
//! - **Explicit escape hatch**: only the [`UncheckedMut`] accessors are
//!   `unsafe`, and their contracts are documented caller obligations, not
//!   enforced invariants. Keeping at most one unchecked mutation in flight
//!   per owner is the caller's job.
//!
//! ## Example
//!
//! ```rust
//! use deferred_owner::DeferredOwner;
//!
//! struct Connection {
//!     url: String,
//!     sent: u32,
//! }
//!
//! let owner = DeferredOwner::new(|| Connection {
//!     url: "https://example.net".to_owned(),
//!     sent: 0,
//! });
//!
//! // Nothing has been constructed yet.
//! assert!(!owner.is_initialized());
//!
//! // First access builds the connection; later accesses reuse it.
//! owner.with_mut(|conn| conn.sent += 1);
//! owner.borrow_mut().sent += 1;
//! assert_eq!(owner.borrow().sent, 2);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod owner;

pub use owner::{DeferredOwner, Ref, RefMut, UncheckedMut};
