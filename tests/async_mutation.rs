//! Async contract tests for `with_unchecked_mut`: suspension, ordering, and
//! the documented interleaving hazard.
//!
//! Everything runs on a current-thread runtime plus a `LocalSet`, matching
//! the single-threaded-affinity contexts the unchecked surface is meant for.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use deferred_owner::DeferredOwner;

fn run_local<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("could not build runtime");
    let local_set = tokio::task::LocalSet::new();
    local_set.block_on(&runtime, future)
}

#[derive(Default)]
struct Tally {
    total: u64,
}

#[test]
fn caller_suspends_until_body_completes() {
    run_local(async {
        let owner: DeferredOwner<Tally> = DeferredOwner::default();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let body_log = log.clone();
        owner
            .with_unchecked_mut(|handle| async move {
                body_log.borrow_mut().push("body:enter");
                tokio::task::yield_now().await;
                // SAFETY: this is the only unchecked mutation in flight, and
                // the borrow does not cross the suspension point above.
                unsafe { handle.get_mut() }.total += 1;
                body_log.borrow_mut().push("body:exit");
            })
            .await;
        log.borrow_mut().push("caller:resumed");

        assert_eq!(*log.borrow(), ["body:enter", "body:exit", "caller:resumed"]);
        assert_eq!(owner.with_mut(|t| t.total), 1);
    });
}

#[test]
fn sequential_calls_from_one_task_run_in_call_order() {
    run_local(async {
        let owner: DeferredOwner<Vec<u32>> = DeferredOwner::default();

        for i in 0..4 {
            owner
                .with_unchecked_mut(|handle| async move {
                    tokio::task::yield_now().await;
                    // SAFETY: one call in flight; the borrow is derived
                    // after the suspension point, not carried across it.
                    unsafe { handle.get_mut() }.push(i);
                })
                .await;
        }

        assert_eq!(owner.with_mut(|v| v.clone()), vec![0, 1, 2, 3]);
    });
}

#[test]
fn with_unchecked_mut_forces_construction() {
    run_local(async {
        let runs = Cell::new(0u32);
        let owner = DeferredOwner::new(|| {
            runs.set(runs.get() + 1);
            Tally::default()
        });
        assert_eq!(runs.get(), 0);

        owner
            .with_unchecked_mut(|handle| async move {
                // SAFETY: single call in flight, no checked guard exists.
                assert_eq!(unsafe { handle.get() }.total, 0);
            })
            .await;

        assert_eq!(runs.get(), 1);
        assert!(owner.is_initialized());
    });
}

#[test]
fn async_body_panic_reaches_the_caller_unchanged() {
    let caught = catch_unwind(AssertUnwindSafe(|| {
        run_local(async {
            let owner: DeferredOwner<Tally> = DeferredOwner::default();
            owner
                .with_unchecked_mut(|_handle| async move {
                    panic!("async body failure");
                })
                .await;
        });
    }))
    .unwrap_err();
    assert_eq!(caught.downcast_ref::<&str>(), Some(&"async body failure"));
}

/// Demonstrates the documented hazard rather than preventing it: two
/// concurrent calls interleave their read-suspend-write sequences and lose
/// an update, producing a result neither sequential ordering could.
#[test]
fn concurrent_calls_interleave_and_lose_updates() {
    let final_total = run_local(async {
        let owner: Rc<DeferredOwner<Tally>> = Rc::new(DeferredOwner::default());
        owner.with_mut(|t| t.total = 1);

        let add_ten = tokio::task::spawn_local({
            let owner = owner.clone();
            async move {
                owner
                    .with_unchecked_mut(|handle| async move {
                        // SAFETY: borrows are transient and never held
                        // across the suspension point; the interleaving this
                        // schedule permits is the hazard under test.
                        let snapshot = unsafe { handle.get() }.total;
                        tokio::task::yield_now().await;
                        unsafe { handle.get_mut() }.total = snapshot + 10;
                    })
                    .await;
            }
        });
        let double = tokio::task::spawn_local({
            let owner = owner.clone();
            async move {
                owner
                    .with_unchecked_mut(|handle| async move {
                        // SAFETY: as above.
                        let snapshot = unsafe { handle.get() }.total;
                        tokio::task::yield_now().await;
                        unsafe { handle.get_mut() }.total = snapshot * 2;
                    })
                    .await;
            }
        });

        add_ten.await.expect("add_ten task");
        double.await.expect("double task");
        owner.with_mut(|t| t.total)
    });

    // Sequential orderings from 1 would give (1 + 10) * 2 = 22 or
    // 1 * 2 + 10 = 12; the interleaved schedule loses one update instead.
    assert_ne!(final_total, 22);
    assert_ne!(final_total, 12);
    assert!(
        final_total == 2 || final_total == 11,
        "expected a lost update, got {final_total}"
    );
}
