//! Coordinator integration tests.
//!
//! Drive the [`LoadCoordinator`] directly against an in-memory
//! [`HandleRegistry`], signalling completions by hand the way the loader
//! thread would.
//!
//! # Test Categories
//!
//! 1. **Scenarios** - the `game.wasm.js` walk-through, success and failure
//! 2. **Dedup & fan-out** - many consumers, one handle, one terminal value
//! 3. **Cleanup** - detach isolation and `remove_on_unmount` policies
//! 4. **Randomized** - interleaved requests, detaches and completions

use resourceload::resources::coordinator::{
    LoadCoordinator, RemovalPolicy, RequestOptions, Subscription,
};
use resourceload::resources::loadstatus::{LoadOutcome, LoadStatus};
use resourceload::resources::registry::{HandleId, HandleRegistry};

const GAME: &str = "game.wasm.js";

fn coordinator() -> LoadCoordinator {
    LoadCoordinator::new(HandleRegistry::new())
}

fn request(c: &mut LoadCoordinator, identifier: &str) -> Subscription {
    c.request(Some(identifier), RequestOptions::default())
}

fn handle(c: &LoadCoordinator, identifier: &str) -> HandleId {
    c.registry().find(identifier).expect("handle exists")
}

// =============================================================================
// CATEGORY 1: Scenarios
// =============================================================================

#[test]
fn scenario_success_walkthrough() {
    let mut c = coordinator();

    // First request with empty cache and registry.
    let mut first = request(&mut c, GAME);
    assert_eq!(first.status(), LoadStatus::Loading);
    assert_eq!(c.registry().len(), 1);
    let h = handle(&c, GAME);
    assert_eq!(c.registry().status_marker(h), Some(LoadStatus::Loading));

    // Second request before completion.
    let mut second = request(&mut c, GAME);
    assert_eq!(second.status(), LoadStatus::Loading);
    assert_eq!(c.registry().len(), 1);

    // Registry signals success.
    c.complete(h, LoadOutcome::Loaded);
    assert_eq!(c.cache().get(GAME), Some(LoadStatus::Ready));
    assert_eq!(first.poll(), Some(LoadStatus::Ready));
    assert_eq!(second.poll(), Some(LoadStatus::Ready));

    // Third request after success.
    let third = request(&mut c, GAME);
    assert_eq!(third.status(), LoadStatus::Ready);
    assert_eq!(c.registry().len(), 1);
}

#[test]
fn scenario_failure_walkthrough() {
    let mut c = coordinator();
    let mut first = request(&mut c, GAME);
    let mut second = request(&mut c, GAME);
    let h = handle(&c, GAME);

    c.complete(h, LoadOutcome::Failed);
    assert_eq!(c.cache().get(GAME), Some(LoadStatus::Error));
    assert_eq!(first.poll(), Some(LoadStatus::Error));
    assert_eq!(second.poll(), Some(LoadStatus::Error));

    let next = request(&mut c, GAME);
    assert_eq!(next.status(), LoadStatus::Error);
    assert_eq!(c.registry().len(), 1);
    assert_eq!(handle(&c, GAME), h);
}

#[test]
fn cached_terminal_with_live_handle_still_attaches() {
    let mut c = coordinator();
    let _first = request(&mut c, GAME);
    let h = handle(&c, GAME);
    c.complete(h, LoadOutcome::Loaded);

    let late = request(&mut c, GAME);
    assert_eq!(late.status(), LoadStatus::Ready);
    assert!(late.is_attached());
    assert_eq!(late.handle(), Some(h));
    assert_eq!(c.registry().get(h).unwrap().listener_count(), 2);
}

#[test]
fn unrelated_identifiers_are_independent() {
    let mut c = coordinator();
    let mut a = request(&mut c, "a.js");
    let mut b = request(&mut c, "b.js");
    assert_eq!(c.registry().len(), 2);

    c.complete(handle(&c, "b.js"), LoadOutcome::Failed);
    assert_eq!(a.poll(), None);
    assert_eq!(b.poll(), Some(LoadStatus::Error));
    assert_eq!(c.cache().get("a.js"), None);

    c.complete(handle(&c, "a.js"), LoadOutcome::Loaded);
    assert_eq!(a.poll(), Some(LoadStatus::Ready));
}

// =============================================================================
// CATEGORY 2: Dedup & fan-out
// =============================================================================

#[test]
fn many_concurrent_requests_create_one_handle() {
    let mut c = coordinator();
    let mut subs: Vec<Subscription> = (0..32).map(|_| request(&mut c, GAME)).collect();
    assert_eq!(c.registry().len(), 1);
    assert!(subs.iter().all(|s| s.status() == LoadStatus::Loading));

    c.complete(handle(&c, GAME), LoadOutcome::Loaded);
    for sub in subs.iter_mut() {
        assert_eq!(sub.poll(), Some(LoadStatus::Ready));
    }
}

#[test]
fn idle_requests_never_touch_registry() {
    let mut c = coordinator();
    for _ in 0..10 {
        let a = c.request(None, RequestOptions::remove_on_unmount());
        let b = c.request(
            Some(GAME),
            RequestOptions {
                should_prevent_load: true,
                remove_on_unmount: true,
            },
        );
        assert_eq!(a.status(), LoadStatus::Idle);
        assert_eq!(b.status(), LoadStatus::Idle);
        c.detach(a);
        c.detach(b);
    }
    assert!(c.registry().is_empty());
    assert!(c.cache().is_empty());
}

#[test]
fn observed_statuses_are_monotonic() {
    let mut c = coordinator();
    let mut sub = request(&mut c, GAME);
    let h = handle(&c, GAME);
    let mut seen = vec![sub.status()];

    c.complete(h, LoadOutcome::Loaded);
    c.complete(h, LoadOutcome::Failed);
    while let Some(status) = sub.poll() {
        seen.push(status);
    }
    assert_eq!(seen, vec![LoadStatus::Loading, LoadStatus::Ready]);
}

// =============================================================================
// CATEGORY 3: Cleanup
// =============================================================================

#[test]
fn plain_detach_leaves_others_and_cache_alone() {
    let mut c = coordinator();
    let a = request(&mut c, GAME);
    let mut b = request(&mut c, GAME);
    let h = handle(&c, GAME);
    c.complete(h, LoadOutcome::Loaded);
    c.detach(a);

    assert_eq!(c.cache().get(GAME), Some(LoadStatus::Ready));
    assert_eq!(c.registry().len(), 1);
    assert_eq!(b.poll(), Some(LoadStatus::Ready));
}

#[test]
fn detach_before_completion_does_not_cancel_load() {
    let mut c = coordinator();
    let only = request(&mut c, GAME);
    let h = handle(&c, GAME);
    c.detach(only);

    assert_eq!(c.registry().len(), 1);
    assert!(c.complete(h, LoadOutcome::Loaded).is_some());
    assert_eq!(request(&mut c, GAME).status(), LoadStatus::Ready);
}

#[test]
fn unscoped_removal_strands_remaining_consumers() {
    let mut c = coordinator();
    let remover = c.request(Some(GAME), RequestOptions::remove_on_unmount());
    let mut stranded = request(&mut c, GAME);
    let old = handle(&c, GAME);

    c.detach(remover);
    assert!(c.registry().is_empty());
    assert!(c.complete(old, LoadOutcome::Loaded).is_none());
    assert_eq!(stranded.poll(), None);

    let fresh = request(&mut c, GAME);
    assert_eq!(fresh.status(), LoadStatus::Loading);
    assert_ne!(handle(&c, GAME), old);
}

#[test]
fn last_consumer_removal_waits_for_everyone() {
    let mut c = LoadCoordinator::new(HandleRegistry::new()).with_policy(RemovalPolicy::LastConsumer);
    let remover = c.request(Some(GAME), RequestOptions::remove_on_unmount());
    let mut other = request(&mut c, GAME);
    let h = handle(&c, GAME);

    c.detach(remover);
    assert_eq!(c.registry().len(), 1);
    c.complete(h, LoadOutcome::Loaded);
    assert_eq!(other.poll(), Some(LoadStatus::Ready));

    // A remove_on_unmount consumer that is last does clean up.
    let last = c.request(Some(GAME), RequestOptions::remove_on_unmount());
    c.detach(other);
    c.detach(last);
    assert!(c.registry().is_empty());
    assert_eq!(c.cache().get(GAME), None);
}

// =============================================================================
// CATEGORY 4: Randomized
// =============================================================================

#[test]
fn random_interleavings_keep_invariants() {
    let identifiers = ["a.js", "b.js", "c.js"];
    for seed in 0..50u64 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut c = coordinator();
        let mut subs: Vec<Subscription> = Vec::new();

        for _ in 0..200 {
            let id = identifiers[rng.usize(..identifiers.len())];
            match rng.u8(..4) {
                0 | 1 => subs.push(request(&mut c, id)),
                2 if !subs.is_empty() => {
                    let sub = subs.swap_remove(rng.usize(..subs.len()));
                    c.detach(sub);
                }
                _ => {
                    if let Some(h) = c.registry().find(id) {
                        let outcome = if rng.bool() {
                            LoadOutcome::Loaded
                        } else {
                            LoadOutcome::Failed
                        };
                        c.complete(h, outcome);
                    }
                }
            }

            assert!(c.registry().len() <= identifiers.len());
            for sub in subs.iter_mut() {
                let before = sub.status();
                sub.poll();
                assert!(before.can_advance_to(sub.status()), "seed {seed}");
            }
        }

        // Everyone attached to a completed handle agrees with its marker.
        for sub in &subs {
            if let Some(marker) = sub.handle().and_then(|h| c.registry().status_marker(h)) {
                if marker.is_terminal() {
                    assert_eq!(sub.status(), marker, "seed {seed}");
                }
            }
        }
    }
}
