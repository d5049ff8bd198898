//! Unit tests for the session registry
//!
//! Covers atomic admission, idempotent release, and key independence.

use std::sync::Arc;

use claude_courier::registry::{SessionKey, SessionRegistry};

#[test]
fn second_acquire_fails_until_release() {
    let registry = SessionRegistry::new();
    let key = SessionKey::new("chan", "user");

    assert!(registry.try_acquire(&key));
    assert!(!registry.try_acquire(&key));

    assert!(registry.release(&key));
    assert!(registry.try_acquire(&key));
}

#[test]
fn release_is_idempotent() {
    let registry = SessionRegistry::new();
    let key = SessionKey::new("chan", "user");

    assert!(registry.try_acquire(&key));
    assert!(registry.release(&key));
    assert!(!registry.release(&key));
    assert!(registry.is_empty());
}

#[test]
fn distinct_keys_do_not_contend() {
    let registry = SessionRegistry::new();

    assert!(registry.try_acquire(&SessionKey::new("chan", "alice")));
    assert!(registry.try_acquire(&SessionKey::new("chan", "bob")));
    assert!(registry.try_acquire(&SessionKey::new("other", "alice")));

    assert_eq!(registry.len(), 3);
}

#[test]
fn key_derivation_is_deterministic() {
    let a = SessionKey::new("c1", "u1");
    let b = SessionKey::new("c1", "u1");
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "c1-u1");
}

#[tokio::test]
async fn concurrent_acquire_admits_exactly_one() {
    let registry = Arc::new(SessionRegistry::new());
    let key = SessionKey::new("chan", "user");

    let mut handles = Vec::new();
    for _ in 0..32 {
        let registry = Arc::clone(&registry);
        let key = key.clone();
        handles.push(tokio::spawn(async move { registry.try_acquire(&key) }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.expect("join") {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn active_keys_reflects_held_sessions() {
    let registry = SessionRegistry::new();
    let key = SessionKey::new("chan", "user");

    assert!(registry.active_keys().is_empty());
    registry.try_acquire(&key);
    assert_eq!(registry.active_keys(), vec![key.clone()]);

    registry.release(&key);
    assert!(registry.active_keys().is_empty());
}

#[test]
fn get_returns_none_before_a_process_is_bound() {
    let registry = SessionRegistry::new();
    let key = SessionKey::new("chan", "user");

    registry.try_acquire(&key);
    assert!(registry.get(&key).is_none());
}
