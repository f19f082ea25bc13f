//! Concurrent use of a shared key manager

mod common;

use common::{device_pair, fast_config, shared_manager, ALICE, BOB};
use ribit_secure_core::{EncryptionLevel, MessageType};
use std::sync::Arc;
use std::thread;

/// Racing rotate_if_due callers install exactly one new key set
#[test]
fn test_concurrent_rotation_installs_one_key_set() {
    let manager = shared_manager(fast_config());
    let original = manager.generate_keys(ALICE, "ribit").unwrap();

    // Ровно момент истечения: старый набор due, любой новый - нет
    let now = original.expires_at();
    assert!(original.is_rotation_due_at(now));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.rotate_if_due_at(ALICE, now).unwrap())
        })
        .collect();
    let rotated: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(rotated.iter().filter(|&&r| r).count(), 1, "{:?}", rotated);
    assert_ne!(manager.fingerprint(ALICE).unwrap(), original.fingerprint());
    assert_eq!(manager.loaded_count().unwrap(), 1);
}

/// Encrypt and decrypt in parallel against one loaded key set
#[test]
fn test_parallel_round_trips() {
    let (alice, bob) = device_pair(fast_config());
    let alice = Arc::new(alice);
    let bob = Arc::new(bob);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let alice = Arc::clone(&alice);
            let bob = Arc::clone(&bob);
            thread::spawn(move || {
                let level = EncryptionLevel::ALL[i % 4];
                let text = format!("status report {}", i);
                let envelope = alice
                    .encrypt_message(text.as_str(), BOB, MessageType::SystemStatus, level)
                    .unwrap();
                let message = bob.decrypt_message(envelope).unwrap();
                assert_eq!(message.content_str(), Some(text.as_str()));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
