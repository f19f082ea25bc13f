//! Shared fixtures for integration tests

#![allow(dead_code)]

use ribit_secure_core::{Config, KeyManager, MemoryKeyStore, SecureProtocol};
use std::sync::Arc;
use std::time::Duration;

pub const ALICE: &str = "ribit_device_1";
pub const BOB: &str = "bob_device_1";

/// Smallest modulus the config accepts, keeps key generation fast
pub fn fast_config() -> Config {
    Config {
        rsa_key_bits: 2048,
        ..Config::default()
    }
}

/// Every key set is due the moment it is created
pub fn expiring_config() -> Config {
    Config {
        rotation_interval: Duration::ZERO,
        auto_rotate: false,
        ..fast_config()
    }
}

pub fn shared_manager(config: Config) -> Arc<KeyManager> {
    Arc::new(KeyManager::new(Arc::new(MemoryKeyStore::new()), config).unwrap())
}

/// Two devices sharing one key store
pub fn device_pair(config: Config) -> (SecureProtocol, SecureProtocol) {
    let manager = shared_manager(config);
    let alice = SecureProtocol::new(ALICE, "ribit", Arc::clone(&manager)).unwrap();
    let bob = SecureProtocol::new(BOB, "bob", manager).unwrap();
    (alice, bob)
}
