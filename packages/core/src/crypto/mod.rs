//! Криптографический модуль
//!
//! # Архитектура
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SecureProtocol (api::protocol)             │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//!          ▼                    ▼                     ▼
//! ┌─────────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │   KeyManager    │  │ SignatureService │  │    LevelCodec    │
//! │  - RSA + sym    │  │  - HMAC-SHA256   │  │  BASIC           │
//! │  - ротация      │  │  - fail fast     │  │  ENHANCED        │
//! └─────────────────┘  └──────────────────┘  │  MILITARY        │
//!          │                                 │  QUANTUM_SAFE    │
//!          ▼                                 └──────────────────┘
//! ┌─────────────────┐                                 │
//! │    KeyStore     │                                 ▼
//! └─────────────────┘                        ┌──────────────────┐
//!                                            │     framing      │
//!                                            └──────────────────┘
//! ```

/// LevelCodec trait
pub mod codec;

/// Версионированный кадр с length-prefixed полями
pub mod framing;

pub mod keys;

/// Реализации уровней
pub mod levels;

pub mod signature;

pub use codec::LevelCodec;
pub use keys::{EncryptionKeys, KeyManager};
pub use signature::SignatureService;

use crate::error::Result;
use rand::rngs::OsRng;
use rand_core::RngCore;

/// Случайные байты из OS RNG. Отказ источника энтропии - `KeyGeneration`
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}
