// Ribit Secure Core
// Многоуровневое end-to-end шифрование сообщений между устройствами Ribit

#![warn(clippy::all)]

// Модули
pub mod api;
pub mod config;
pub mod crypto;
pub mod protocol;
pub mod storage;
pub mod utils;
pub mod error;

// Re-exports для удобства
pub use api::{ProtocolStatus, SecureProtocol};
pub use config::Config;
pub use crypto::keys::{EncryptionKeys, KeyManager};
pub use error::{ProtocolError, Result};
pub use protocol::{EncryptionLevel, MessageEnvelope, MessageType, SecureMessage};
pub use storage::{KeyStore, MemoryKeyStore};
pub use utils::logging::init_logging;
