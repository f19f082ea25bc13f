// Протокол: конверт и его wire-форматы

pub mod envelope;
pub mod wire;

pub use envelope::{EncryptionLevel, MessageEnvelope, MessageType, SecureMessage};
