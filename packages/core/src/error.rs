// Типы ошибок протокола

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Entropy source or RSA backend failed; the device stays unusable until it recovers.
    #[error("Failed to generate keys: {0}")]
    KeyGeneration(String),
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    /// Outbound AEAD or key-wrap failure
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("Decryption failed: {0}")]
    Decryption(String),
    #[error("Authentication tag mismatch: {0}")]
    Authentication(String),
    /// Outer HMAC mismatch. Raised before any decryption is attempted.
    #[error("Signature verification failed: {0}")]
    Signature(String),
    #[error("Integrity check failed: {0}")]
    Integrity(String),
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("Key store error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ProtocolError {
    /// Stable snake_case name for logging and error mapping in transports
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::KeyGeneration(_) => "key_generation",
            ProtocolError::UnknownDevice(_) => "unknown_device",
            ProtocolError::Encryption(_) => "encryption",
            ProtocolError::Decryption(_) => "decryption",
            ProtocolError::Authentication(_) => "authentication",
            ProtocolError::Signature(_) => "signature",
            ProtocolError::Integrity(_) => "integrity",
            ProtocolError::MalformedEnvelope(_) => "malformed_envelope",
            ProtocolError::Storage(_) => "storage",
            ProtocolError::Serialization(_) => "serialization",
            ProtocolError::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<rand::Error> for ProtocolError {
    fn from(err: rand::Error) -> Self {
        ProtocolError::KeyGeneration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
