// QUANTUM_SAFE: hash-commitment обертка над MILITARY
//
// Это НЕ постквантовая схема, а tamper-evidence заглушка:
//   hash1 = SHA-512(military_b64)
//   hash2 = SHA-512(hash1)
//   commitment = hex(hash2) ":" military_b64 ":" hex(hash1)

use crate::crypto::codec::LevelCodec;
use crate::crypto::framing;
use crate::crypto::levels::military::MilitaryCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::EncryptionLevel;
use crate::utils::b64;
use sha2::{Digest, Sha512};
use tracing::warn;

const SEPARATOR: char = ':';

pub struct QuantumSafeCodec<'a> {
    inner: MilitaryCodec<'a>,
}

impl<'a> QuantumSafeCodec<'a> {
    pub fn new(inner: MilitaryCodec<'a>) -> Self {
        Self { inner }
    }
}

fn hash_chain(military_b64: &str) -> (String, String) {
    let hash1 = Sha512::digest(military_b64.as_bytes());
    let hash2 = Sha512::digest(hash1);
    (hex::encode(hash1), hex::encode(hash2))
}

impl LevelCodec for QuantumSafeCodec<'_> {
    fn level(&self) -> EncryptionLevel {
        EncryptionLevel::QuantumSafe
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let military_b64 = b64::encode(&self.inner.encrypt(plaintext)?);
        let (hash1, hash2) = hash_chain(&military_b64);
        let commitment = format!("{hash2}{SEPARATOR}{military_b64}{SEPARATOR}{hash1}");

        Ok(framing::encode(
            EncryptionLevel::QuantumSafe,
            &[commitment.as_bytes()],
        ))
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let fields = framing::decode(data, EncryptionLevel::QuantumSafe, 1)?;
        let commitment = std::str::from_utf8(fields[0])
            .map_err(|_| ProtocolError::Integrity("Commitment is not valid UTF-8".to_string()))?;

        let mut parts = commitment.splitn(3, SEPARATOR);
        let (Some(claimed_hash2), Some(military_b64), Some(claimed_hash1)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ProtocolError::Integrity(
                "Commitment must have three parts".to_string(),
            ));
        };

        let (hash1, hash2) = hash_chain(military_b64);
        if !claimed_hash1.eq_ignore_ascii_case(&hash1) || !claimed_hash2.eq_ignore_ascii_case(&hash2) {
            warn!(target: "crypto::levels", "QUANTUM_SAFE hash chain mismatch");
            return Err(ProtocolError::Integrity("Hash chain mismatch".to_string()));
        }

        let military = b64::decode(military_b64).map_err(ProtocolError::Decryption)?;
        self.inner.decrypt(&military)
    }
}
