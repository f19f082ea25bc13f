//! Outer message authentication.
//!
//! HMAC-SHA256 over the encoded `encrypted_content` string, keyed with the
//! sender's device symmetric key. Checked before any decryption layer runs.

use crate::crypto::framing::KEY_SIZE;
use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::trace;

type HmacSha256 = Hmac<Sha256>;

pub struct SignatureService;

impl SignatureService {
    /// Hex HMAC tag over `ciphertext`
    pub fn sign(ciphertext: &str, key: &[u8; KEY_SIZE]) -> String {
        let mut mac = Self::mac(key);
        mac.update(ciphertext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of a hex tag. Malformed hex is a mismatch.
    pub fn verify(ciphertext: &str, tag: &str, key: &[u8; KEY_SIZE]) -> bool {
        let Ok(expected) = hex::decode(tag) else {
            trace!(target: "crypto::signature", "Signature is not valid hex");
            return false;
        };

        let mut mac = Self::mac(key);
        mac.update(ciphertext.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn mac(key: &[u8; KEY_SIZE]) -> HmacSha256 {
        // Ключ короче блока SHA-256 (64 байта) HMAC дополняет нулями, результат тот же
        let mut block = Key::<HmacSha256>::default();
        block[..KEY_SIZE].copy_from_slice(key);
        <HmacSha256 as KeyInit>::new(&block)
    }
}
