// ENHANCED: ключ на каждое сообщение через HKDF + AES-256-GCM
//
// Поля: salt(32) || nonce(12) || tag(16) || ciphertext

use crate::crypto::codec::LevelCodec;
use crate::crypto::framing::{self, KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::crypto::random_bytes;
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::EncryptionLevel;
use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use hkdf::Hkdf;
use sha2::Sha256;
use tracing::trace;
use zeroize::Zeroizing;

/// HKDF context label. Changing it is a protocol version change
pub const CONTEXT_LABEL: &[u8] = b"ribit-enhanced-level-v1";

const FIELDS: usize = 4;

pub struct EnhancedCodec<'a> {
    key: &'a [u8; KEY_SIZE],
}

impl<'a> EnhancedCodec<'a> {
    pub fn new(key: &'a [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    fn message_key(&self, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        let hkdf = Hkdf::<Sha256>::new(Some(salt), self.key);
        let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
        hkdf.expand(CONTEXT_LABEL, &mut *okm)
            .map_err(|e| ProtocolError::KeyGeneration(format!("Key derivation failed: {}", e)))?;
        Ok(okm)
    }

    fn cipher(&self, salt: &[u8]) -> Result<Aes256Gcm> {
        let key = self.message_key(salt)?;
        Ok(Aes256Gcm::new((&*key).into()))
    }
}

impl LevelCodec for EnhancedCodec<'_> {
    fn level(&self) -> EncryptionLevel {
        EncryptionLevel::Enhanced
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let salt = random_bytes::<SALT_SIZE>()?;
        let nonce = random_bytes::<NONCE_SIZE>()?;
        let cipher = self.cipher(&salt)?;

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(
                Nonce::from_slice(&nonce),
                &framing::header(EncryptionLevel::Enhanced, FIELDS as u8),
                &mut buffer,
            )
            .map_err(|e| ProtocolError::Encryption(format!("ENHANCED encryption failed: {}", e)))?;

        trace!(
            target: "crypto::levels",
            plaintext_len = plaintext.len(),
            "ENHANCED layer sealed"
        );

        Ok(framing::encode(
            EncryptionLevel::Enhanced,
            &[&salt, &nonce, tag.as_slice(), &buffer],
        ))
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let fields = framing::decode(data, EncryptionLevel::Enhanced, FIELDS)?;
        let (salt, nonce, tag, ciphertext) = (fields[0], fields[1], fields[2], fields[3]);
        framing::expect_len(salt, SALT_SIZE, "salt")?;
        framing::expect_len(nonce, NONCE_SIZE, "nonce")?;
        framing::expect_len(tag, TAG_SIZE, "tag")?;

        let cipher = self.cipher(salt)?;
        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce),
                &framing::header(EncryptionLevel::Enhanced, FIELDS as u8),
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| {
                ProtocolError::Authentication("ENHANCED tag verification failed".to_string())
            })?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_SIZE] = [5u8; KEY_SIZE];

    // header(3) + 4 * len(4)
    const OVERHEAD: usize = 3 + 16 + SALT_SIZE + NONCE_SIZE + TAG_SIZE;

    #[test]
    fn test_round_trip() {
        let codec = EnhancedCodec::new(&KEY);
        for plaintext in [&b""[..], b"status: ok", "Hello from Ribit 2.0! 🤖".as_bytes()] {
            let frame = codec.encrypt(plaintext).unwrap();
            assert_eq!(frame.len(), OVERHEAD + plaintext.len());
            assert_eq!(codec.decrypt(&frame).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_fresh_salt_gives_fresh_key() {
        let codec = EnhancedCodec::new(&KEY);
        let first = codec.message_key(&[1u8; SALT_SIZE]).unwrap();
        let second = codec.message_key(&[2u8; SALT_SIZE]).unwrap();
        assert_ne!(*first, *second);
        assert_eq!(*first, *codec.message_key(&[1u8; SALT_SIZE]).unwrap());
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let codec = EnhancedCodec::new(&KEY);
        let mut frame = codec.encrypt(b"launch sequence").unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0x80;
        assert!(matches!(
            codec.decrypt(&frame),
            Err(ProtocolError::Authentication(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let frame = EnhancedCodec::new(&KEY).encrypt(b"secret").unwrap();
        let other = [6u8; KEY_SIZE];
        assert!(matches!(
            EnhancedCodec::new(&other).decrypt(&frame),
            Err(ProtocolError::Authentication(_))
        ));
    }

    #[test]
    fn test_rejects_basic_frame() {
        let frame = framing::encode(EncryptionLevel::Basic, &[b"a", b"b", b"c"]);
        assert!(matches!(
            EnhancedCodec::new(&KEY).decrypt(&frame),
            Err(ProtocolError::Decryption(_))
        ));
    }
}
