// BASIC: одноключевое AEAD шифрование с встроенным timestamp
//
// ChaCha20-Poly1305 под симметричным ключом устройства.
// Поля: timestamp(8, u64 BE) || nonce(12) || ciphertext+tag
// Заголовок кадра и timestamp аутентифицируются как associated data.

use crate::config::Config;
use crate::crypto::codec::LevelCodec;
use crate::crypto::framing::{self, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::crypto::random_bytes;
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::EncryptionLevel;
use crate::utils::time;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use std::time::Duration;

const FIELDS: usize = 3;

pub struct BasicCodec<'a> {
    key: &'a [u8; KEY_SIZE],
    ttl: Option<Duration>,
    max_clock_skew: Duration,
}

impl<'a> BasicCodec<'a> {
    pub fn new(key: &'a [u8; KEY_SIZE], config: &Config) -> Self {
        Self {
            key,
            ttl: config.basic_token_ttl,
            max_clock_skew: config.max_clock_skew,
        }
    }

    fn associated_data(timestamp: &[u8]) -> Vec<u8> {
        let mut aad = framing::header(EncryptionLevel::Basic, FIELDS as u8).to_vec();
        aad.extend_from_slice(timestamp);
        aad
    }

    fn encrypt_at(&self, plaintext: &[u8], now: u64) -> Result<Vec<u8>> {
        let timestamp = now.to_be_bytes();
        let nonce = random_bytes::<NONCE_SIZE>()?;
        let aad = Self::associated_data(&timestamp);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.key));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|e| ProtocolError::Encryption(format!("BASIC encryption failed: {}", e)))?;

        Ok(framing::encode(
            EncryptionLevel::Basic,
            &[&timestamp, &nonce, &ciphertext],
        ))
    }

    fn decrypt_at(&self, data: &[u8], now: u64) -> Result<Vec<u8>> {
        let fields = framing::decode(data, EncryptionLevel::Basic, FIELDS)?;
        let (timestamp, nonce, ciphertext) = (fields[0], fields[1], fields[2]);
        framing::expect_len(timestamp, 8, "timestamp")?;
        framing::expect_len(nonce, NONCE_SIZE, "nonce")?;
        if ciphertext.len() < TAG_SIZE {
            return Err(ProtocolError::Decryption(
                "BASIC token shorter than authentication tag".to_string(),
            ));
        }

        let aad = Self::associated_data(timestamp);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.key));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| ProtocolError::Decryption("BASIC token failed authentication".to_string()))?;

        let issued_at = u64::from_be_bytes([
            timestamp[0], timestamp[1], timestamp[2], timestamp[3],
            timestamp[4], timestamp[5], timestamp[6], timestamp[7],
        ]);

        if issued_at > now.saturating_add(self.max_clock_skew.as_secs()) {
            return Err(ProtocolError::Decryption(
                "BASIC token timestamp is in the future".to_string(),
            ));
        }
        if let Some(ttl) = self.ttl {
            if now.saturating_sub(issued_at) > ttl.as_secs() {
                return Err(ProtocolError::Decryption("BASIC token expired".to_string()));
            }
        }

        Ok(plaintext)
    }
}

impl LevelCodec for BasicCodec<'_> {
    fn level(&self) -> EncryptionLevel {
        EncryptionLevel::Basic
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_at(plaintext, unix_now())
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_at(data, unix_now())
    }
}

fn unix_now() -> u64 {
    time::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_SIZE] = [3u8; KEY_SIZE];

    #[test]
    fn test_round_trip() {
        let codec = BasicCodec::new(&KEY, &Config::default());
        for plaintext in [&b""[..], b"hello", "Привет 🤖".as_bytes()] {
            let token = codec.encrypt(plaintext).unwrap();
            assert_eq!(codec.decrypt(&token).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_fresh_nonce_per_message() {
        let codec = BasicCodec::new(&KEY, &Config::default());
        assert_ne!(codec.encrypt(b"same").unwrap(), codec.encrypt(b"same").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = BasicCodec::new(&KEY, &Config::default()).encrypt(b"secret").unwrap();
        let other = [4u8; KEY_SIZE];
        let result = BasicCodec::new(&other, &Config::default()).decrypt(&token);
        assert!(matches!(result, Err(ProtocolError::Decryption(_))));
    }

    #[test]
    fn test_tampered_timestamp_fails() {
        let codec = BasicCodec::new(&KEY, &Config::default());
        let mut token = codec.encrypt(b"secret").unwrap();
        // header(3) + len(4) + последний байт timestamp
        token[3 + 4 + 7] ^= 0x01;
        assert!(codec.decrypt(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let config = Config {
            basic_token_ttl: Some(Duration::from_secs(30)),
            ..Config::default()
        };
        let codec = BasicCodec::new(&KEY, &config);
        let token = codec.encrypt_at(b"secret", 1_000).unwrap();

        assert!(codec.decrypt_at(&token, 1_030).is_ok());
        assert!(matches!(
            codec.decrypt_at(&token, 1_031),
            Err(ProtocolError::Decryption(_))
        ));
    }

    #[test]
    fn test_future_token_rejected() {
        let codec = BasicCodec::new(&KEY, &Config::default());
        let token = codec.encrypt_at(b"secret", 10_000).unwrap();

        assert!(codec.decrypt_at(&token, 10_000 - 60).is_ok());
        assert!(codec.decrypt_at(&token, 10_000 - 61).is_err());
    }
}
