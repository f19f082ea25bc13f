// MILITARY: гибридное шифрование поверх ENHANCED
//
// 1. ENHANCED кадр открытого текста
// 2. одноразовый 256-битный сессионный ключ
// 3. AES-256-GCM (IV 16 байт) над ENHANCED кадром
// 4. RSA-OAEP сессионного ключа публичным ключом получателя
//
// Поля: wrapped_session_key(размер модуля) || iv(16) || tag(16) || ciphertext

use crate::crypto::codec::LevelCodec;
use crate::crypto::framing::{self, IV_SIZE, KEY_SIZE, TAG_SIZE};
use crate::crypto::keys::EncryptionKeys;
use crate::crypto::levels::enhanced::EnhancedCodec;
use crate::crypto::random_bytes;
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::EncryptionLevel;
use crate::utils::logging::RedactedBytes;
use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use tracing::trace;
use zeroize::Zeroizing;

/// AES-256-GCM с 128-битным IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

const FIELDS: usize = 4;

pub struct MilitaryCodec<'a> {
    inner: EnhancedCodec<'a>,
    recipient: &'a EncryptionKeys,
}

impl<'a> MilitaryCodec<'a> {
    pub fn new(inner: EnhancedCodec<'a>, recipient: &'a EncryptionKeys) -> Self {
        Self { inner, recipient }
    }

    fn outer_cipher(session_key: &[u8; KEY_SIZE]) -> Aes256Gcm16 {
        Aes256Gcm16::new(session_key.into())
    }
}

impl LevelCodec for MilitaryCodec<'_> {
    fn level(&self) -> EncryptionLevel {
        EncryptionLevel::Military
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut buffer = self.inner.encrypt(plaintext)?;

        let session_key = Zeroizing::new(random_bytes::<KEY_SIZE>()?);
        let iv = random_bytes::<IV_SIZE>()?;

        let tag = Self::outer_cipher(&session_key)
            .encrypt_in_place_detached(
                Nonce::<U16>::from_slice(&iv),
                &framing::header(EncryptionLevel::Military, FIELDS as u8),
                &mut buffer,
            )
            .map_err(|e| ProtocolError::Encryption(format!("MILITARY encryption failed: {}", e)))?;

        let wrapped_key = self.recipient.wrap_session_key(&*session_key)?;

        trace!(
            target: "crypto::levels",
            recipient = %self.recipient.device_id(),
            wrapped_key = %RedactedBytes(&wrapped_key),
            "MILITARY layer sealed"
        );

        Ok(framing::encode(
            EncryptionLevel::Military,
            &[&wrapped_key, &iv, tag.as_slice(), &buffer],
        ))
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let fields = framing::decode(data, EncryptionLevel::Military, FIELDS)?;
        let (wrapped_key, iv, tag, ciphertext) = (fields[0], fields[1], fields[2], fields[3]);
        framing::expect_len(wrapped_key, self.recipient.modulus_size(), "wrapped session key")?;
        framing::expect_len(iv, IV_SIZE, "iv")?;
        framing::expect_len(tag, TAG_SIZE, "tag")?;

        let unwrapped = self.recipient.unwrap_session_key(wrapped_key)?;
        let session_key: &[u8; KEY_SIZE] = unwrapped.as_slice().try_into().map_err(|_| {
            ProtocolError::Decryption(format!(
                "Session key must be {} bytes, got {}",
                KEY_SIZE,
                unwrapped.len()
            ))
        })?;

        let mut buffer = ciphertext.to_vec();
        Self::outer_cipher(session_key)
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                &framing::header(EncryptionLevel::Military, FIELDS as u8),
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| {
                ProtocolError::Authentication("MILITARY tag verification failed".to_string())
            })?;

        self.inner.decrypt(&buffer)
    }
}
