// Высокоуровневый API протокола
//
// Единственная публичная поверхность для транспорта:
// encrypt_message / decrypt_message / get_status

use crate::config::Config;
use crate::crypto::framing::PROTOCOL_VERSION;
use crate::crypto::keys::{EncryptionKeys, KeyManager};
use crate::crypto::levels::codec_for;
use crate::crypto::random_bytes;
use crate::crypto::signature::SignatureService;
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::{EncryptionLevel, MessageEnvelope, MessageType, SecureMessage};
use crate::protocol::wire;
use crate::storage::KeyStore;
use crate::utils::{b64, time};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Снимок состояния протокола для диагностики
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolStatus {
    pub device_id: String,
    pub protocol_version: u8,
    /// Источник энтропии доступен
    pub backend_available: bool,
    pub loaded_key_sets: usize,
    pub rotation_due: bool,
    pub key_fingerprint: Option<String>,
    pub supported_levels: Vec<EncryptionLevel>,
    pub supported_message_types: Vec<MessageType>,
}

/// Протокол одного устройства.
///
/// Несколько экземпляров с общим `KeyManager` моделируют несколько устройств
/// одного процесса: ключи получателя ищутся в том же хранилище.
pub struct SecureProtocol {
    device_id: String,
    key_manager: Arc<KeyManager>,
}

impl SecureProtocol {
    /// Создать протокол для устройства, сгенерировав ключи при их отсутствии
    pub fn new(device_id: &str, user_id: &str, key_manager: Arc<KeyManager>) -> Result<Self> {
        let keys = key_manager.ensure_keys(device_id, user_id)?;

        info!(
            target: "protocol::facade",
            device_id = %device_id,
            fingerprint = %keys.fingerprint(),
            "Secure protocol initialized"
        );

        Ok(Self {
            device_id: device_id.to_string(),
            key_manager,
        })
    }

    /// Создать протокол со своим `KeyManager` поверх хранилища
    pub fn with_config(
        device_id: &str,
        user_id: &str,
        store: Arc<dyn KeyStore>,
        config: Config,
    ) -> Result<Self> {
        let key_manager = Arc::new(KeyManager::new(store, config)?);
        Self::new(device_id, user_id, key_manager)
    }

    /// То же, с глобальной конфигурацией
    pub fn with_store(device_id: &str, user_id: &str, store: Arc<dyn KeyStore>) -> Result<Self> {
        Self::with_config(device_id, user_id, store, Config::global().clone())
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn key_manager(&self) -> &Arc<KeyManager> {
        &self.key_manager
    }

    /// Зашифровать сообщение для устройства получателя.
    ///
    /// Единственный побочный эффект - возможная ротация собственных ключей.
    pub fn encrypt_message(
        &self,
        content: impl Into<serde_json::Value>,
        recipient_device_id: &str,
        message_type: MessageType,
        encryption_level: EncryptionLevel,
    ) -> Result<MessageEnvelope> {
        let content = content.into();
        let sender_keys = self.current_keys()?;

        let recipient_keys = if encryption_level.requires_recipient_keys() {
            Some(self.key_manager.get_active_keys(recipient_device_id)?)
        } else {
            None
        };

        let timestamp = time::current_timestamp();
        let payload = wire::encode_payload(&SecureMessage {
            content,
            message_type,
            timestamp,
            sender: self.device_id.clone(),
        })?;

        let codec = codec_for(
            encryption_level,
            &sender_keys,
            recipient_keys.as_deref(),
            self.key_manager.config(),
        )?;
        let encrypted_content = b64::encode(&codec.encrypt(&payload)?);
        let signature = SignatureService::sign(&encrypted_content, sender_keys.symmetric_key());

        debug!(
            target: "protocol::facade",
            recipient = %recipient_device_id,
            level = %encryption_level,
            message_type = %message_type,
            payload_len = payload.len(),
            encoded_len = encrypted_content.len(),
            "Message encrypted"
        );

        Ok(MessageEnvelope {
            encrypted_content,
            message_type,
            encryption_level,
            sender_device_id: self.device_id.clone(),
            recipient_device_id: recipient_device_id.to_string(),
            timestamp,
            signature,
            key_fingerprint: sender_keys.fingerprint().to_string(),
        })
    }

    /// Зашифровать структурированный payload (команды, статус)
    pub fn encrypt_json<T: Serialize>(
        &self,
        content: &T,
        recipient_device_id: &str,
        message_type: MessageType,
        encryption_level: EncryptionLevel,
    ) -> Result<MessageEnvelope> {
        let value = serde_json::to_value(content)
            .map_err(|e| ProtocolError::Serialization(format!("Content encode error: {}", e)))?;
        self.encrypt_message(value, recipient_device_id, message_type, encryption_level)
    }

    /// Расшифровать конверт.
    ///
    /// Подпись проверяется до любой расшифровки. Результат либо полный, либо ошибка.
    pub fn decrypt_message(&self, envelope: MessageEnvelope) -> Result<SecureMessage> {
        let sender_keys = self.key_manager.get_active_keys(&envelope.sender_device_id)?;

        if envelope.key_fingerprint != sender_keys.fingerprint() {
            warn!(
                target: "protocol::facade",
                sender = %envelope.sender_device_id,
                envelope_fingerprint = %envelope.key_fingerprint,
                active_fingerprint = %sender_keys.fingerprint(),
                "Envelope was sealed under a key set that is no longer active"
            );
        }

        if !SignatureService::verify(
            &envelope.encrypted_content,
            &envelope.signature,
            sender_keys.symmetric_key(),
        ) {
            warn!(
                target: "protocol::facade",
                sender = %envelope.sender_device_id,
                level = %envelope.encryption_level,
                "Envelope signature rejected"
            );
            return Err(ProtocolError::Signature(format!(
                "envelope from {} failed verification",
                envelope.sender_device_id
            )));
        }

        let recipient_keys = self.recipient_keys_for(&envelope)?;
        let codec = codec_for(
            envelope.encryption_level,
            &sender_keys,
            recipient_keys.as_deref(),
            self.key_manager.config(),
        )?;

        let data = b64::decode(&envelope.encrypted_content).map_err(ProtocolError::MalformedEnvelope)?;
        let plaintext = codec.decrypt(&data)?;
        let message = wire::decode_payload(&plaintext)?;

        if message.sender != envelope.sender_device_id {
            return Err(ProtocolError::MalformedEnvelope(format!(
                "payload sender {} does not match envelope sender {}",
                message.sender, envelope.sender_device_id
            )));
        }
        if message.message_type != envelope.message_type {
            return Err(ProtocolError::MalformedEnvelope(format!(
                "payload type {} does not match envelope type {}",
                message.message_type, envelope.message_type
            )));
        }

        debug!(
            target: "protocol::facade",
            sender = %envelope.sender_device_id,
            level = %envelope.encryption_level,
            "Message decrypted"
        );

        Ok(message)
    }

    /// Диагностика. Не изменяет состояние
    pub fn get_status(&self) -> ProtocolStatus {
        let keys = self.key_manager.get_active_keys(&self.device_id).ok();

        ProtocolStatus {
            device_id: self.device_id.clone(),
            protocol_version: PROTOCOL_VERSION,
            backend_available: random_bytes::<16>().is_ok(),
            loaded_key_sets: self.key_manager.loaded_count().unwrap_or(0),
            rotation_due: keys.as_ref().map_or(false, |k| k.is_rotation_due()),
            key_fingerprint: keys.map(|k| k.fingerprint().to_string()),
            supported_levels: EncryptionLevel::ALL.to_vec(),
            supported_message_types: MessageType::ALL.to_vec(),
        }
    }

    /// Принудительная ротация ключей этого устройства
    pub fn rotate_keys(&self) -> Result<String> {
        let keys = self.key_manager.rotate(&self.device_id)?;
        Ok(keys.fingerprint().to_string())
    }

    fn current_keys(&self) -> Result<Arc<EncryptionKeys>> {
        if self.key_manager.config().auto_rotate && self.key_manager.rotate_if_due(&self.device_id)? {
            info!(
                target: "protocol::facade",
                device_id = %self.device_id,
                "Keys rotated before encryption"
            );
        }
        self.key_manager.get_active_keys(&self.device_id)
    }

    fn recipient_keys_for(&self, envelope: &MessageEnvelope) -> Result<Option<Arc<EncryptionKeys>>> {
        if !envelope.encryption_level.requires_recipient_keys() {
            return Ok(None);
        }
        self.key_manager
            .get_active_keys(&envelope.recipient_device_id)
            .map(Some)
    }
}
