// Управление ключами устройств
// Генерация, хранение и ротация RSA пары + симметричного ключа

use crate::config::Config;
use crate::crypto::framing::KEY_SIZE;
use crate::error::{ProtocolError, Result};
use crate::storage::KeyStore;
use crate::utils::time;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand_core::RngCore;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Активный набор ключей устройства.
///
/// Неизменяемый: ротация создает новый экземпляр, а не мутирует этот.
/// Приватный RSA ключ наружу не отдается - только операция `unwrap_session_key`.
pub struct EncryptionKeys {
    device_id: String,
    user_id: String,
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
    symmetric_key: Zeroizing<[u8; KEY_SIZE]>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    fingerprint: String,
}

impl EncryptionKeys {
    /// Сгенерировать новый набор: RSA пара `config.rsa_key_bits` + 256-битный ключ
    pub fn generate(device_id: &str, user_id: &str, config: &Config) -> Result<Self> {
        let mut symmetric_key = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.try_fill_bytes(&mut *symmetric_key)?;

        let private_key = RsaPrivateKey::new(&mut OsRng, config.rsa_key_bits)
            .map_err(|e| ProtocolError::KeyGeneration(format!("RSA key generation failed: {}", e)))?;

        Self::from_parts(device_id, user_id, private_key, symmetric_key, time::now(), config)
    }

    pub(crate) fn from_parts(
        device_id: &str,
        user_id: &str,
        private_key: RsaPrivateKey,
        symmetric_key: Zeroizing<[u8; KEY_SIZE]>,
        created_at: DateTime<Utc>,
        config: &Config,
    ) -> Result<Self> {
        let lifetime = chrono::Duration::from_std(config.rotation_interval)
            .map_err(|e| ProtocolError::InvalidConfig(format!("Rotation interval out of range: {}", e)))?;
        let expires_at = created_at.checked_add_signed(lifetime).ok_or_else(|| {
            ProtocolError::InvalidConfig("Rotation interval overflows key expiry".to_string())
        })?;
        let public_key = RsaPublicKey::from(&private_key);
        let fingerprint = compute_fingerprint(&public_key, config.fingerprint_length)?;

        Ok(Self {
            device_id: device_id.to_string(),
            user_id: user_id.to_string(),
            public_key,
            private_key,
            symmetric_key,
            created_at,
            expires_at,
            fingerprint,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Короткий hex SHA-256 от SPKI DER публичного ключа
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Размер RSA модуля в байтах (= размер блока OAEP)
    pub fn modulus_size(&self) -> usize {
        self.public_key.size()
    }

    /// PEM публичного ключа для внешнего каталога устройств
    pub fn public_key_pem(&self) -> Result<String> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| ProtocolError::Serialization(format!("Public key PEM encode error: {}", e)))
    }

    /// Срок ротации наступил (`now >= expires_at`). Это флаг, не переход состояния
    pub fn is_rotation_due(&self) -> bool {
        self.is_rotation_due_at(time::now())
    }

    pub fn is_rotation_due_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub(crate) fn symmetric_key(&self) -> &[u8; KEY_SIZE] {
        &self.symmetric_key
    }

    /// RSA-OAEP(SHA-256) шифрование одноразового сессионного ключа
    pub fn wrap_session_key(&self, session_key: &[u8]) -> Result<Vec<u8>> {
        self.public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), session_key)
            .map_err(|e| ProtocolError::Encryption(format!("Session key wrap failed: {}", e)))
    }

    pub(crate) fn unwrap_session_key(&self, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|e| ProtocolError::Decryption(format!("Session key unwrap failed: {}", e)))
    }
}

impl fmt::Debug for EncryptionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeys")
            .field("device_id", &self.device_id)
            .field("user_id", &self.user_id)
            .field("fingerprint", &self.fingerprint)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

fn compute_fingerprint(public_key: &RsaPublicKey, length: usize) -> Result<String> {
    let der = public_key
        .to_public_key_der()
        .map_err(|e| ProtocolError::KeyGeneration(format!("Public key DER encode error: {}", e)))?;
    let mut digest = hex::encode(Sha256::digest(der.as_bytes()));
    digest.truncate(length);
    Ok(digest)
}

/// Менеджер ключей устройств.
///
/// Чтение ключей не блокирует друг друга; ротация и генерация сериализуются
/// через отдельный мьютекс на каждое устройство.
pub struct KeyManager {
    store: Arc<dyn KeyStore>,
    config: Config,
    device_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyManager {
    /// Создать менеджер поверх хранилища
    pub fn new(store: Arc<dyn KeyStore>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            device_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    /// Сгенерировать и установить новый активный key-set.
    ///
    /// Существующий key-set устройства вытесняется.
    pub fn generate_keys(&self, device_id: &str, user_id: &str) -> Result<Arc<EncryptionKeys>> {
        let lock = self.device_lock(device_id)?;
        let _guard = lock.lock().map_err(|_| lock_poisoned(device_id))?;
        self.install(device_id, user_id)
    }

    /// Активные ключи устройства, при отсутствии - сгенерировать
    pub fn ensure_keys(&self, device_id: &str, user_id: &str) -> Result<Arc<EncryptionKeys>> {
        if let Some(keys) = self.store.get(device_id)? {
            return Ok(keys);
        }

        let lock = self.device_lock(device_id)?;
        let _guard = lock.lock().map_err(|_| lock_poisoned(device_id))?;
        // Другой поток мог успеть сгенерировать ключи
        match self.store.get(device_id)? {
            Some(keys) => Ok(keys),
            None => self.install(device_id, user_id),
        }
    }

    /// Получить активные ключи
    ///
    /// # Errors
    ///
    /// `UnknownDevice` - ключей нет, их нужно сгенерировать
    pub fn get_active_keys(&self, device_id: &str) -> Result<Arc<EncryptionKeys>> {
        self.store
            .get(device_id)?
            .ok_or_else(|| ProtocolError::UnknownDevice(device_id.to_string()))
    }

    pub fn is_rotation_due(&self, device_id: &str) -> Result<bool> {
        Ok(self.get_active_keys(device_id)?.is_rotation_due())
    }

    /// Ротация: новый key-set вытесняет старый. Периода перекрытия нет
    pub fn rotate(&self, device_id: &str) -> Result<Arc<EncryptionKeys>> {
        let lock = self.device_lock(device_id)?;
        let _guard = lock.lock().map_err(|_| lock_poisoned(device_id))?;
        let current = self.get_active_keys(device_id)?;
        self.install(device_id, current.user_id())
    }

    /// Ротировать, если срок наступил. Возвращает `true`, если ротация была выполнена
    pub fn rotate_if_due(&self, device_id: &str) -> Result<bool> {
        self.rotate_if_due_at(device_id, time::now())
    }

    /// То же относительно заданного момента `now`
    pub fn rotate_if_due_at(&self, device_id: &str, now: DateTime<Utc>) -> Result<bool> {
        if !self.get_active_keys(device_id)?.is_rotation_due_at(now) {
            return Ok(false);
        }

        let lock = self.device_lock(device_id)?;
        let _guard = lock.lock().map_err(|_| lock_poisoned(device_id))?;
        // Повторная проверка под блокировкой: конкурент мог уже ротировать
        let current = self.get_active_keys(device_id)?;
        if !current.is_rotation_due_at(now) {
            return Ok(false);
        }

        self.install(device_id, current.user_id())?;
        Ok(true)
    }

    pub fn fingerprint(&self, device_id: &str) -> Result<String> {
        Ok(self.get_active_keys(device_id)?.fingerprint().to_string())
    }

    /// Количество загруженных key-set
    pub fn loaded_count(&self) -> Result<usize> {
        self.store.len()
    }

    /// Генерация + установка. Вызывать только под блокировкой устройства
    fn install(&self, device_id: &str, user_id: &str) -> Result<Arc<EncryptionKeys>> {
        debug!(
            target: "crypto::keys",
            device_id = %device_id,
            rsa_bits = self.config.rsa_key_bits,
            "Generating key set"
        );

        let keys = Arc::new(EncryptionKeys::generate(device_id, user_id, &self.config)?);
        let superseded = self.store.put(keys.clone())?;

        match superseded {
            Some(old) => info!(
                target: "crypto::keys",
                device_id = %device_id,
                old_fingerprint = %old.fingerprint(),
                new_fingerprint = %keys.fingerprint(),
                "Key set rotated"
            ),
            None => info!(
                target: "crypto::keys",
                device_id = %device_id,
                fingerprint = %keys.fingerprint(),
                "Key set created"
            ),
        }

        Ok(keys)
    }

    fn device_lock(&self, device_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .device_locks
            .lock()
            .map_err(|_| ProtocolError::Storage("device lock table poisoned".to_string()))?;
        Ok(locks
            .entry(device_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}

fn lock_poisoned(device_id: &str) -> ProtocolError {
    ProtocolError::Storage(format!("rotation lock poisoned for device {}", device_id))
}
