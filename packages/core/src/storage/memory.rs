// In-memory хранилище ключей

use crate::crypto::keys::EncryptionKeys;
use crate::error::{ProtocolError, Result};
use crate::storage::KeyStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory хранилище под RwLock.
///
/// Key-set неизменяемы и раздаются через `Arc`, поэтому параллельные
/// encrypt/decrypt держат блокировку только на время поиска.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, Arc<EncryptionKeys>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Идентификаторы устройств с загруженными ключами
    pub fn device_ids(&self) -> Result<Vec<String>> {
        let keys = self.keys.read().map_err(|_| poisoned())?;
        let mut ids: Vec<String> = keys.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, device_id: &str) -> Result<Option<Arc<EncryptionKeys>>> {
        let keys = self.keys.read().map_err(|_| poisoned())?;
        Ok(keys.get(device_id).cloned())
    }

    fn put(&self, keys: Arc<EncryptionKeys>) -> Result<Option<Arc<EncryptionKeys>>> {
        let mut table = self.keys.write().map_err(|_| poisoned())?;
        Ok(table.insert(keys.device_id().to_string(), keys))
    }

    fn remove(&self, device_id: &str) -> Result<Option<Arc<EncryptionKeys>>> {
        let mut table = self.keys.write().map_err(|_| poisoned())?;
        Ok(table.remove(device_id))
    }

    fn len(&self) -> Result<usize> {
        let keys = self.keys.read().map_err(|_| poisoned())?;
        Ok(keys.len())
    }
}

fn poisoned() -> ProtocolError {
    ProtocolError::Storage("key table lock poisoned".to_string())
}
