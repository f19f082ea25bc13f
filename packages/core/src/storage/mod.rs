// Хранилище ключей
//
// Таблица активных key-set по device_id. Бэкенд подключаемый:
// in-memory для тестов и одиночного процесса, внешний secret store - через свою реализацию `KeyStore`.

pub mod memory;

use crate::crypto::keys::EncryptionKeys;
use crate::error::Result;
use std::sync::Arc;

pub use memory::MemoryKeyStore;

/// Бэкенд хранения активных key-set.
///
/// Ровно один активный key-set на устройство: `put` заменяет предыдущий
/// и возвращает его (superseded).
pub trait KeyStore: Send + Sync {
    /// Активный key-set устройства
    fn get(&self, device_id: &str) -> Result<Option<Arc<EncryptionKeys>>>;

    /// Установить key-set как активный, вернуть вытесненный
    fn put(&self, keys: Arc<EncryptionKeys>) -> Result<Option<Arc<EncryptionKeys>>>;

    /// Удалить key-set устройства
    fn remove(&self, device_id: &str) -> Result<Option<Arc<EncryptionKeys>>>;

    /// Количество загруженных key-set
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
