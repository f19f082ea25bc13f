//! Централизованная конфигурация протокола
//!
//! Все настраиваемые параметры протокола определены здесь.
//! Размеры полей wire-формата (nonce, tag, salt) настраиваемыми не являются:
//! они зафиксированы в `crypto::framing` и меняются только вместе с версией протокола.

use crate::error::{ProtocolError, Result};
use std::sync::OnceLock;
use std::time::Duration;

/// Глобальная конфигурация (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Минимальный допустимый размер RSA модуля (в битах)
pub const MIN_RSA_KEY_BITS: usize = 2048;

/// Верхняя граница интервала ротации (100 лет)
pub const MAX_ROTATION_INTERVAL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Основная структура конфигурации
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // ============================================
    // КЛЮЧИ
    // ============================================

    /// Интервал ротации ключей устройства.
    /// `expires_at = created_at + rotation_interval`
    pub rotation_interval: Duration,

    /// Размер RSA модуля для MILITARY уровня (в битах)
    pub rsa_key_bits: usize,

    /// Ротировать ли просроченные ключи автоматически при `encrypt_message`
    pub auto_rotate: bool,

    /// Длина key fingerprint (в hex символах)
    pub fingerprint_length: usize,

    // ============================================
    // BASIC УРОВЕНЬ
    // ============================================

    /// Максимальный возраст BASIC токена. `None` - без ограничения
    pub basic_token_ttl: Option<Duration>,

    /// Допустимое расхождение часов для timestamp в BASIC токене
    pub max_clock_skew: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(3600),
            rsa_key_bits: 4096,
            auto_rotate: true,
            fingerprint_length: 16,

            basic_token_ttl: None,
            max_clock_skew: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ROTATION_INTERVAL_SECS") {
            if let Ok(parsed) = val.parse() {
                config.rotation_interval = Duration::from_secs(parsed);
            }
        }

        if let Ok(val) = std::env::var("RSA_KEY_BITS") {
            if let Ok(parsed) = val.parse() {
                config.rsa_key_bits = parsed;
            }
        }

        if let Ok(val) = std::env::var("BASIC_TOKEN_TTL_SECS") {
            if let Ok(parsed) = val.parse() {
                config.basic_token_ttl = Some(Duration::from_secs(parsed));
            }
        }

        config
    }

    /// Проверить согласованность параметров
    pub fn validate(&self) -> Result<()> {
        if self.rsa_key_bits < MIN_RSA_KEY_BITS {
            return Err(ProtocolError::InvalidConfig(format!(
                "RSA modulus must be at least {} bits, got {}",
                MIN_RSA_KEY_BITS, self.rsa_key_bits
            )));
        }

        if self.rotation_interval > MAX_ROTATION_INTERVAL {
            return Err(ProtocolError::InvalidConfig(format!(
                "Rotation interval must be at most {} s, got {} s",
                MAX_ROTATION_INTERVAL.as_secs(),
                self.rotation_interval.as_secs()
            )));
        }

        // SHA-256 в hex = 64 символа
        if self.fingerprint_length == 0 || self.fingerprint_length > 64 {
            return Err(ProtocolError::InvalidConfig(format!(
                "Fingerprint length must be in 1..=64, got {}",
                self.fingerprint_length
            )));
        }

        Ok(())
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию со значениями по умолчанию
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init() -> Result<()> {
        Self::init_with(Self::default())
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    pub fn init_from_env() -> Result<()> {
        Self::init_with(Self::from_env())
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    pub fn init_with(config: Config) -> Result<()> {
        config.validate()?;
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| ProtocolError::InvalidConfig("Config already initialized".to_string()))
    }

    /// Проверить, инициализирована ли глобальная конфигурация
    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rotation_interval, Duration::from_secs(3600));
        assert_eq!(config.rsa_key_bits, 4096);
        assert_eq!(config.fingerprint_length, 16);
        assert!(config.auto_rotate);
        assert!(config.basic_token_ttl.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_small_modulus() {
        let config = Config {
            rsa_key_bits: 1024,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ProtocolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_fingerprint_length() {
        let too_long = Config {
            fingerprint_length: 65,
            ..Config::default()
        };
        assert!(too_long.validate().is_err());

        let empty = Config {
            fingerprint_length: 0,
            ..Config::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_validate_rotation_interval_upper_bound() {
        let at_limit = Config {
            rotation_interval: MAX_ROTATION_INTERVAL,
            ..Config::default()
        };
        assert!(at_limit.validate().is_ok());

        let overflowing = Config {
            rotation_interval: Duration::from_secs(10_000_000_000_000),
            ..Config::default()
        };
        assert!(matches!(
            overflowing.validate(),
            Err(ProtocolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_rotation_interval_is_valid() {
        let config = Config {
            rotation_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
