//! Уровни шифрования (LevelCodec реализации)
//!
//! | Level        | Конструкция                                   |
//! |--------------|-----------------------------------------------|
//! | BASIC        | ChaCha20-Poly1305 + timestamp                 |
//! | ENHANCED     | HKDF-SHA256 per-message key + AES-256-GCM     |
//! | MILITARY     | RSA-OAEP session key + AES-256-GCM(ENHANCED)  |
//! | QUANTUM_SAFE | SHA-512 hash chain над MILITARY               |
//!
//! Размеры полей зашиты в конструкции; смена шифра или размера ключа -
//! новая версия протокола (`framing::PROTOCOL_VERSION`).

pub mod basic;
pub mod enhanced;
pub mod military;
pub mod quantum_safe;

use crate::config::Config;
use crate::crypto::codec::LevelCodec;
use crate::crypto::keys::EncryptionKeys;
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::EncryptionLevel;

pub use basic::BasicCodec;
pub use enhanced::EnhancedCodec;
pub use military::MilitaryCodec;
pub use quantum_safe::QuantumSafeCodec;

/// Собрать codec для уровня.
///
/// Симметричные слои используют ключ отправителя, RSA слой - пару получателя.
pub fn codec_for<'a>(
    level: EncryptionLevel,
    sender: &'a EncryptionKeys,
    recipient: Option<&'a EncryptionKeys>,
    config: &Config,
) -> Result<Box<dyn LevelCodec + 'a>> {
    let key = sender.symmetric_key();

    let codec: Box<dyn LevelCodec + 'a> = match level {
        EncryptionLevel::Basic => Box::new(BasicCodec::new(key, config)),
        EncryptionLevel::Enhanced => Box::new(EnhancedCodec::new(key)),
        EncryptionLevel::Military => {
            Box::new(MilitaryCodec::new(EnhancedCodec::new(key), require(recipient, level)?))
        }
        EncryptionLevel::QuantumSafe => Box::new(QuantumSafeCodec::new(MilitaryCodec::new(
            EnhancedCodec::new(key),
            require(recipient, level)?,
        ))),
    };

    Ok(codec)
}

fn require(recipient: Option<&EncryptionKeys>, level: EncryptionLevel) -> Result<&EncryptionKeys> {
    recipient.ok_or_else(|| {
        ProtocolError::UnknownDevice(format!("{} level requires recipient keys", level))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::tests::{test_config, test_keys};

    #[test]
    fn test_every_level_round_trips() {
        let sender = test_keys("alice_device");
        let recipient = test_keys("bob_device_1");
        let config = test_config();

        for level in EncryptionLevel::ALL {
            let codec = codec_for(level, &sender, Some(&recipient), &config).unwrap();
            assert_eq!(codec.level(), level);
            let frame = codec.encrypt(b"round trip").unwrap();
            assert_eq!(codec.decrypt(&frame).unwrap(), b"round trip");
        }
    }

    #[test]
    fn test_sizes_strictly_increase_with_level() {
        let sender = test_keys("alice_device");
        let recipient = test_keys("bob_device_1");
        let config = test_config();
        let plaintext = br#"{"content":"Hello from Ribit 2.0!","type":"chat"}"#;

        let sizes: Vec<usize> = EncryptionLevel::ALL
            .into_iter()
            .map(|level| {
                codec_for(level, &sender, Some(&recipient), &config)
                    .unwrap()
                    .encrypt(plaintext)
                    .unwrap()
                    .len()
            })
            .collect();

        assert!(sizes.windows(2).all(|w| w[0] < w[1]), "sizes: {:?}", sizes);
    }

    #[test]
    fn test_asymmetric_levels_require_recipient() {
        let sender = test_keys("alice_device");
        let config = test_config();

        assert!(codec_for(EncryptionLevel::Enhanced, &sender, None, &config).is_ok());
        assert!(matches!(
            codec_for(EncryptionLevel::Military, &sender, None, &config),
            Err(ProtocolError::UnknownDevice(_))
        ));
        assert!(codec_for(EncryptionLevel::QuantumSafe, &sender, None, &config).is_err());
    }

    #[test]
    fn test_levels_reject_each_others_frames() {
        let sender = test_keys("alice_device");
        let recipient = test_keys("bob_device_1");
        let config = test_config();

        let basic = codec_for(EncryptionLevel::Basic, &sender, Some(&recipient), &config).unwrap();
        let enhanced = codec_for(EncryptionLevel::Enhanced, &sender, Some(&recipient), &config).unwrap();

        let frame = enhanced.encrypt(b"downgrade").unwrap();
        assert!(basic.decrypt(&frame).is_err());
    }
}
