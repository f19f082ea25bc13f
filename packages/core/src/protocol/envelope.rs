// Типы конверта сообщения
// Соответствуют transport-формату (JSON запись с snake_case полями)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Назначение полезной нагрузки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Chat,
    Command,
    RobotControl,
    SystemStatus,
}

impl MessageType {
    pub const ALL: [MessageType; 4] = [
        MessageType::Chat,
        MessageType::Command,
        MessageType::RobotControl,
        MessageType::SystemStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Chat => "chat",
            MessageType::Command => "command",
            MessageType::RobotControl => "robot_control",
            MessageType::SystemStatus => "system_status",
        }
    }
}

/// Уровень шифрования. Каждый следующий уровень оборачивает предыдущий
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionLevel {
    Basic,
    Enhanced,
    Military,
    QuantumSafe,
}

impl EncryptionLevel {
    pub const ALL: [EncryptionLevel; 4] = [
        EncryptionLevel::Basic,
        EncryptionLevel::Enhanced,
        EncryptionLevel::Military,
        EncryptionLevel::QuantumSafe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionLevel::Basic => "basic",
            EncryptionLevel::Enhanced => "enhanced",
            EncryptionLevel::Military => "military",
            EncryptionLevel::QuantumSafe => "quantum_safe",
        }
    }

    /// Нужна ли асимметричная пара получателя
    pub fn requires_recipient_keys(&self) -> bool {
        matches!(self, EncryptionLevel::Military | EncryptionLevel::QuantumSafe)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EncryptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown message type: {}", s))
    }
}

impl FromStr for EncryptionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncryptionLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("Unknown encryption level: {}", s))
    }
}

/// Передаваемый конверт. Создается `encrypt_message`, потребляется `decrypt_message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Base64 вывода LevelCodec
    pub encrypted_content: String,
    pub message_type: MessageType,
    pub encryption_level: EncryptionLevel,
    pub sender_device_id: String,
    pub recipient_device_id: String,
    /// Unix timestamp в секундах
    pub timestamp: f64,
    /// Hex HMAC-SHA256 над `encrypted_content`
    pub signature: String,
    /// Короткий hex отпечаток публичного ключа отправителя
    pub key_fingerprint: String,
}

/// Каноническая структура, которая шифруется внутри конверта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecureMessage {
    pub content: serde_json::Value,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub timestamp: f64,
    pub sender: String,
}

impl SecureMessage {
    /// Текстовое содержимое, если payload - строка
    pub fn content_str(&self) -> Option<&str> {
        self.content.as_str()
    }
}
