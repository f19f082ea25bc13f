// Wire format конверта
// JSON - запись для chat-транспорта, MessagePack - для бинарных транспортов

use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::{MessageEnvelope, SecureMessage};
use rmp_serde::{Deserializer, Serializer};
use serde::{Deserialize, Serialize};

/// Сериализовать конверт в JSON
pub fn envelope_to_json(envelope: &MessageEnvelope) -> Result<String> {
    serde_json::to_string(envelope)
        .map_err(|e| ProtocolError::Serialization(format!("Envelope JSON encode error: {}", e)))
}

/// Разобрать конверт из JSON
pub fn envelope_from_json(data: &str) -> Result<MessageEnvelope> {
    serde_json::from_str(data)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("Envelope JSON decode error: {}", e)))
}

/// Упаковать конверт в MessagePack
pub fn pack_envelope(envelope: &MessageEnvelope) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    envelope
        .serialize(&mut Serializer::new(&mut buffer).with_struct_map())
        .map_err(|e| ProtocolError::Serialization(format!("MessagePack pack error: {}", e)))?;
    Ok(buffer)
}

/// Распаковать конверт из MessagePack
pub fn unpack_envelope(data: &[u8]) -> Result<MessageEnvelope> {
    let mut deserializer = Deserializer::new(data);
    MessageEnvelope::deserialize(&mut deserializer)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("MessagePack unpack error: {}", e)))
}

/// Каноническая сериализация payload перед шифрованием
pub fn encode_payload(message: &SecureMessage) -> Result<Vec<u8>> {
    serde_json::to_vec(message)
        .map_err(|e| ProtocolError::Serialization(format!("Payload encode error: {}", e)))
}

/// Разбор расшифрованного payload
pub fn decode_payload(data: &[u8]) -> Result<SecureMessage> {
    serde_json::from_slice(data)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("Payload is not a valid message: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::envelope::{EncryptionLevel, MessageType};

    fn sample_envelope() -> MessageEnvelope {
        MessageEnvelope {
            encrypted_content: "AQID".to_string(),
            message_type: MessageType::Chat,
            encryption_level: EncryptionLevel::Enhanced,
            sender_device_id: "alice_device".to_string(),
            recipient_device_id: "bob_device_1".to_string(),
            timestamp: 1_700_000_000.25,
            signature: "ab".repeat(32),
            key_fingerprint: "0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = envelope_to_json(&sample_envelope()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["encryption_level"], "enhanced");
        assert_eq!(value["message_type"], "chat");
        assert_eq!(value["recipient_device_id"], "bob_device_1");
        assert_eq!(envelope_from_json(&json).unwrap(), sample_envelope());
    }

    #[test]
    fn test_pack_unpack_envelope() {
        let packed = pack_envelope(&sample_envelope()).unwrap();
        assert!(!packed.is_empty());
        assert_eq!(unpack_envelope(&packed).unwrap(), sample_envelope());
    }

    #[test]
    fn test_unknown_level_is_malformed() {
        let json = envelope_to_json(&sample_envelope())
            .unwrap()
            .replace("\"enhanced\"", "\"top_secret\"");
        assert!(matches!(
            envelope_from_json(&json),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        assert!(matches!(
            decode_payload(b"not json"),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
        assert!(decode_payload(br#"{"content":"x"}"#).is_err());
    }
}
