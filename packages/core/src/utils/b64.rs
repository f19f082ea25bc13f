// Base64 для encrypted_content и вложенного MILITARY слоя (стандартный алфавит, с паддингом)

use base64::{engine::general_purpose::STANDARD, Engine};

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Строгое декодирование: строка уже прошла HMAC как есть, поэтому никакой нормализации
pub fn decode(encoded: &str) -> Result<Vec<u8>, String> {
    STANDARD
        .decode(encoded)
        .map_err(|e| format!("invalid base64 ({} chars): {}", encoded.len(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_alphabet_with_padding() {
        assert_eq!(encode(b"ribit"), "cmliaXQ=");
        assert_eq!(decode("cmliaXQ=").unwrap(), b"ribit");
    }

    #[test]
    fn test_rejects_whitespace_and_garbage() {
        assert!(decode("cmliaXQ=\n").is_err());
        assert!(decode("cmli aXQ=").is_err());
        assert!(decode("not base64!").is_err());
    }
}
