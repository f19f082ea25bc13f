//! Versioned, length-prefixed framing shared by all level codecs.
//!
//! ```text
//! version(u8) || level(u8) || field_count(u8) || { len(u32 BE) || bytes }*
//! ```
//!
//! Field widths are still fixed per construction; the decoder checks every
//! length explicitly instead of slicing at hard-coded offsets.

use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::EncryptionLevel;

pub const PROTOCOL_VERSION: u8 = 1;

const HEADER_LEN: usize = 3;
const LENGTH_PREFIX: usize = 4;

/// Size of the ENHANCED key-derivation salt
pub const SALT_SIZE: usize = 32;
/// Size of the 96-bit AEAD nonce (BASIC, ENHANCED)
pub const NONCE_SIZE: usize = 12;
/// Size of the MILITARY outer-layer IV
pub const IV_SIZE: usize = 16;
/// Size of every AEAD authentication tag
pub const TAG_SIZE: usize = 16;
/// Size of symmetric keys (device key, derived keys, session keys)
pub const KEY_SIZE: usize = 32;

pub fn level_tag(level: EncryptionLevel) -> u8 {
    match level {
        EncryptionLevel::Basic => 1,
        EncryptionLevel::Enhanced => 2,
        EncryptionLevel::Military => 3,
        EncryptionLevel::QuantumSafe => 4,
    }
}

/// Header bytes for `level`; BASIC binds them as associated data.
pub fn header(level: EncryptionLevel, field_count: u8) -> [u8; HEADER_LEN] {
    [PROTOCOL_VERSION, level_tag(level), field_count]
}

/// Serialize `fields` under a header for `level`.
pub fn encode(level: EncryptionLevel, fields: &[&[u8]]) -> Vec<u8> {
    let body: usize = fields.iter().map(|f| LENGTH_PREFIX + f.len()).sum();
    let mut out = Vec::with_capacity(HEADER_LEN + body);
    // Field counts are fixed per codec (1..=4)
    out.extend_from_slice(&header(level, fields.len() as u8));
    for field in fields {
        out.extend_from_slice(&(field.len() as u32).to_be_bytes());
        out.extend_from_slice(field);
    }
    out
}

/// Parse a frame produced by [`encode`], requiring the given level and field count.
///
/// Returned slices borrow from `data`.
pub fn decode(data: &[u8], level: EncryptionLevel, expected_fields: usize) -> Result<Vec<&[u8]>> {
    if data.len() < HEADER_LEN {
        return Err(malformed("frame shorter than header"));
    }

    let (head, mut rest) = data.split_at(HEADER_LEN);
    if head[0] != PROTOCOL_VERSION {
        return Err(malformed(&format!("unsupported protocol version {}", head[0])));
    }
    if head[1] != level_tag(level) {
        return Err(malformed(&format!(
            "level tag {} does not match {}",
            head[1],
            level.as_str()
        )));
    }
    if head[2] as usize != expected_fields {
        return Err(malformed(&format!(
            "expected {} fields, found {}",
            expected_fields, head[2]
        )));
    }

    let mut fields = Vec::with_capacity(expected_fields);
    for _ in 0..expected_fields {
        if rest.len() < LENGTH_PREFIX {
            return Err(malformed("truncated length prefix"));
        }
        let (prefix, tail) = rest.split_at(LENGTH_PREFIX);
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if tail.len() < len {
            return Err(malformed("field exceeds frame"));
        }
        let (field, tail) = tail.split_at(len);
        fields.push(field);
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(malformed("trailing bytes after last field"));
    }

    Ok(fields)
}

/// Check a fixed-width field.
pub fn expect_len(field: &[u8], expected: usize, name: &str) -> Result<()> {
    if field.len() != expected {
        return Err(malformed(&format!(
            "{} must be {} bytes, got {}",
            name,
            expected,
            field.len()
        )));
    }
    Ok(())
}

fn malformed(reason: &str) -> ProtocolError {
    ProtocolError::Decryption(format!("malformed frame: {}", reason))
}
