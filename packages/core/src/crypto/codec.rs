//! Defines the LevelCodec trait shared by the four encryption levels.

use crate::error::Result;
use crate::protocol::envelope::EncryptionLevel;

/// A byte-to-byte transform for one encryption level.
///
/// Higher levels hold the lower level they wrap and delegate to it, so each
/// construction only implements its own layer:
///
/// ```text
/// QuantumSafe = HashCommitment(Military)
/// Military    = RsaSessionWrap(Enhanced)
/// ```
pub trait LevelCodec {
    /// Level written into (and required from) the frame header
    fn level(&self) -> EncryptionLevel;

    /// Encrypts `plaintext` into a self-describing frame.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Reverses [`LevelCodec::encrypt`]. Never returns partially decoded data.
    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>>;
}
