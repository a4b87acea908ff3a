//! Per-peer changelog counters and their on-disk encoding
//!
//! Each replica keeps, per peer (including itself), a changelog attribute
//! counting operations it believes are still outstanding against that
//! peer. The value is a fixed-width triple of big-endian `u32`s:
//! data writes, attribute operations, directory operations.

use crate::error::{Error, Result};

/// Attribute name prefix for per-peer changelog entries.
pub const CHANGELOG_PREFIX: &str = "trusted.mend.";

/// Attribute holding the stable per-file identifier expected identical
/// across all replicas of the same file.
pub const FILE_ID_ATTR: &str = "trusted.mend.file-id";

/// Encoded length of a changelog value.
pub const CHANGELOG_LEN: usize = 12;

/// Changelog attribute name recording operations against `target_name`.
pub fn changelog_attr(target_name: &str) -> String {
    format!("{CHANGELOG_PREFIX}{target_name}")
}

/// Outstanding-operation counts one replica records about one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCount {
    /// Suspected outstanding content writes.
    pub data: u32,

    /// Pending attribute operations. Never healed here; non-zero is a
    /// hard stop.
    pub metadata: u32,

    /// Pending directory operations. Never healed here; non-zero is a
    /// hard stop.
    pub entry: u32,
}

impl ChangeCount {
    /// All-zero counts, also imputed for absent changelog attributes.
    pub const ZERO: Self = Self {
        data: 0,
        metadata: 0,
        entry: 0,
    };

    /// Create counts from the three fields.
    pub fn new(data: u32, metadata: u32, entry: u32) -> Self {
        Self {
            data,
            metadata,
            entry,
        }
    }

    /// Decode a 12-byte big-endian triple.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let raw: &[u8; CHANGELOG_LEN] =
            bytes
                .try_into()
                .map_err(|_| Error::BadChangelogLength {
                    actual: bytes.len(),
                })?;
        Ok(Self {
            data: u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            metadata: u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]),
            entry: u32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]),
        })
    }

    /// Encode as a 12-byte big-endian triple.
    pub fn encode(&self) -> [u8; CHANGELOG_LEN] {
        let mut out = [0u8; CHANGELOG_LEN];
        out[0..4].copy_from_slice(&self.data.to_be_bytes());
        out[4..8].copy_from_slice(&self.metadata.to_be_bytes());
        out[8..12].copy_from_slice(&self.entry.to_be_bytes());
        out
    }

    /// Whether all three counts are zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Same counts with the data field cleared. The metadata and entry
    /// fields are preserved as read.
    pub fn with_data_cleared(&self) -> Self {
        Self { data: 0, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let counts = ChangeCount::new(3, 1, 7);
        let encoded = counts.encode();
        assert_eq!(encoded.len(), CHANGELOG_LEN);
        assert_eq!(ChangeCount::decode(&encoded).unwrap(), counts);
    }

    #[test]
    fn test_decode_is_big_endian() {
        let mut raw = [0u8; CHANGELOG_LEN];
        raw[3] = 1; // data = 1
        raw[4] = 1; // metadata = 1 << 24
        let counts = ChangeCount::decode(&raw).unwrap();
        assert_eq!(counts.data, 1);
        assert_eq!(counts.metadata, 1 << 24);
        assert_eq!(counts.entry, 0);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(matches!(
            ChangeCount::decode(&[0u8; 8]),
            Err(Error::BadChangelogLength { actual: 8 })
        ));
    }

    #[test]
    fn test_with_data_cleared_preserves_other_fields() {
        let counts = ChangeCount::new(5, 2, 9);
        let cleared = counts.with_data_cleared();
        assert_eq!(cleared, ChangeCount::new(0, 2, 9));
    }

    #[test]
    fn test_changelog_attr_name() {
        assert_eq!(changelog_attr("client-0"), "trusted.mend.client-0");
    }
}
