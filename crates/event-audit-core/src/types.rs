//! Strong type definitions for stored documents.
//!
//! Identifiers are newtypes so a sequence number can never be passed where a
//! backend-assigned id is expected.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DocumentError;

/// Mask for the 3-byte counter portion of an id.
const COUNTER_MASK: u32 = 0x00ff_ffff;

/// A 12-byte document identifier assigned by the backend on save.
///
/// Layout: 4-byte big-endian Unix seconds, 5 random bytes fixed per
/// [`IdGenerator`], 3-byte big-endian counter. Ids from one generator are
/// unique and roughly time-ordered, but callers must treat them as opaque.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub [u8; 12]);

impl DocumentId {
    /// Create a new DocumentId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Seconds since the Unix epoch at which the id was generated.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Convert to a 24-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, DocumentError> {
        let bytes = hex::decode(s).map_err(|e| DocumentError::InvalidId(format!("{s}: {e}")))?;
        let arr: [u8; 12] = bytes
            .try_into()
            .map_err(|_| DocumentError::InvalidId(format!("{s}: expected 12 bytes")))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.to_hex())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for DocumentId {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 12]> for DocumentId {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Generator of [`DocumentId`]s.
///
/// Each backend owns one. Safe to share across threads.
#[derive(Debug)]
pub struct IdGenerator {
    process: [u8; 5],
    counter: AtomicU32,
}

impl IdGenerator {
    /// Create a generator with a random process value and counter start.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let mut process = [0u8; 5];
        rng.fill(&mut process[..]);
        Self {
            process,
            counter: AtomicU32::new(rng.gen::<u32>() & COUNTER_MASK),
        }
    }

    /// Produce the next identifier.
    pub fn next_id(&self) -> DocumentId {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(timestamp_secs)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        DocumentId(bytes)
    }
}

/// Seconds for the id timestamp, saturating at the largest 4-byte value.
fn timestamp_secs(since_epoch: Duration) -> u32 {
    u32::try_from(since_epoch.as_secs()).unwrap_or(u32::MAX)
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_document_id_hex_roundtrip() {
        let id = DocumentId::from_bytes([0x42; 12]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        let recovered = DocumentId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_document_id_rejects_bad_hex() {
        assert!(DocumentId::from_hex("not hex").is_err());
        assert!(DocumentId::from_hex("abcd").is_err());
        assert!("zz".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_document_id_debug() {
        let id = DocumentId::from_bytes([0xcd; 12]);
        let debug = format!("{:?}", id);
        assert!(debug.starts_with("DocumentId("));
    }

    #[test]
    fn test_generator_ids_are_unique() {
        let generator = IdGenerator::new();
        let ids: HashSet<DocumentId> = (0..10_000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_generator_embeds_timestamp() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        let id = IdGenerator::new().next_id();
        assert!(id.timestamp() >= now.saturating_sub(1));
        assert!(id.timestamp() <= now + 1);
    }

    #[test]
    fn test_document_id_serde_as_hex_string() {
        let id = DocumentId::from_bytes([0x01; 12]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"010101010101010101010101\"");
        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_timestamp_saturates() {
        assert_eq!(timestamp_secs(Duration::from_secs(1_653_390_208)), 1_653_390_208);
        assert_eq!(timestamp_secs(Duration::from_secs(u64::from(u32::MAX) + 10)), u32::MAX);
    }
}
