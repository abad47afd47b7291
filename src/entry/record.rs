//! Entry record definitions
//!
//! Encoding, decoding and expiry checks for stored values.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StashError};

/// Header size: 4 bytes CRC + 4 bytes payload length
pub const HEADER_SIZE: usize = 8;

/// Current wall-clock time in Unix milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// A value as stored in the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Expiry (unix millis). `None` never expires.
    pub expires_at_ms: Option<u64>,

    /// Raw value bytes
    pub value: Vec<u8>,
}

impl EntryRecord {
    /// Record that never expires
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            expires_at_ms: None,
            value,
        }
    }

    /// Record expiring `ttl` after `now_ms`
    pub fn with_ttl(value: Vec<u8>, ttl: Duration, now_ms: u64) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            expires_at_ms: Some(now_ms.saturating_add(ttl_ms)),
            value,
        }
    }

    /// Whether the record is dead at `now_ms`
    pub fn is_expired(&self, now_ms: u64) -> bool {
        matches!(self.expires_at_ms, Some(at) if now_ms >= at)
    }

    /// Encode to bytes
    ///
    /// Format: crc (4) + payload_len (4) + payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload =
            bincode::serialize(self).map_err(|e| StashError::Serialization(e.to_string()))?;
        let payload_len = u32::try_from(payload.len()).map_err(|_| {
            StashError::Serialization(format!("record too large: {} bytes", payload.len()))
        })?;

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        buf.put_u32(crc32fast::hash(&payload));
        buf.put_u32(payload_len);
        buf.put_slice(&payload);

        Ok(buf.to_vec())
    }

    /// Decode from bytes, verifying length and checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StashError::Corruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut header = &bytes[..HEADER_SIZE];
        let expected_crc = header.get_u32();
        let payload_len = header.get_u32() as usize;

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != payload_len {
            return Err(StashError::Corruption(format!(
                "length mismatch: header says {}, found {}",
                payload_len,
                payload.len()
            )));
        }

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(StashError::Corruption(format!(
                "checksum mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            )));
        }

        bincode::deserialize(payload).map_err(|e| StashError::Corruption(e.to_string()))
    }
}
