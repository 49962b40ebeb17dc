use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 0x-prefixed hex string (e.g. "0x1234...").
pub type Hex = String;

/// Oracle request SDK error types.
#[derive(Debug, Error)]
pub enum OraqError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid request id: {0}")]
    InvalidRequestId(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("receipt missing expected log: log index {log_index}, topic index {topic_index}")]
    MissingLog { log_index: usize, topic_index: usize },

    #[error("abi decode error: {0}")]
    AbiDecode(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OraqError>;

/// A 20-byte EVM account or contract address, stored 0x-prefixed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Address {
    /// Parse and normalize a 0x-prefixed 40-hex-char address.
    pub fn parse(s: &str) -> Result<Self> {
        let body = s
            .strip_prefix("0x")
            .ok_or_else(|| OraqError::InvalidAddress(format!("missing 0x prefix: {}", s)))?;
        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(OraqError::InvalidAddress(s.to_string()));
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 20 raw bytes.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Validated at construction, decode cannot fail.
        if let Ok(bytes) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque 32-byte request identifier, assigned by the chain at submission.
///
/// Extracted from an indexed event topic; immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId([u8; 32]);

impl RequestId {
    /// Parse a request id from a 0x-prefixed 64-hex-char log topic.
    pub fn from_topic(topic: &str) -> Result<Self> {
        let body = topic
            .strip_prefix("0x")
            .ok_or_else(|| OraqError::InvalidRequestId(format!("missing 0x prefix: {}", topic)))?;
        let bytes =
            hex::decode(body).map_err(|e| OraqError::InvalidRequestId(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(OraqError::InvalidRequestId(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> Hex {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RequestId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RequestId::from_topic(&s).map_err(serde::de::Error::custom)
    }
}

/// On-chain request status as reported by the router's status accessor.
///
/// The contract returns `1` while a request is open; any other value means the
/// request has been fulfilled (or cancelled on-chain, which the accessor does
/// not distinguish).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Requested,
    Fulfilled,
}

impl RequestStatus {
    pub fn from_status_code(code: u128) -> Self {
        if code == 1 {
            RequestStatus::Requested
        } else {
            RequestStatus::Fulfilled
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Requested)
    }
}

/// Parse a hex string to a big-endian byte array.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(hex_str).map_err(|e| OraqError::InvalidHex(e.to_string()))
}

/// Convert bytes to a 0x-prefixed hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> Hex {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 0x-prefixed hex quantity into a u128.
///
/// Values wider than 128 bits are rejected rather than truncated.
pub fn hex_to_u128(hex_str: &str) -> Result<u128> {
    let body = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let body = body.trim_start_matches('0');
    if body.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(body, 16).map_err(|e| OraqError::InvalidHex(e.to_string()))
}

/// Convert a u128 to a 0x-prefixed hex quantity.
pub fn u128_to_hex(value: u128) -> Hex {
    format!("0x{:x}", value)
}

/// Normalize a hex quantity for comparison: lowercase, no leading zeros.
///
/// Works for values of any width, so 256-bit fees compare correctly without
/// narrowing.
pub fn normalize_uint_hex(hex_str: &str) -> Hex {
    let body = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let body = body.trim_start_matches('0');
    if body.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", body.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parse_normalizes_case() {
        let a = Address::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(a.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn address_parse_rejects_bad_input() {
        assert!(Address::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn request_id_roundtrip() {
        let topic = format!("0x{}", "ab".repeat(32));
        let id = RequestId::from_topic(&topic).unwrap();
        assert_eq!(id.to_hex(), topic);
    }

    #[test]
    fn request_id_rejects_wrong_length() {
        assert!(RequestId::from_topic("0x1234").is_err());
        assert!(RequestId::from_topic(&format!("0x{}", "ab".repeat(33))).is_err());
        assert!(RequestId::from_topic(&"ab".repeat(32)).is_err());
    }

    #[test]
    fn status_code_one_is_requested() {
        assert_eq!(RequestStatus::from_status_code(1), RequestStatus::Requested);
        assert_eq!(RequestStatus::from_status_code(0), RequestStatus::Fulfilled);
        assert_eq!(RequestStatus::from_status_code(2), RequestStatus::Fulfilled);
    }

    #[test]
    fn hex_quantity_helpers() {
        assert_eq!(hex_to_u128("0x0").unwrap(), 0);
        assert_eq!(hex_to_u128("0x00").unwrap(), 0);
        assert_eq!(hex_to_u128("0x3b9aca00").unwrap(), 1_000_000_000);
        assert_eq!(u128_to_hex(255), "0xff");
        assert!(hex_to_u128(&format!("0x{}", "f".repeat(64))).is_err());
    }

    #[test]
    fn normalize_uint_hex_strips_zeros() {
        assert_eq!(normalize_uint_hex("0x000001"), "0x1");
        assert_eq!(normalize_uint_hex("0x0"), "0x0");
        assert_eq!(normalize_uint_hex("0x00"), "0x0");
        assert_eq!(normalize_uint_hex("0x0AB"), "0xab");
        assert_eq!(
            normalize_uint_hex(&format!("0x{}", "F".repeat(64))),
            format!("0x{}", "f".repeat(64))
        );
    }
}
