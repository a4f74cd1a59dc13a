//! Store identifiers
//!
//! Wallets and payout records are keyed by 12-byte object identifiers written
//! as 24 hexadecimal characters.

use super::error::LedgerError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of raw bytes in an [`ObjectId`]
pub const OBJECT_ID_LEN: usize = 12;

/// 12-byte store identifier
///
/// Parsing accepts exactly 24 hex digits (either case). Display always
/// renders lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        ObjectId(bytes)
    }

    pub fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Parse an identifier, naming `field` in the validation error on failure
    pub fn parse_field(field: &str, value: &str) -> Result<Self, LedgerError> {
        if value.len() != OBJECT_ID_LEN * 2 {
            return Err(LedgerError::validation(
                field,
                value,
                &format!("expected {} hex characters", OBJECT_ID_LEN * 2),
            ));
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(value, &mut bytes)
            .map_err(|e| LedgerError::validation(field, value, &e.to_string()))?;

        Ok(ObjectId(bytes))
    }
}

impl FromStr for ObjectId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_field("id", s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
