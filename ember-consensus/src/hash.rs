use crate::error::HashParseError;
use crate::U256;
use hex;
use std::{convert::TryFrom, fmt};

/// A 256-bit block hash, compared numerically against targets.
///
/// The text form is big-endian hex, most significant byte first, the same
/// order block explorers print. Wire formats that store hashes little-endian
/// go through [`Hash::from_le_bytes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash(U256);

impl serde::Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Hash::try_from(s.as_str()).map_err(|e| {
            serde::de::Error::custom(format!("Failed to deserialize Hash from hex string: {}", e))
        })
    }
}

impl Hash {
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Hash(U256::from_big_endian(&bytes))
    }

    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Hash(U256::from_little_endian(&bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_big_endian()
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn meets_target(&self, target: U256) -> bool {
        self.0 <= target
    }

    pub fn zero() -> Self {
        Hash(U256::zero())
    }
}

impl From<U256> for Hash {
    fn from(value: U256) -> Self {
        Hash(value)
    }
}

impl From<Hash> for U256 {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl TryFrom<&str> for Hash {
    type Error = HashParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;

        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashParseError::InvalidLength(bytes.len()))?;

        Ok(Hash::from_be_bytes(array))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_be_bytes()))
    }
}
