use crate::error::{LaunchSpecError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Byte quantity written with a binary unit suffix, e.g. `"1G"` or `"512M"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryQuantity(u64);

impl MemoryQuantity {
    pub const ONE_GIB: MemoryQuantity = MemoryQuantity(GIB);

    pub fn from_bytes(bytes: u64) -> Result<Self> {
        if bytes == 0 {
            return Err(LaunchSpecError::InvalidMemoryQuantity {
                input: bytes.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Parse a quantity such as `"1G"`, `"256mb"` or `"4096"`
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| LaunchSpecError::InvalidMemoryQuantity {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty value"));
        }

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(invalid("expected a number"));
        }

        let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" => KIB,
            "M" | "MB" => MIB,
            "G" | "GB" => GIB,
            _ => return Err(invalid("unknown unit, use K, M or G")),
        };

        let value: u64 = digits.parse().map_err(|_| invalid("number too large"))?;
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("number too large"))?;
        if bytes == 0 {
            return Err(invalid("must be greater than zero"));
        }

        Ok(Self(bytes))
    }
}

impl FromStr for MemoryQuantity {
    type Err = LaunchSpecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MemoryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes % GIB == 0 {
            write!(f, "{}G", bytes / GIB)
        } else if bytes % MIB == 0 {
            write!(f, "{}M", bytes / MIB)
        } else if bytes % KIB == 0 {
            write!(f, "{}K", bytes / KIB)
        } else {
            write!(f, "{}", bytes)
        }
    }
}

impl Serialize for MemoryQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MemoryQuantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Bytes(u64),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => MemoryQuantity::parse(&text),
            Raw::Bytes(bytes) => MemoryQuantity::from_bytes(bytes),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
