//! Core type definitions for BAZ

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chain identifier (EIP-155)
pub type ChainId = u64;

/// Block height
pub type BlockNumber = u64;

/// Token amount in base units (wei-style, 18 decimals by default)
pub type Amount = u128;

/// Keccak-256 digest of `data`
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

/// Errors from parsing hex identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHexError {
    #[error("missing 0x prefix")]
    MissingPrefix,

    #[error("expected {expected} hex characters, found {found}")]
    BadLength { expected: usize, found: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

fn parse_prefixed_hex<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(ParseHexError::MissingPrefix)?;
    if body.len() != N * 2 {
        return Err(ParseHexError::BadLength {
            expected: N * 2,
            found: body.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(body, &mut out).map_err(|e| ParseHexError::InvalidHex(e.to_string()))?;
    Ok(out)
}

/// 20-byte account or contract address
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Deterministic address for a human label ("alice", "deployer").
    ///
    /// Devnet accounts are unlocked, so a label is all that identifies them.
    pub fn from_label(label: &str) -> Self {
        let digest = keccak256(label.as_bytes());
        Self::from_digest(&digest)
    }

    /// Address of a contract created by `deployer` at account nonce `nonce`
    pub fn create(deployer: &Address, nonce: u64) -> Self {
        let mut preimage = Vec::with_capacity(28);
        preimage.extend_from_slice(&deployer.0);
        preimage.extend_from_slice(&nonce.to_be_bytes());
        Self::from_digest(&keccak256(preimage))
    }

    fn from_digest(digest: &[u8; 32]) -> Self {
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Self(out)
    }

    /// Shortened form for logs (`0x1234…abcd`)
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed_hex::<20>(s.trim()).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Transaction hash (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        Self(keccak256(data))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

impl FromStr for TxHash {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed_hex::<32>(s.trim()).map(Self)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Block environment visible to a contract call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnv {
    pub number: BlockNumber,
    pub timestamp: u64,
}

/// Errors from decimal amount conversion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,

    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("too many decimal places (max {max})")]
    TooPrecise { max: u8 },

    #[error("amount overflows 128 bits")]
    Overflow,
}

/// Parse a human-readable decimal ("1.5") into base units
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Invalid(value.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::Invalid(value.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::TooPrecise { max: decimals });
    }

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or(UnitsError::Overflow)?;
    let whole: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| UnitsError::Overflow)?
    };
    let frac_scaled: Amount = if frac.is_empty() {
        0
    } else {
        let digits: Amount = frac.parse().map_err(|_| UnitsError::Overflow)?;
        digits * 10u128.pow(decimals as u32 - frac.len() as u32)
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_scaled))
        .ok_or(UnitsError::Overflow)
}

/// Format base units as a decimal string with trailing zeros trimmed
pub fn format_units(amount: Amount, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(decimals as u32);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Serde adapter carrying an `Amount` as a decimal string, so values above
/// 2^53 survive JSON clients. Plain integers are accepted on input.
pub mod amount_str {
    use super::Amount;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal integer string or non-negative integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.trim().parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(v as Amount)
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                Amount::try_from(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Constants
pub mod constants {
    use super::Amount;

    /// Default ERC20 decimals
    pub const DEFAULT_DECIMALS: u8 = 18;

    /// One whole token at 18 decimals
    pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

    /// Seconds between devnet blocks
    pub const BLOCK_TIME_SECS: u64 = 12;

    /// Genesis timestamp used when none is configured (2024-01-01T00:00:00Z)
    pub const DEFAULT_GENESIS_TIMESTAMP: u64 = 1_704_067_200;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip_display() {
        let addr = Address::from_label("alice");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(addr.to_string().len(), 42);
    }

    #[test]
    fn test_address_parse_is_case_insensitive() {
        let lower: Address = "0x742d35cc6634c0532925a3b844bc9e7595f2bd08".parse().unwrap();
        let mixed: Address = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08".parse().unwrap();
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_address_parse_errors() {
        assert_eq!(
            "742d35cc".parse::<Address>(),
            Err(ParseHexError::MissingPrefix)
        );
        assert!(matches!(
            "0x742d35".parse::<Address>(),
            Err(ParseHexError::BadLength { expected: 40, .. })
        ));
        assert!(matches!(
            "0xzz2d35cc6634c0532925a3b844bc9e7595f2bd08".parse::<Address>(),
            Err(ParseHexError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_create_address_depends_on_nonce() {
        let deployer = Address::from_label("deployer");
        assert_ne!(Address::create(&deployer, 0), Address::create(&deployer, 1));
        assert_eq!(Address::create(&deployer, 7), Address::create(&deployer, 7));
    }

    #[test]
    fn test_address_serializes_as_string_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Address::from_label("bob"), 5u128);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<Address, u128> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1000", 18).unwrap(), 1000 * constants::ONE_TOKEN);
        assert_eq!(parse_units("1.5", 18).unwrap(), constants::ONE_TOKEN * 3 / 2);
        assert_eq!(parse_units(".25", 2).unwrap(), 25);
        assert_eq!(parse_units("1.234", 2), Err(UnitsError::TooPrecise { max: 2 }));
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert!(matches!(parse_units("1e5", 18), Err(UnitsError::Invalid(_))));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(100 * constants::ONE_TOKEN, 18), "100");
        assert_eq!(format_units(constants::ONE_TOKEN / 4, 18), "0.25");
        assert_eq!(format_units(1234, 0), "1234");
    }

    #[test]
    fn test_amount_str_serde() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Wrapped {
            #[serde(with = "amount_str")]
            value: Amount,
        }
        let big = Wrapped {
            value: 1_000 * constants::ONE_TOKEN,
        };
        let json = serde_json::to_string(&big).unwrap();
        assert_eq!(json, r#"{"value":"1000000000000000000000"}"#);
        assert_eq!(serde_json::from_str::<Wrapped>(&json).unwrap(), big);
        assert_eq!(
            serde_json::from_str::<Wrapped>(r#"{"value":42}"#).unwrap().value,
            42
        );
        assert!(serde_json::from_str::<Wrapped>(r#"{"value":"-1"}"#).is_err());
    }
}
