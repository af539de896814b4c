use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Total length bounds of a classic address, leading `r` included.
pub const ADDRESS_MIN_LEN: usize = 26;
pub const ADDRESS_MAX_LEN: usize = 35;

/// Drops per whole XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Hard cap on the native supply, in drops.
pub const MAX_DROPS: u64 = 100_000_000_000 * DROPS_PER_XRP;

/// Returns true iff `s` is a syntactically valid classic ledger address:
/// a leading `r` followed by 25-34 characters of the base-58 alphabet
/// (no `0`, `O`, `I` or `l`).
pub fn is_valid_address(s: &str) -> bool {
    let bytes = s.as_bytes();
    (ADDRESS_MIN_LEN..=ADDRESS_MAX_LEN).contains(&bytes.len())
        && bytes[0] == b'r'
        && bytes[1..].iter().copied().all(is_base58_char)
}

const fn is_base58_char(b: u8) -> bool {
    matches!(b, b'1'..=b'9' | b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z' | b'a'..=b'k' | b'm'..=b'z')
}

/// A classic ledger account address that passed [`is_valid_address`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if !is_valid_address(value) {
            return Err(ValidationError::InvalidAddress(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self.0)
    }
}

impl FromStr for AccountAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for AccountAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Issued-currency code: either a 3-character standard code or a 40-hex-digit code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CurrencyCode {
    Standard(String),
    Hex(String),
}

impl CurrencyCode {
    pub const HEX_LEN: usize = 40;

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.len() == 3 && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Ok(Self::Standard(value.to_string()));
        }
        if value.len() == Self::HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(Self::Hex(value.to_ascii_uppercase()));
        }
        Err(ValidationError::InvalidCurrency(value.to_string()))
    }

    /// Accepts either code shape, or converts a longer ASCII label (up to 20 bytes,
    /// e.g. `CORRIDOR_ELIGIBLE`) into its zero-padded 40-hex-digit form.
    pub fn from_label(label: &str) -> Result<Self, ValidationError> {
        if let Ok(code) = Self::parse(label) {
            return Ok(code);
        }
        if label.len() < 3
            || label.len() > Self::HEX_LEN / 2
            || !label.bytes().all(|b| b.is_ascii_graphic())
        {
            return Err(ValidationError::InvalidCurrency(label.to_string()));
        }
        let mut bytes = [0u8; Self::HEX_LEN / 2];
        bytes[..label.len()].copy_from_slice(label.as_bytes());
        Ok(Self::Hex(hex::encode_upper(bytes)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard(code) | Self::Hex(code) => code,
        }
    }

    /// Human-readable label; hex codes are decoded when they hold padded ASCII.
    pub fn label(&self) -> String {
        match self {
            Self::Standard(code) => code.clone(),
            Self::Hex(code) => hex::decode(code)
                .ok()
                .map(|bytes| {
                    bytes
                        .into_iter()
                        .take_while(|b| *b != 0)
                        .collect::<Vec<u8>>()
                })
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| code.clone()),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native amount in drops. Serialized as a decimal string of drops, the ledger's wire form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Drops(u64);

impl Drops {
    pub const ZERO: Self = Self(0);

    pub fn new(drops: u64) -> Result<Self, ValidationError> {
        if drops > MAX_DROPS {
            return Err(ValidationError::InvalidAmount {
                value: drops.to_string(),
                reason: "amount exceeds the native supply",
            });
        }
        Ok(Self(drops))
    }

    /// Clamps at [`MAX_DROPS`]. For constants and ledger-side balance arithmetic.
    pub const fn saturating(drops: u64) -> Self {
        if drops > MAX_DROPS {
            Self(MAX_DROPS)
        } else {
            Self(drops)
        }
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parses a decimal XRP amount (`"12.5"`) into drops. At most 6 fractional digits.
    pub fn from_xrp(value: &str) -> Result<Self, ValidationError> {
        let invalid = |reason| ValidationError::InvalidAmount {
            value: value.to_string(),
            reason,
        };
        let (whole, frac) = match value.split_once('.') {
            Some((whole, frac)) => {
                if frac.is_empty() {
                    return Err(invalid("expected digits after the decimal point"));
                }
                (whole, frac)
            }
            None => (value, ""),
        };
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected a non-negative decimal XRP amount"));
        }
        if frac.len() > 6 {
            return Err(invalid("XRP amounts carry at most 6 decimal places"));
        }
        let whole: u64 = whole.parse().map_err(|_| invalid("amount out of range"))?;
        let frac: u64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<6}")
                .parse()
                .map_err(|_| invalid("amount out of range"))?
        };
        whole
            .checked_mul(DROPS_PER_XRP)
            .and_then(|drops| drops.checked_add(frac))
            .filter(|drops| *drops <= MAX_DROPS)
            .map(Self)
            .ok_or_else(|| invalid("amount exceeds the native supply"))
    }

    /// Parses the ledger's drops string (`"12"`).
    pub fn from_drops_str(value: &str) -> Result<Self, ValidationError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidAmount {
                value: value.to_string(),
                reason: "expected an integer number of drops",
            });
        }
        value
            .parse::<u64>()
            .ok()
            .filter(|drops| *drops <= MAX_DROPS)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidAmount {
                value: value.to_string(),
                reason: "amount exceeds the native supply",
            })
    }

    pub fn to_xrp_string(self) -> String {
        let whole = self.0 / DROPS_PER_XRP;
        let frac = self.0 % DROPS_PER_XRP;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:06}");
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl fmt::Display for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Drops({})", self.0)
    }
}

impl Serialize for Drops {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Drops {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_drops_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Non-negative decimal string (`^\d+(\.\d+)?$`), kept verbatim so it round-trips exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecimalValue(String);

impl DecimalValue {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let (whole, frac) = match value.split_once('.') {
            Some((whole, frac)) => (whole, Some(frac)),
            None => (value, None),
        };
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) || frac.is_some_and(|frac| !digits(frac)) {
            return Err(ValidationError::InvalidAmount {
                value: value.to_string(),
                reason: "expected a non-negative decimal number",
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0' || b == b'.')
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger transaction hash (32 bytes, rendered as 64 uppercase hex digits).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.len() != Self::LEN {
            return Err(ValidationError::InvalidLength {
                kind: "TxHash",
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; Self::LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn from_hex(value: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(value).map_err(|err| ValidationError::InvalidHex(err.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl From<[u8; 32]> for TxHash {
    fn from(value: [u8; 32]) -> Self {
        Self::new(value)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_valid_address, AccountAddress, CurrencyCode, DecimalValue, Drops, TxHash, MAX_DROPS,
    };
    use crate::ValidationError;

    const GENESIS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn accepts_classic_addresses() {
        assert!(is_valid_address(GENESIS));
        assert!(is_valid_address("rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe"));
        // shortest accepted: `r` + 25 characters
        assert!(is_valid_address(&format!("r{}", "a".repeat(25))));
        assert!(is_valid_address(&format!("r{}", "z".repeat(34))));
    }

    #[test]
    fn rejects_wrong_length_prefix_and_glyphs() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address(&format!("r{}", "a".repeat(24))));
        assert!(!is_valid_address(&format!("r{}", "a".repeat(35))));
        assert!(!is_valid_address("xHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"));
        assert!(!is_valid_address("RHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"));
        for glyph in ['0', 'O', 'I', 'l'] {
            let candidate = format!("rHb9CJAWyB4rj91VRWn96Dkuk{glyph}4bwdtyTh");
            assert!(!is_valid_address(&candidate), "{candidate} must be rejected");
        }
        assert!(!is_valid_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdty-h"));
    }

    #[test]
    fn account_address_serde_validates() {
        let addr: AccountAddress = serde_json::from_str(&format!("\"{GENESIS}\"")).unwrap();
        assert_eq!(addr.as_str(), GENESIS);
        assert!(serde_json::from_str::<AccountAddress>("\"r0000\"").is_err());
    }

    #[test]
    fn currency_codes_accept_both_shapes() {
        assert_eq!(
            CurrencyCode::parse("USD").unwrap(),
            CurrencyCode::Standard("USD".to_string())
        );
        let hex = "0158415500000000C1F76FF6ECB0BAC600000000";
        assert_eq!(
            CurrencyCode::parse(&hex.to_ascii_lowercase()).unwrap(),
            CurrencyCode::Hex(hex.to_string())
        );
        assert!(matches!(
            CurrencyCode::parse("US"),
            Err(ValidationError::InvalidCurrency(_))
        ));
        assert!(CurrencyCode::parse("US$").is_err());
        assert!(CurrencyCode::parse("CORRIDOR_ELIGIBLE").is_err());
    }

    #[test]
    fn currency_label_is_padded_to_hex() {
        let code = CurrencyCode::from_label("CORRIDOR_ELIGIBLE").unwrap();
        assert_eq!(code.as_str(), "434F525249444F525F454C494749424C45000000");
        assert_eq!(code.label(), "CORRIDOR_ELIGIBLE");
        assert_eq!(CurrencyCode::from_label("USD").unwrap().label(), "USD");
        assert!(CurrencyCode::from_label("THIS_LABEL_IS_TOO_LONG_FOR_A_CODE").is_err());
    }

    #[test]
    fn drops_parse_xrp_decimals() {
        assert_eq!(Drops::from_xrp("1").unwrap().get(), 1_000_000);
        assert_eq!(Drops::from_xrp("12.5").unwrap().get(), 12_500_000);
        assert_eq!(Drops::from_xrp("0.000001").unwrap().get(), 1);
        assert!(Drops::from_xrp("0.0000001").is_err());
        assert!(Drops::from_xrp("-1").is_err());
        assert!(Drops::from_xrp("1.").is_err());
        assert!(Drops::from_xrp(".5").is_err());
        assert!(Drops::from_xrp("100000000001").is_err());
        assert_eq!(Drops::new(12_500_000).unwrap().to_xrp_string(), "12.5");
        assert_eq!(Drops::new(3_000_000).unwrap().to_xrp_string(), "3");
        assert_eq!(Drops::from_drops_str("12").unwrap(), Drops::new(12).unwrap());
        assert!(Drops::from_drops_str("1.2").is_err());
    }

    #[test]
    fn drops_constructor_enforces_native_supply() {
        assert_eq!(Drops::new(MAX_DROPS).unwrap().get(), MAX_DROPS);
        assert!(matches!(
            Drops::new(MAX_DROPS + 1),
            Err(ValidationError::InvalidAmount { .. })
        ));
        assert_eq!(Drops::saturating(u64::MAX).get(), MAX_DROPS);
        assert_eq!(Drops::saturating(12), Drops::new(12).unwrap());
    }

    #[test]
    fn decimal_values_are_non_negative() {
        assert_eq!(DecimalValue::parse("1000000").unwrap().as_str(), "1000000");
        assert!(DecimalValue::parse("0.25").is_ok());
        assert!(DecimalValue::parse("0").unwrap().is_zero());
        assert!(DecimalValue::parse("-5").is_err());
        assert!(DecimalValue::parse("1e6").is_err());
        assert!(DecimalValue::parse("").is_err());
        assert!(DecimalValue::parse("1.").is_err());
    }

    #[test]
    fn tx_hash_hex_round_trip() {
        let hash = TxHash::new([0xab; 32]);
        let rendered = hash.to_string();
        assert_eq!(rendered, "AB".repeat(32));
        assert_eq!(TxHash::from_hex(&rendered.to_ascii_lowercase()).unwrap(), hash);
        assert!(matches!(
            TxHash::from_hex("ABCD"),
            Err(ValidationError::InvalidLength { .. })
        ));
    }
}
