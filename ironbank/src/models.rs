use crate::errors::IronbankError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

//余额都用高精度
pub type Decimal = rust_decimal::Decimal;

pub type SecurityId = String;

/// Result of one batch fetch, keyed by currency.
pub type BalanceSet = BTreeMap<CurrencyCode, Balance>;

/// Result of one batch securities fetch, keyed by security id.
pub type SecuritySet = BTreeMap<SecurityId, SecurityPosition>;


/// Three character lowercase currency code such as `btc` or `ltc`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<CurrencyCode, IronbankError> {
        if is_valid_currency_code(code) {
            Ok(CurrencyCode(code.to_string()))
        } else {
            Err(IronbankError::InvalidCurrencyCode(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = IronbankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = IronbankError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        CurrencyCode::new(value)
    }
}

impl Borrow<str> for CurrencyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code: String = Deserialize::deserialize(deserializer)?;
        CurrencyCode::new(&code).map_err(de::Error::custom)
    }
}


/// Per-currency figures of one account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub confirmed: Decimal,
    #[serde(default)]
    pub unconfirmed: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashrate: Option<Decimal>,
    // anything else a service reports, e.g. "blocks" or "workers"
    #[serde(flatten)]
    pub extra: BTreeMap<String, Decimal>,
}

impl Balance {
    pub fn confirmed(confirmed: Decimal) -> Balance {
        Balance {
            confirmed,
            ..Default::default()
        }
    }

    pub fn with_unconfirmed(mut self, unconfirmed: Decimal) -> Balance {
        self.unconfirmed = unconfirmed;
        self
    }

    pub fn with_hashrate(mut self, hashrate: Decimal) -> Balance {
        self.hashrate = Some(hashrate);
        self
    }

    pub fn with_extra(mut self, key: &str, value: Decimal) -> Balance {
        self.extra.insert(key.to_string(), value);
        self
    }
}


/// Unit counts of a tradable security held by one account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SecurityPosition {
    pub owned: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<Decimal>,
}

impl SecurityPosition {
    pub fn owned(owned: Decimal) -> SecurityPosition {
        SecurityPosition {
            owned,
            ..Default::default()
        }
    }

    pub fn with_available(mut self, available: Decimal) -> SecurityPosition {
        self.available = Some(available);
        self
    }

    pub fn with_reserved(mut self, reserved: Decimal) -> SecurityPosition {
        self.reserved = Some(reserved);
        self
    }
}


/// Currencies present in `balances` that the account type never declared as supported.
pub fn unsupported_currencies<'a>(balances: &'a BalanceSet, supported: &BTreeSet<CurrencyCode>) -> Vec<&'a CurrencyCode> {
    balances.keys().filter(|cur| !supported.contains(*cur)).collect()
}
