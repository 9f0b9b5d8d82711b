//! # Accounts & Currencies
//!
//! [`AccountId`] is the opaque party identifier used throughout the desk:
//! token holders, the contract owner, and the desk's own settlement account
//! are all plain account IDs. Accounts have no lifecycle — an entry springs
//! into existence the first time a balance references it, and an account
//! that was never credited simply reads as zero.
//!
//! [`Currency`] names the two payment assets the sale desk accepts: the
//! native asset of the value-transfer rail, and its wrapped-token form
//! moved via an allowance mechanism.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An opaque account identifier (address-equivalent).
///
/// The desk never inspects the contents — any non-empty string an upstream
/// identity layer hands us is a valid account. Serializes as a bare string,
/// so it works directly as a JSON map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::str::FromStr for AccountId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// The payment assets accepted by the sale desk and held by the treasury.
///
/// Both convert to tokens at the same fixed rate; they differ only in how
/// payment is collected (attached native value vs. allowance pull).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// The native asset of the value-transfer rail. Payment arrives
    /// attached to the purchase call, already escrowed by the rail.
    Native,
    /// The wrapped-token form of the same value asset, pulled from the
    /// buyer via the wrapped-asset ledger's allowance mechanism.
    Wrapped,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Native => write!(f, "native"),
            Currency::Wrapped => write!(f, "wrapped"),
        }
    }
}

/// Error returned when parsing an unrecognized currency name.
#[derive(Debug, Error)]
#[error("unknown currency '{0}', expected 'native' or 'wrapped'")]
pub struct UnknownCurrency(pub String);

impl std::str::FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(Currency::Native),
            "wrapped" => Ok(Currency::Wrapped),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn account_id_display_roundtrip() {
        let id = AccountId::new("addr1");
        assert_eq!(id.to_string(), "addr1");
        assert_eq!(AccountId::from_str("addr1").unwrap(), id);
    }

    #[test]
    fn account_id_serializes_as_bare_string() {
        let id = AccountId::new("owner");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"owner\"");
    }

    #[test]
    fn currency_parse_accepts_both_cases() {
        assert_eq!(Currency::from_str("native").unwrap(), Currency::Native);
        assert_eq!(Currency::from_str("Wrapped").unwrap(), Currency::Wrapped);
    }

    #[test]
    fn currency_parse_rejects_unknown() {
        assert!(Currency::from_str("ether").is_err());
    }

    #[test]
    fn currency_display_matches_parse() {
        for c in [Currency::Native, Currency::Wrapped] {
            assert_eq!(Currency::from_str(&c.to_string()).unwrap(), c);
        }
    }
}
