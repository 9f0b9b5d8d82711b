//! # Balance-Change Events
//!
//! Every successful ledger mutation appends a [`BalanceEvent`] to an
//! ordered, append-only log. External auditors replay the log to verify
//! that the sum-of-balances invariant was preserved at every step; the
//! desk itself never reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// A single observable ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BalanceEvent {
    /// Tokens moved between two existing accounts. Total supply unchanged.
    Transfer {
        /// The debited account.
        from: AccountId,
        /// The credited account.
        to: AccountId,
        /// Amount moved, in smallest token units.
        amount: u64,
        /// When the mutation was applied (UTC).
        timestamp: DateTime<Utc>,
    },
    /// New tokens issued. Total supply increased by `amount`.
    Mint {
        /// The credited account.
        to: AccountId,
        /// Amount minted.
        amount: u64,
        /// When the mutation was applied (UTC).
        timestamp: DateTime<Utc>,
    },
    /// Tokens destroyed. Total supply decreased by `amount`.
    Burn {
        /// The debited account.
        from: AccountId,
        /// Amount burned.
        amount: u64,
        /// When the mutation was applied (UTC).
        timestamp: DateTime<Utc>,
    },
}

impl BalanceEvent {
    /// Returns the amount this event moved, minted, or burned.
    pub fn amount(&self) -> u64 {
        match self {
            BalanceEvent::Transfer { amount, .. }
            | BalanceEvent::Mint { amount, .. }
            | BalanceEvent::Burn { amount, .. } => *amount,
        }
    }

    /// Returns when the mutation was applied.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            BalanceEvent::Transfer { timestamp, .. }
            | BalanceEvent::Mint { timestamp, .. }
            | BalanceEvent::Burn { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_accessors() {
        let event = BalanceEvent::Mint {
            to: AccountId::new("addr1"),
            amount: 800,
            timestamp: Utc::now(),
        };
        assert_eq!(event.amount(), 800);
    }

    #[test]
    fn event_serialization_tags_kind() {
        let event = BalanceEvent::Transfer {
            from: AccountId::new("a"),
            to: AccountId::new("b"),
            amount: 50,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["amount"], 50);
    }
}
