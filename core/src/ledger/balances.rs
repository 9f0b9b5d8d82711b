//! # Balance Ledger
//!
//! The authoritative account → amount mapping, together with the running
//! total supply. All amounts are `u64` in smallest token units — no
//! floating point, no decimals in arithmetic.
//!
//! The ledger maintains one invariant above all others: **the sum of all
//! balances equals the total supply at every observable moment.** Transfers
//! preserve the sum; mints and burns adjust both sides together. Every
//! operation is all-or-nothing — a failed call leaves no partial effect.
//!
//! Cap enforcement is NOT this module's job. The [`SupplyGuard`] must
//! authorize a mint before [`Ledger::mint`] is called; the two steps are
//! made atomic by the service's single critical section.
//!
//! [`SupplyGuard`]: super::supply::SupplyGuard

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::events::BalanceEvent;
use crate::account::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Attempted to move or burn more than the account holds.
    #[error("insufficient balance: account {account} has {available}, requested {requested}")]
    InsufficientBalance {
        /// The account that was being debited.
        account: AccountId,
        /// The account's current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A balance credit would exceed `u64::MAX`. Unreachable while the
    /// sum-of-balances invariant holds, but money gets checked arithmetic
    /// regardless.
    #[error("balance overflow: account {account} at {current}, credit {credit}")]
    BalanceOverflow {
        /// The account that was being credited.
        account: AccountId,
        /// The balance before the failed credit.
        current: u64,
        /// The credit that caused the overflow.
        credit: u64,
    },

    /// A mint would push the total supply past `u64::MAX`.
    #[error("supply overflow: supply {supply}, mint {amount}")]
    SupplyOverflow {
        /// The supply before the failed mint.
        supply: u64,
        /// The mint amount.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The balance ledger: account balances, total supply, and the audit log.
///
/// Not `Sync` by itself — concurrent access is coordinated by the
/// [`DeskService`](crate::service::DeskService), which wraps the whole desk
/// state in one `parking_lot::Mutex` so that compound operations (cap check
/// + mint + treasury credit) appear indivisible.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Account balances in smallest token units. Absent entry == zero.
    balances: HashMap<AccountId, u64>,

    /// Running total supply. Equals the sum of all balances.
    total_supply: u64,

    /// Append-only log of every successful mutation.
    events: Vec<BalanceEvent>,
}

impl Ledger {
    /// Creates an empty ledger with zero supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of an account. Never fails; unknown accounts
    /// read as zero.
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Returns the current total supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Returns the sum of all balances. Always equals
    /// [`total_supply`](Self::total_supply); exposed so auditors and tests
    /// can verify the invariant independently.
    pub fn balance_sum(&self) -> u64 {
        self.balances.values().sum()
    }

    /// Returns the audit log of every successful mutation, in order.
    pub fn events(&self) -> &[BalanceEvent] {
        &self.events
    }

    /// Moves `amount` from one account to another.
    ///
    /// Atomic: both balances are validated before either is touched. A
    /// zero-amount transfer and a self-transfer are permitted no-ops that
    /// still appear in the audit log.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if `from` holds less
    /// than `amount`.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                available,
                requested: amount,
            });
        }

        if from != to {
            let new_to = self.balance_of(to).checked_add(amount).ok_or_else(|| {
                LedgerError::BalanceOverflow {
                    account: to.clone(),
                    current: self.balance_of(to),
                    credit: amount,
                }
            })?;

            // Validation complete — commit both sides.
            self.balances.insert(from.clone(), available - amount);
            self.balances.insert(to.clone(), new_to);
        }

        tracing::debug!(%from, %to, amount, "transfer applied");
        self.events.push(BalanceEvent::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Issues `amount` new tokens to an account, increasing total supply.
    ///
    /// The caller must have already authorized the mint against the cap.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SupplyOverflow`] or
    /// [`LedgerError::BalanceOverflow`] on arithmetic overflow.
    pub fn mint(&mut self, to: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let new_supply =
            self.total_supply
                .checked_add(amount)
                .ok_or(LedgerError::SupplyOverflow {
                    supply: self.total_supply,
                    amount,
                })?;
        let new_balance = self.balance_of(to).checked_add(amount).ok_or_else(|| {
            LedgerError::BalanceOverflow {
                account: to.clone(),
                current: self.balance_of(to),
                credit: amount,
            }
        })?;

        self.total_supply = new_supply;
        self.balances.insert(to.clone(), new_balance);

        tracing::debug!(%to, amount, supply = new_supply, "mint applied");
        self.events.push(BalanceEvent::Mint {
            to: to.clone(),
            amount,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Destroys `amount` tokens held by an account, decreasing total supply.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the account holds
    /// less than `amount`.
    pub fn burn(&mut self, from: &AccountId, amount: u64) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                available,
                requested: amount,
            });
        }

        self.balances.insert(from.clone(), available - amount);
        // amount <= balance <= total_supply, so this cannot underflow.
        self.total_supply = self.total_supply.saturating_sub(amount);

        tracing::debug!(%from, amount, supply = self.total_supply, "burn applied");
        self.events.push(BalanceEvent::Burn {
            from: from.clone(),
            amount,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
