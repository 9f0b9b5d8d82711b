//! # External Settlement Rails
//!
//! The desk's only contact with the outside world. Two collaborators are
//! modeled as traits:
//!
//! - [`NativeRail`] — the value-transfer rail carrying the native payment
//!   asset. It escrows attached payment before a purchase reaches the desk
//!   and executes push payouts for withdrawals.
//! - [`WrappedLedger`] — the wrapped-asset token ledger, with the usual
//!   allowance mechanics: the buyer pre-approves the desk as spender, and
//!   the desk pulls payment via `transfer_from`.
//!
//! Both are fallible at every call. The desk treats a rail error as a full
//! abort — it never commits internal state before the rail confirms, and a
//! failed payout rolls the treasury back.
//!
//! The [`memory`] submodule provides in-memory reference rails. They stand
//! in for the real settlement environment in tests and in the devnet node,
//! the same way a stubbed consensus loop stands in for a real one.

use thiserror::Error;

use crate::account::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by an external rail.
#[derive(Debug, Error)]
pub enum RailError {
    /// The buyer has not approved the desk for at least the requested
    /// amount on the wrapped-asset ledger.
    #[error("allowance insufficient: owner {owner} approved {approved} for {spender}, requested {requested}")]
    AllowanceInsufficient {
        /// The wrapped-asset holder.
        owner: AccountId,
        /// The approved spender (the desk).
        spender: AccountId,
        /// The currently approved amount.
        approved: u64,
        /// The amount the desk tried to pull.
        requested: u64,
    },

    /// The paying account does not hold enough of the asset on the rail.
    #[error("insufficient funds on rail: account {account} has {available}, requested {requested}")]
    InsufficientFunds {
        /// The account that was being debited on the rail.
        account: AccountId,
        /// Its balance on the rail.
        available: u64,
        /// The amount requested.
        requested: u64,
    },

    /// The rail refused the instruction for a reason of its own
    /// (connectivity, downstream revert, etc.).
    #[error("rail rejected the transfer: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The native value-transfer rail.
pub trait NativeRail {
    /// Takes custody of `amount` attached by `from`. Called by the desk
    /// after the cap check has passed, so a failing purchase never leaves
    /// payment in the desk's custody.
    fn collect(&mut self, from: &AccountId, amount: u64) -> Result<(), RailError>;

    /// Pushes `amount` from the desk's custody to `to`. Used for owner
    /// withdrawals; always the last step of the operation.
    fn payout(&mut self, to: &AccountId, amount: u64) -> Result<(), RailError>;
}

/// The wrapped-asset token ledger (external, not reimplemented here).
pub trait WrappedLedger {
    /// Returns how much `spender` may currently pull from `owner`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64;

    /// Returns `account`'s wrapped-asset balance.
    fn balance_of(&self, account: &AccountId) -> u64;

    /// Pulls `amount` from `owner` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), RailError>;

    /// Pushes `amount` from `from` to `to` directly.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), RailError>;
}

// ---------------------------------------------------------------------------
// In-memory reference rails
// ---------------------------------------------------------------------------

/// In-memory stand-ins for the settlement environment.
pub mod memory {
    use std::collections::HashMap;

    use super::{NativeRail, RailError, WrappedLedger};
    use crate::account::AccountId;

    /// An in-memory native rail. Holds per-account native balances plus
    /// the desk's custody account; `collect` moves buyer → desk custody,
    /// `payout` moves desk custody → recipient.
    #[derive(Clone, Debug, Default)]
    pub struct MemoryNativeRail {
        balances: HashMap<AccountId, u64>,
        /// Amount currently held in the desk's custody.
        desk_held: u64,
    }

    impl MemoryNativeRail {
        /// Creates an empty rail.
        pub fn new() -> Self {
            Self::default()
        }

        /// Credits `amount` of the native asset to an account, as if it
        /// arrived from outside the system. Devnet faucet semantics;
        /// saturates at `u64::MAX` rather than wrapping.
        pub fn seed(&mut self, account: &AccountId, amount: u64) {
            let entry = self.balances.entry(account.clone()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }

        /// Returns an account's native balance on the rail.
        pub fn balance_of(&self, account: &AccountId) -> u64 {
            self.balances.get(account).copied().unwrap_or(0)
        }

        /// Returns the amount held in the desk's custody.
        pub fn desk_held(&self) -> u64 {
            self.desk_held
        }
    }

    impl NativeRail for MemoryNativeRail {
        fn collect(&mut self, from: &AccountId, amount: u64) -> Result<(), RailError> {
            let available = self.balance_of(from);
            if available < amount {
                return Err(RailError::InsufficientFunds {
                    account: from.clone(),
                    available,
                    requested: amount,
                });
            }
            let held = self.desk_held.checked_add(amount).ok_or_else(|| {
                RailError::Rejected(format!(
                    "desk custody overflow: held {}, credit {amount}",
                    self.desk_held
                ))
            })?;
            self.balances.insert(from.clone(), available - amount);
            self.desk_held = held;
            Ok(())
        }

        fn payout(&mut self, to: &AccountId, amount: u64) -> Result<(), RailError> {
            if self.desk_held < amount {
                return Err(RailError::InsufficientFunds {
                    account: AccountId::new("desk custody"),
                    available: self.desk_held,
                    requested: amount,
                });
            }
            let credited = self.balance_of(to).checked_add(amount).ok_or_else(|| {
                RailError::Rejected(format!("native balance overflow crediting {to}"))
            })?;
            self.desk_held -= amount;
            self.balances.insert(to.clone(), credited);
            Ok(())
        }
    }

    /// An in-memory wrapped-asset ledger with ERC-20-style allowances:
    /// an `(owner, spender)` pair maps to the amount the spender may still
    /// pull, reduced on every `transfer_from`.
    #[derive(Clone, Debug, Default)]
    pub struct MemoryWrappedLedger {
        balances: HashMap<AccountId, u64>,
        allowances: HashMap<(AccountId, AccountId), u64>,
    }

    impl MemoryWrappedLedger {
        /// Creates an empty wrapped ledger.
        pub fn new() -> Self {
            Self::default()
        }

        /// Credits `amount` of the wrapped asset to an account. Devnet
        /// faucet semantics; saturates at `u64::MAX` rather than wrapping.
        pub fn seed(&mut self, account: &AccountId, amount: u64) {
            let entry = self.balances.entry(account.clone()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }

        /// Sets (replaces) the allowance `owner` grants to `spender`.
        pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u64) {
            self.allowances
                .insert((owner.clone(), spender.clone()), amount);
        }
    }

    impl WrappedLedger for MemoryWrappedLedger {
        fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
            self.allowances
                .get(&(owner.clone(), spender.clone()))
                .copied()
                .unwrap_or(0)
        }

        fn balance_of(&self, account: &AccountId) -> u64 {
            self.balances.get(account).copied().unwrap_or(0)
        }

        fn transfer_from(
            &mut self,
            owner: &AccountId,
            spender: &AccountId,
            to: &AccountId,
            amount: u64,
        ) -> Result<(), RailError> {
            let approved = self.allowance(owner, spender);
            if approved < amount {
                return Err(RailError::AllowanceInsufficient {
                    owner: owner.clone(),
                    spender: spender.clone(),
                    approved,
                    requested: amount,
                });
            }

            self.transfer(owner, to, amount)?;
            self.allowances
                .insert((owner.clone(), spender.clone()), approved - amount);
            Ok(())
        }

        fn transfer(
            &mut self,
            from: &AccountId,
            to: &AccountId,
            amount: u64,
        ) -> Result<(), RailError> {
            let available = self.balance_of(from);
            if available < amount {
                return Err(RailError::InsufficientFunds {
                    account: from.clone(),
                    available,
                    requested: amount,
                });
            }
            if from != to {
                let credited = self.balance_of(to).checked_add(amount).ok_or_else(|| {
                    RailError::Rejected(format!("wrapped balance overflow crediting {to}"))
                })?;
                self.balances.insert(from.clone(), available - amount);
                self.balances.insert(to.clone(), credited);
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
