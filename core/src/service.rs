//! # Desk Service
//!
//! Thread-safe facade over the [`SaleDesk`] and its rails. Every compound
//! operation acquires one mutex for its full duration, so concurrent
//! callers observe each operation as all-or-nothing: two purchases racing
//! for the last slice of supply are serialized, and exactly one of them
//! sees the cap.
//!
//! The service owns the rails alongside the desk so collection, commit,
//! and payout all happen inside the same critical section.

use parking_lot::Mutex;

use crate::account::{AccountId, Currency};
use crate::config::DeskConfig;
use crate::desk::{
    DeskError, DeskSnapshot, PurchaseReceipt, SaleDesk, TreasuryReport, WithdrawalReceipt,
};
use crate::ledger::BalanceEvent;
use crate::rails::{NativeRail, WrappedLedger};

struct DeskInner<N, W> {
    desk: SaleDesk,
    native: N,
    wrapped: W,
}

/// Shared-state desk service. Cheap to share behind an `Arc`; all methods
/// take `&self`.
pub struct DeskService<N, W> {
    inner: Mutex<DeskInner<N, W>>,
}

impl<N: NativeRail, W: WrappedLedger> DeskService<N, W> {
    /// Builds a fresh desk from `config` and wires it to the given rails.
    pub fn new(config: DeskConfig, native: N, wrapped: W) -> Result<Self, DeskError> {
        let desk = SaleDesk::new(config)?;
        Ok(Self {
            inner: Mutex::new(DeskInner {
                desk,
                native,
                wrapped,
            }),
        })
    }

    /// Rebuilds the service from a persisted snapshot.
    pub fn restore(snapshot: DeskSnapshot, native: N, wrapped: W) -> Result<Self, DeskError> {
        let desk = SaleDesk::restore(snapshot)?;
        Ok(Self {
            inner: Mutex::new(DeskInner {
                desk,
                native,
                wrapped,
            }),
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Returns an account's token balance.
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.inner.lock().desk.balance_of(account)
    }

    /// Returns the current total supply.
    pub fn total_supply(&self) -> u64 {
        self.inner.lock().desk.total_supply()
    }

    /// Returns the supply cap.
    pub fn cap(&self) -> u64 {
        self.inner.lock().desk.cap()
    }

    /// Returns the fixed exchange rate.
    pub fn exchange_rate(&self) -> u64 {
        self.inner.lock().desk.exchange_rate()
    }

    /// Returns how much supply may still be issued.
    pub fn remaining_supply(&self) -> u64 {
        self.inner.lock().desk.remaining_supply()
    }

    /// Returns the owner account.
    pub fn owner(&self) -> AccountId {
        self.inner.lock().desk.owner().clone()
    }

    /// Returns current treasury holdings in `currency`.
    pub fn treasury_held(&self, currency: Currency) -> u64 {
        self.inner.lock().desk.treasury().held(currency)
    }

    /// Returns the treasury report for `currency`.
    pub fn treasury_report(&self, currency: Currency) -> TreasuryReport {
        self.inner.lock().desk.treasury().report(currency)
    }

    /// Returns a copy of the audit log.
    pub fn events(&self) -> Vec<BalanceEvent> {
        self.inner.lock().desk.events().to_vec()
    }

    /// Captures the desk's persistable state.
    pub fn snapshot(&self) -> DeskSnapshot {
        self.inner.lock().desk.snapshot()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Moves tokens between two accounts.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), DeskError> {
        self.inner.lock().desk.transfer(from, to, amount)
    }

    /// Purchases tokens with native payment.
    pub fn buy_with_native(
        &self,
        buyer: &AccountId,
        payment: u64,
    ) -> Result<PurchaseReceipt, DeskError> {
        let inner = &mut *self.inner.lock();
        inner.desk.buy_with_native(&mut inner.native, buyer, payment)
    }

    /// Purchases tokens with the wrapped asset.
    pub fn buy_with_wrapped(
        &self,
        buyer: &AccountId,
        payment: u64,
    ) -> Result<PurchaseReceipt, DeskError> {
        let inner = &mut *self.inner.lock();
        inner.desk.buy_with_wrapped(&mut inner.wrapped, buyer, payment)
    }

    /// Withdraws proceeds to the owner. Owner-gated.
    pub fn withdraw(
        &self,
        currency: Currency,
        amount: u64,
        requester: &AccountId,
    ) -> Result<WithdrawalReceipt, DeskError> {
        let inner = &mut *self.inner.lock();
        inner.desk.withdraw(
            &mut inner.native,
            &mut inner.wrapped,
            currency,
            amount,
            requester,
        )
    }

    /// Runs `f` with shared access to the rails. Test and devnet hook.
    pub fn with_rails<T>(&self, f: impl FnOnce(&N, &W) -> T) -> T {
        let inner = self.inner.lock();
        f(&inner.native, &inner.wrapped)
    }

    /// Runs `f` with exclusive access to the rails. Test and devnet hook
    /// for seeding balances and allowances.
    pub fn with_rails_mut<T>(&self, f: impl FnOnce(&mut N, &mut W) -> T) -> T {
        let inner = &mut *self.inner.lock();
        f(&mut inner.native, &mut inner.wrapped)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
