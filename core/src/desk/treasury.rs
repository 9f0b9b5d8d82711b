//! # Treasury
//!
//! Per-currency bookkeeping of the proceeds the desk holds. Besides the
//! current `held` amount, the treasury tracks lifetime `credited` and
//! `withdrawn` totals so the conservation invariant can be audited at any
//! point: for each currency, `held + withdrawn == credited` — no value
//! created or destroyed inside the desk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::Currency;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during treasury operations.
#[derive(Debug, Error)]
pub enum TreasuryError {
    /// Attempted to withdraw more than the treasury holds in a currency.
    #[error("insufficient treasury: {currency} held {held}, requested {requested}")]
    InsufficientTreasury {
        /// The currency being withdrawn.
        currency: Currency,
        /// The amount currently held.
        held: u64,
        /// The amount requested.
        requested: u64,
    },

    /// A credit would overflow the lifetime counters.
    #[error("treasury overflow: {currency} credited {credited}, additional {amount}")]
    Overflow {
        /// The currency being credited.
        currency: Currency,
        /// The lifetime credited total before the failed credit.
        credited: u64,
        /// The credit amount.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// Treasury
// ---------------------------------------------------------------------------

/// Proceeds bookkeeping for one currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CurrencyBook {
    /// Amount currently held by the desk.
    held: u64,
    /// Lifetime total ever credited.
    credited: u64,
    /// Lifetime total ever withdrawn.
    withdrawn: u64,
}

/// Read-only view over one currency's books, suitable for API responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryReport {
    /// The currency this report covers.
    pub currency: Currency,
    /// Amount currently held.
    pub held: u64,
    /// Lifetime total ever credited.
    pub lifetime_credited: u64,
    /// Lifetime total ever withdrawn.
    pub lifetime_withdrawn: u64,
}

/// The desk's proceeds ledger, one book per accepted currency.
///
/// Mutated only by the sale desk (credits on purchase) and the withdrawal
/// path (debits); nothing else writes here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    native: CurrencyBook,
    wrapped: CurrencyBook,
}

impl Treasury {
    /// Creates an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, currency: Currency) -> &CurrencyBook {
        match currency {
            Currency::Native => &self.native,
            Currency::Wrapped => &self.wrapped,
        }
    }

    fn book_mut(&mut self, currency: Currency) -> &mut CurrencyBook {
        match currency {
            Currency::Native => &mut self.native,
            Currency::Wrapped => &mut self.wrapped,
        }
    }

    /// Returns the amount currently held in a currency.
    pub fn held(&self, currency: Currency) -> u64 {
        self.book(currency).held
    }

    /// Returns the lifetime total ever credited in a currency.
    pub fn lifetime_credited(&self, currency: Currency) -> u64 {
        self.book(currency).credited
    }

    /// Returns the lifetime total ever withdrawn in a currency.
    pub fn lifetime_withdrawn(&self, currency: Currency) -> u64 {
        self.book(currency).withdrawn
    }

    /// Returns a read-only report over one currency's books.
    pub fn report(&self, currency: Currency) -> TreasuryReport {
        let book = self.book(currency);
        TreasuryReport {
            currency,
            held: book.held,
            lifetime_credited: book.credited,
            lifetime_withdrawn: book.withdrawn,
        }
    }

    /// Verifies that a credit of `amount` would succeed, without applying
    /// it. The purchase path validates everything before touching the
    /// external rail so the post-collection commit cannot fail.
    pub fn check_credit(&self, currency: Currency, amount: u64) -> Result<(), TreasuryError> {
        let book = self.book(currency);
        if book.credited.checked_add(amount).is_none() || book.held.checked_add(amount).is_none() {
            return Err(TreasuryError::Overflow {
                currency,
                credited: book.credited,
                amount,
            });
        }
        Ok(())
    }

    /// Credits proceeds received in a purchase. Returns the new held amount.
    pub fn credit(&mut self, currency: Currency, amount: u64) -> Result<u64, TreasuryError> {
        self.check_credit(currency, amount)?;
        let book = self.book_mut(currency);
        book.held += amount;
        book.credited += amount;
        Ok(book.held)
    }

    /// Debits proceeds for a withdrawal. Returns the remaining held amount.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InsufficientTreasury`] if `amount` exceeds
    /// the held balance.
    pub fn debit(&mut self, currency: Currency, amount: u64) -> Result<u64, TreasuryError> {
        let book = self.book_mut(currency);
        if book.held < amount {
            return Err(TreasuryError::InsufficientTreasury {
                currency,
                held: book.held,
                requested: amount,
            });
        }
        book.held -= amount;
        book.withdrawn += amount;
        Ok(book.held)
    }

    /// Reverses a [`debit`](Self::debit) after the external payout failed.
    /// Restores `held` and rolls the lifetime `withdrawn` counter back so
    /// the conservation invariant keeps holding.
    pub(crate) fn rollback_debit(&mut self, currency: Currency, amount: u64) {
        let book = self.book_mut(currency);
        book.held += amount;
        book.withdrawn = book.withdrawn.saturating_sub(amount);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
