//! # Supply Cap Guard
//!
//! Enforces the hard ceiling on total issuance. The guard holds only the
//! immutable cap; the current supply is read from the ledger at the moment
//! of authorization, inside the same critical section as the mint itself,
//! so there is no window between check and issue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a mint would breach the supply cap.
#[derive(Debug, Error)]
#[error("cap exceeded: supply {supply} + mint {requested} would pass cap {cap}")]
pub struct CapExceeded {
    /// The configured cap.
    pub cap: u64,
    /// The total supply at authorization time.
    pub supply: u64,
    /// The mint amount that was requested.
    pub requested: u64,
}

/// Guard over the maximum total supply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyGuard {
    cap: u64,
}

impl SupplyGuard {
    /// Creates a guard with the given immutable cap.
    pub fn new(cap: u64) -> Self {
        Self { cap }
    }

    /// Returns the configured cap.
    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Authorizes minting `amount` on top of `current_supply`.
    ///
    /// Overflow-safe: a sum that wraps `u64` is treated as over the cap.
    ///
    /// # Errors
    ///
    /// Returns [`CapExceeded`] if `current_supply + amount > cap`.
    pub fn authorize_mint(&self, current_supply: u64, amount: u64) -> Result<(), CapExceeded> {
        match current_supply.checked_add(amount) {
            Some(new_supply) if new_supply <= self.cap => Ok(()),
            _ => Err(CapExceeded {
                cap: self.cap,
                supply: current_supply,
                requested: amount,
            }),
        }
    }

    /// Returns how much supply may still be issued.
    pub fn remaining(&self, current_supply: u64) -> u64 {
        self.cap.saturating_sub(current_supply)
    }
}
