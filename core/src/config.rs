//! # Desk Configuration & Constants
//!
//! Every fixed parameter of the desk lives here. The cap, the exchange
//! rate, and the owner are set once at construction and never change —
//! there is no pause state, no ownership transfer, and no dynamic pricing.
//! Anything that looks like it should be mutable at runtime belongs in the
//! ledger or the treasury, not in this module.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::AccountId;

// ---------------------------------------------------------------------------
// Protocol Constants
// ---------------------------------------------------------------------------

/// Tokens minted per unit of payment, identical for both currencies.
///
/// Conversion is truncating integer multiplication — no fractional token
/// units exist, and the rate is never recomputed from market data.
pub const DEFAULT_EXCHANGE_RATE: u64 = 8;

/// Default maximum total supply in smallest token units.
pub const DEFAULT_SUPPLY_CAP: u64 = 1_080_000;

/// Default supply pre-minted to the owner at construction.
pub const DEFAULT_INITIAL_SUPPLY: u64 = 1_000_000;

/// Account under which the desk itself holds collected payment on the
/// external rails (the contract-address equivalent).
pub const DEFAULT_DESK_ACCOUNT: &str = "desk";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised when validating a [`DeskConfig`] at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The pre-minted supply cannot exceed the cap.
    #[error("initial supply {initial_supply} exceeds cap {cap}")]
    InitialSupplyExceedsCap {
        /// The configured pre-mint amount.
        initial_supply: u64,
        /// The configured supply cap.
        cap: u64,
    },

    /// A zero exchange rate would make every purchase mint nothing.
    #[error("exchange rate must be non-zero")]
    ZeroExchangeRate,
}

// ---------------------------------------------------------------------------
// DeskConfig
// ---------------------------------------------------------------------------

/// Immutable construction-time configuration for the desk.
///
/// All fields are fixed for the lifetime of the desk. The config is part of
/// the persisted snapshot so that a restored desk keeps the exact terms it
/// was created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// The single privileged account. Only the owner may withdraw treasury
    /// proceeds; every other operation is open to any account.
    pub owner: AccountId,

    /// The desk's own account on the external rails. Collected wrapped
    /// payments are held under this account, and the buyer's allowance
    /// must name it as the spender.
    pub desk_account: AccountId,

    /// Maximum total token supply that may ever exist.
    pub cap: u64,

    /// Tokens minted per unit of payment (both currencies).
    pub exchange_rate: u64,

    /// Supply minted to the owner when the desk is constructed.
    pub initial_supply: u64,
}

impl DeskConfig {
    /// Creates a config with the given owner and the default cap, rate,
    /// desk account, and initial supply.
    pub fn with_owner(owner: impl Into<AccountId>) -> Self {
        Self {
            owner: owner.into(),
            desk_account: AccountId::new(DEFAULT_DESK_ACCOUNT),
            cap: DEFAULT_SUPPLY_CAP,
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
        }
    }

    /// Validates internal consistency. Called by the desk constructor —
    /// a config that fails here never produces a running desk.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange_rate == 0 {
            return Err(ConfigError::ZeroExchangeRate);
        }
        if self.initial_supply > self.cap {
            return Err(ConfigError::InitialSupplyExceedsCap {
                initial_supply: self.initial_supply,
                cap: self.cap,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
