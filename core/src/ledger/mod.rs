//! # Ledger Module — Balances, Supply Cap, Audit Events
//!
//! ```text
//! balances.rs — account → amount map, transfer / mint / burn
//! supply.rs   — hard cap on total issuance
//! events.rs   — append-only audit log of every mutation
//! ```
//!
//! All amounts are `u64` in smallest token units; all additions are
//! checked. The ledger owns balance state exclusively — nothing outside
//! this module writes a balance directly.

pub mod balances;
pub mod events;
pub mod supply;

pub use balances::{Ledger, LedgerError};
pub use events::BalanceEvent;
pub use supply::{CapExceeded, SupplyGuard};
