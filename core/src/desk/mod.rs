//! # Desk
//!
//! The sale desk and its treasury: fixed-rate dual-currency purchases,
//! proceeds accounting, and owner-gated withdrawals.

pub mod sale;
pub mod treasury;

pub use sale::{DeskError, DeskSnapshot, PurchaseReceipt, SaleDesk, WithdrawalReceipt};
pub use treasury::{Treasury, TreasuryError, TreasuryReport};
