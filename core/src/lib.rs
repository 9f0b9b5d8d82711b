// Copyright (c) 2026 Mintdesk Contributors. MIT License.
// See LICENSE for details.

//! # Mintdesk — Core Library
//!
//! A capped-issuance token ledger with a built-in sale desk. Mintdesk does
//! one thing: it sells a fungible token at a fixed rate against two payment
//! currencies, and it refuses — loudly and atomically — to ever issue past
//! its cap.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! token desk:
//!
//! - **account** — Account identifiers and the two payment currencies.
//! - **ledger** — Balances, total supply, the audit log, and the cap guard.
//! - **rails** — Payment rail traits (native + wrapped) and in-memory rails.
//! - **desk** — The sale desk and its treasury: purchases and withdrawals.
//! - **service** — Thread-safe facade; one lock, whole-operation atomicity.
//! - **store** — Snapshot persistence over sled.
//! - **config** — Desk constants and construction-time configuration.
//!
//! ## Design Philosophy
//!
//! 1. Validate first, commit last. A rejected operation changes nothing.
//! 2. Every amount is checked arithmetic. Overflow is a rejection, not UB.
//! 3. External money moves bracket the internal commit: collect before
//!    mint, payout after debit, roll back when the rail refuses.
//! 4. If it touches money, it has tests. Plural.

pub mod account;
pub mod config;
pub mod desk;
pub mod ledger;
pub mod rails;
pub mod service;
pub mod store;
