//! Integration tests for the full sale desk lifecycle.
//!
//! These tests exercise complete flows across module boundaries: transfers
//! between accounts, purchases in both currencies, cap enforcement at the
//! boundary, treasury accounting through mixed activity, and snapshot
//! recovery.

use mintdesk_core::account::{AccountId, Currency};
use mintdesk_core::config::DeskConfig;
use mintdesk_core::desk::{DeskError, SaleDesk};
use mintdesk_core::ledger::BalanceEvent;
use mintdesk_core::rails::memory::{MemoryNativeRail, MemoryWrappedLedger};
use mintdesk_core::rails::{RailError, WrappedLedger};
use mintdesk_core::service::DeskService;
use mintdesk_core::store::DeskStore;

const CAP: u64 = 1_080_000;
const INITIAL_SUPPLY: u64 = 1_000_000;
const RATE: u64 = 8;

fn acct(s: &str) -> AccountId {
    AccountId::new(s)
}

/// Helper: a fresh desk with the default config, plus empty rails.
fn setup() -> (SaleDesk, MemoryNativeRail, MemoryWrappedLedger) {
    let desk = SaleDesk::new(DeskConfig::with_owner("owner")).unwrap();
    (desk, MemoryNativeRail::new(), MemoryWrappedLedger::new())
}

// ---------------------------------------------------------------------------
// Transfer Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn owner_starts_with_full_initial_supply() {
    let (desk, _, _) = setup();
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY);
    assert_eq!(desk.balance_of(&acct("owner")), INITIAL_SUPPLY);
    assert_eq!(desk.cap(), CAP);
}

#[test]
fn transfer_moves_exact_amount_between_accounts() {
    let (mut desk, _, _) = setup();

    desk.transfer(&acct("owner"), &acct("addr1"), 7).unwrap();

    assert_eq!(desk.balance_of(&acct("addr1")), 7);
    assert_eq!(desk.balance_of(&acct("owner")), INITIAL_SUPPLY - 7);
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY);
}

#[test]
fn chained_transfers_conserve_supply() {
    let (mut desk, _, _) = setup();

    desk.transfer(&acct("owner"), &acct("addr1"), 500).unwrap();
    desk.transfer(&acct("addr1"), &acct("addr2"), 200).unwrap();
    desk.transfer(&acct("addr2"), &acct("addr1"), 50).unwrap();

    assert_eq!(desk.balance_of(&acct("addr1")), 350);
    assert_eq!(desk.balance_of(&acct("addr2")), 150);
    let sum = desk.balance_of(&acct("owner"))
        + desk.balance_of(&acct("addr1"))
        + desk.balance_of(&acct("addr2"));
    assert_eq!(sum, desk.total_supply());
}

#[test]
fn transfer_beyond_balance_changes_nothing() {
    let (mut desk, _, _) = setup();
    desk.transfer(&acct("owner"), &acct("addr1"), 10).unwrap();

    let result = desk.transfer(&acct("addr1"), &acct("addr2"), 11);
    assert!(matches!(result, Err(DeskError::Ledger(_))));

    assert_eq!(desk.balance_of(&acct("addr1")), 10);
    assert_eq!(desk.balance_of(&acct("addr2")), 0);
}

#[test]
fn transfer_from_unknown_account_rejected() {
    let (mut desk, _, _) = setup();
    let result = desk.transfer(&acct("ghost"), &acct("addr1"), 1);
    assert!(matches!(result, Err(DeskError::Ledger(_))));
}

// ---------------------------------------------------------------------------
// Native Purchases
// ---------------------------------------------------------------------------

#[test]
fn native_purchase_settles_all_three_legs() {
    let (mut desk, mut native, _) = setup();
    native.seed(&acct("addr1"), 100);

    let receipt = desk.buy_with_native(&mut native, &acct("addr1"), 10).unwrap();

    // Mint leg.
    assert_eq!(receipt.tokens_minted, 10 * RATE);
    assert_eq!(desk.balance_of(&acct("addr1")), 80);
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY + 80);
    // Payment leg.
    assert_eq!(native.balance_of(&acct("addr1")), 90);
    assert_eq!(native.desk_held(), 10);
    // Treasury leg.
    assert_eq!(desk.treasury().held(Currency::Native), 10);
}

#[test]
fn repeated_purchases_accumulate() {
    let (mut desk, mut native, _) = setup();
    native.seed(&acct("addr1"), 100);

    desk.buy_with_native(&mut native, &acct("addr1"), 3).unwrap();
    desk.buy_with_native(&mut native, &acct("addr1"), 4).unwrap();

    assert_eq!(desk.balance_of(&acct("addr1")), 56);
    assert_eq!(desk.treasury().held(Currency::Native), 7);
    assert_eq!(desk.treasury().lifetime_credited(Currency::Native), 7);
}

#[test]
fn purchase_without_funds_rejected_by_rail() {
    let (mut desk, mut native, _) = setup();

    let result = desk.buy_with_native(&mut native, &acct("addr1"), 5);
    assert!(matches!(
        result,
        Err(DeskError::Rail(RailError::InsufficientFunds { .. }))
    ));
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY);
}

// ---------------------------------------------------------------------------
// Wrapped Purchases
// ---------------------------------------------------------------------------

#[test]
fn wrapped_purchase_pulls_via_allowance() {
    let (mut desk, _, mut wrapped) = setup();
    wrapped.seed(&acct("addr1"), 1_000);
    wrapped.approve(&acct("addr1"), &acct("desk"), 600);

    let receipt = desk
        .buy_with_wrapped(&mut wrapped, &acct("addr1"), 500)
        .unwrap();

    assert_eq!(receipt.tokens_minted, 4_000);
    assert_eq!(desk.balance_of(&acct("addr1")), 4_000);
    assert_eq!(wrapped.balance_of(&acct("addr1")), 500);
    assert_eq!(wrapped.balance_of(&acct("desk")), 500);
    assert_eq!(wrapped.allowance(&acct("addr1"), &acct("desk")), 100);
    assert_eq!(desk.treasury().held(Currency::Wrapped), 500);
}

#[test]
fn wrapped_purchase_without_approval_rejected() {
    let (mut desk, _, mut wrapped) = setup();
    wrapped.seed(&acct("addr1"), 1_000);

    let result = desk.buy_with_wrapped(&mut wrapped, &acct("addr1"), 500);
    assert!(matches!(
        result,
        Err(DeskError::Rail(RailError::AllowanceInsufficient { .. }))
    ));

    // No tokens minted, no wrapped asset moved, no allowance consumed.
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY);
    assert_eq!(wrapped.balance_of(&acct("addr1")), 1_000);
    assert_eq!(desk.treasury().held(Currency::Wrapped), 0);
}

#[test]
fn wrapped_purchase_with_partial_approval_rejected() {
    let (mut desk, _, mut wrapped) = setup();
    wrapped.seed(&acct("addr1"), 1_000);
    wrapped.approve(&acct("addr1"), &acct("desk"), 499);

    let result = desk.buy_with_wrapped(&mut wrapped, &acct("addr1"), 500);
    assert!(matches!(
        result,
        Err(DeskError::Rail(RailError::AllowanceInsufficient { .. }))
    ));
    assert_eq!(wrapped.allowance(&acct("addr1"), &acct("desk")), 499);
}

// ---------------------------------------------------------------------------
// Cap Enforcement
// ---------------------------------------------------------------------------

#[test]
fn purchase_filling_exact_headroom_succeeds() {
    let (mut desk, mut native, _) = setup();
    let headroom_payment = (CAP - INITIAL_SUPPLY) / RATE; // 10_000
    native.seed(&acct("addr1"), headroom_payment);

    desk.buy_with_native(&mut native, &acct("addr1"), headroom_payment)
        .unwrap();

    assert_eq!(desk.total_supply(), CAP);
    assert_eq!(desk.remaining_supply(), 0);
}

#[test]
fn purchase_past_cap_rejected_and_payment_untouched() {
    let (mut desk, mut native, _) = setup();
    let headroom_payment = (CAP - INITIAL_SUPPLY) / RATE;
    native.seed(&acct("addr1"), headroom_payment + 1);

    let result = desk.buy_with_native(&mut native, &acct("addr1"), headroom_payment + 1);
    assert!(matches!(result, Err(DeskError::Cap(_))));

    // The buyer keeps every payment unit; nothing was minted or credited.
    assert_eq!(native.balance_of(&acct("addr1")), headroom_payment + 1);
    assert_eq!(native.desk_held(), 0);
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY);
    assert_eq!(desk.treasury().held(Currency::Native), 0);
}

#[test]
fn cap_applies_across_both_currencies() {
    let (mut desk, mut native, mut wrapped) = setup();
    native.seed(&acct("addr1"), 6_000);
    wrapped.seed(&acct("addr2"), 6_000);
    wrapped.approve(&acct("addr2"), &acct("desk"), 6_000);

    desk.buy_with_native(&mut native, &acct("addr1"), 6_000).unwrap();

    // 48_000 of 80_000 headroom used; 6_000 more units would need 48_000.
    let result = desk.buy_with_wrapped(&mut wrapped, &acct("addr2"), 6_000);
    assert!(matches!(result, Err(DeskError::Cap(_))));

    // A smaller wrapped purchase within headroom still goes through.
    desk.buy_with_wrapped(&mut wrapped, &acct("addr2"), 4_000).unwrap();
    assert_eq!(desk.total_supply(), CAP);
}

#[test]
fn cap_rejection_leaves_desk_usable() {
    let (mut desk, mut native, _) = setup();
    native.seed(&acct("addr1"), 20_000);

    assert!(desk.buy_with_native(&mut native, &acct("addr1"), 20_000).is_err());
    desk.buy_with_native(&mut native, &acct("addr1"), 1_000).unwrap();
    assert_eq!(desk.total_supply(), INITIAL_SUPPLY + 8_000);
}

// ---------------------------------------------------------------------------
// Withdrawals
// ---------------------------------------------------------------------------

#[test]
fn owner_withdraws_native_proceeds() {
    let (mut desk, mut native, mut wrapped) = setup();
    native.seed(&acct("addr1"), 100);
    desk.buy_with_native(&mut native, &acct("addr1"), 100).unwrap();

    let receipt = desk
        .withdraw(&mut native, &mut wrapped, Currency::Native, 60, &acct("owner"))
        .unwrap();

    assert_eq!(receipt.amount, 60);
    assert_eq!(receipt.remaining_held, 40);
    assert_eq!(native.balance_of(&acct("owner")), 60);
    assert_eq!(native.desk_held(), 40);
    assert_eq!(desk.treasury().held(Currency::Native), 40);
    assert_eq!(desk.treasury().lifetime_withdrawn(Currency::Native), 60);
}

#[test]
fn owner_withdraws_wrapped_proceeds() {
    let (mut desk, mut native, mut wrapped) = setup();
    wrapped.seed(&acct("addr1"), 300);
    wrapped.approve(&acct("addr1"), &acct("desk"), 300);
    desk.buy_with_wrapped(&mut wrapped, &acct("addr1"), 300).unwrap();

    desk.withdraw(&mut native, &mut wrapped, Currency::Wrapped, 300, &acct("owner"))
        .unwrap();

    assert_eq!(wrapped.balance_of(&acct("owner")), 300);
    assert_eq!(wrapped.balance_of(&acct("desk")), 0);
    assert_eq!(desk.treasury().held(Currency::Wrapped), 0);
}

#[test]
fn non_owner_withdrawal_rejected_before_any_accounting() {
    let (mut desk, mut native, mut wrapped) = setup();
    native.seed(&acct("addr1"), 10);
    desk.buy_with_native(&mut native, &acct("addr1"), 10).unwrap();

    let result = desk.withdraw(&mut native, &mut wrapped, Currency::Native, 5, &acct("addr1"));
    assert!(matches!(result, Err(DeskError::NotAuthorized { .. })));
    assert_eq!(desk.treasury().held(Currency::Native), 10);
}

#[test]
fn withdrawal_beyond_holdings_rejected() {
    let (mut desk, mut native, mut wrapped) = setup();
    native.seed(&acct("addr1"), 10);
    desk.buy_with_native(&mut native, &acct("addr1"), 10).unwrap();

    let result = desk.withdraw(&mut native, &mut wrapped, Currency::Native, 11, &acct("owner"));
    assert!(matches!(result, Err(DeskError::Treasury(_))));
    assert_eq!(desk.treasury().held(Currency::Native), 10);
}

#[test]
fn treasuries_are_segregated_per_currency() {
    let (mut desk, mut native, mut wrapped) = setup();
    native.seed(&acct("addr1"), 50);
    desk.buy_with_native(&mut native, &acct("addr1"), 50).unwrap();

    // Native proceeds cannot be pulled out of the wrapped book.
    let result = desk.withdraw(&mut native, &mut wrapped, Currency::Wrapped, 50, &acct("owner"));
    assert!(matches!(result, Err(DeskError::Treasury(_))));
    assert_eq!(desk.treasury().held(Currency::Native), 50);
}

// ---------------------------------------------------------------------------
// Audit Log
// ---------------------------------------------------------------------------

#[test]
fn audit_log_records_every_settled_operation_in_order() {
    let (mut desk, mut native, _) = setup();
    native.seed(&acct("addr1"), 10);

    desk.transfer(&acct("owner"), &acct("addr1"), 1).unwrap();
    desk.buy_with_native(&mut native, &acct("addr1"), 2).unwrap();

    let events = desk.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], BalanceEvent::Mint { amount: INITIAL_SUPPLY, .. }));
    assert!(matches!(events[1], BalanceEvent::Transfer { amount: 1, .. }));
    assert!(matches!(events[2], BalanceEvent::Mint { amount: 16, .. }));
}

#[test]
fn rejected_operations_leave_no_audit_entries() {
    let (mut desk, mut native, _) = setup();
    let before = desk.events().len();

    let _ = desk.transfer(&acct("ghost"), &acct("addr1"), 1);
    let _ = desk.buy_with_native(&mut native, &acct("addr1"), 5);

    assert_eq!(desk.events().len(), before);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn desk_recovers_from_persisted_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = DeskStore::open(dir.path()).unwrap();

    let (mut desk, mut native, _) = setup();
    native.seed(&acct("addr1"), 25);
    desk.buy_with_native(&mut native, &acct("addr1"), 25).unwrap();
    store.save(&desk.snapshot()).unwrap();

    let snapshot = store.load().unwrap().unwrap();
    let recovered = SaleDesk::restore(snapshot).unwrap();

    assert_eq!(recovered.total_supply(), INITIAL_SUPPLY + 200);
    assert_eq!(recovered.balance_of(&acct("addr1")), 200);
    assert_eq!(recovered.treasury().held(Currency::Native), 25);
    assert_eq!(recovered.events().len(), desk.events().len());
}

// ---------------------------------------------------------------------------
// Service Invariants
// ---------------------------------------------------------------------------

#[test]
fn service_preserves_conservation_under_mixed_activity() {
    let svc = DeskService::new(
        DeskConfig::with_owner("owner"),
        MemoryNativeRail::new(),
        MemoryWrappedLedger::new(),
    )
    .unwrap();
    svc.with_rails_mut(|native, wrapped| {
        native.seed(&acct("addr1"), 1_000);
        wrapped.seed(&acct("addr2"), 1_000);
        wrapped.approve(&acct("addr2"), &acct("desk"), 1_000);
    });

    svc.buy_with_native(&acct("addr1"), 400).unwrap();
    svc.buy_with_wrapped(&acct("addr2"), 700).unwrap();
    svc.transfer(&acct("addr1"), &acct("addr2"), 1_000).unwrap();
    svc.withdraw(Currency::Native, 150, &acct("owner")).unwrap();
    svc.withdraw(Currency::Wrapped, 700, &acct("owner")).unwrap();

    // Supply: conserved by transfers, grown only by mints, under the cap.
    let sum = svc.balance_of(&acct("owner"))
        + svc.balance_of(&acct("addr1"))
        + svc.balance_of(&acct("addr2"));
    assert_eq!(sum, svc.total_supply());
    assert_eq!(svc.total_supply(), INITIAL_SUPPLY + 400 * RATE + 700 * RATE);
    assert!(svc.total_supply() <= svc.cap());

    // Treasury: held + withdrawn == credited, in each currency.
    for currency in [Currency::Native, Currency::Wrapped] {
        let report = svc.treasury_report(currency);
        assert_eq!(
            report.held + report.lifetime_withdrawn,
            report.lifetime_credited
        );
    }
}
