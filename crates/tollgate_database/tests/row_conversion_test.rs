//! Tests for conversions between database rows and ledger types.

use chrono::{TimeZone, Utc};
use tollgate_core::Plan;
use tollgate_error::StoreErrorKind;
use tollgate_database::{CreditBalanceRow, CreditTransactionRow};
use tollgate_ledger::{CreditBalance, CreditSource, CreditTransaction};
use uuid::Uuid;

fn balance_row() -> CreditBalanceRow {
    CreditBalanceRow {
        user_id: "user-1".to_string(),
        plan: "creator".to_string(),
        monthly_allowance: 300,
        monthly_used: 12,
        purchased_remaining: 40,
        period_end: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn test_balance_row_to_domain() {
    let balance = CreditBalance::try_from(balance_row()).unwrap();
    assert_eq!(balance.plan, Plan::Creator);
    assert_eq!(balance.remaining(), 328);

    let row = CreditBalanceRow::try_from(&balance).unwrap();
    assert_eq!(row, balance_row());
}

#[test]
fn test_unknown_plan_is_serialization_error() {
    let mut row = balance_row();
    row.plan = "enterprise".to_string();
    let err = CreditBalance::try_from(row).unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::Serialization(_)));
}

#[test]
fn test_negative_column_is_rejected() {
    let mut row = balance_row();
    row.purchased_remaining = -1;
    let err = CreditBalance::try_from(row).unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::Serialization(_)));
}

#[test]
fn test_oversized_count_is_rejected() {
    let mut balance = CreditBalance::try_from(balance_row()).unwrap();
    balance.purchased_remaining = u32::MAX;
    assert!(CreditBalanceRow::try_from(&balance).is_err());
}

#[test]
fn test_transaction_row_round_trip() {
    let record = CreditTransaction::new(
        "user-1",
        -1,
        CreditSource::Purchased,
        "image generation",
        39,
        Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
    );
    let row = CreditTransactionRow::try_from(&record).unwrap();
    assert_eq!(row.source, "purchased");
    assert_eq!(CreditTransaction::try_from(row).unwrap(), record);
}

#[test]
fn test_unknown_source_is_rejected() {
    let row = CreditTransactionRow {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        amount: -1,
        source: "refund".to_string(),
        reason: "n/a".to_string(),
        balance_after: 0,
        created_at: Utc::now(),
    };
    assert!(CreditTransaction::try_from(row).is_err());
}
