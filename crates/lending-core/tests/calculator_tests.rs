use chrono::NaiveDate;
use lending_core::access::{AccessScope, Requester, ScopedTable};
use lending_core::interest::{self, LoanTermsInput};
use lending_core::models::{InterestKind, LoanStatus, Payment, Role};
use lending_core::status::{classify, CreditStanding};
use lending_core::LendingError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

// ===========================================================================
// Interest & balance
// ===========================================================================

#[test]
fn test_simple_total_never_below_principal() {
    for principal in [dec!(1), dec!(250.50), dec!(1000), dec!(98765.43)] {
        for rate in [dec!(0), dec!(0.5), dec!(5), dec!(20)] {
            for days in [1u32, 15, 30, 45, 90, 365] {
                let total = interest::total_payable(principal, rate, days, InterestKind::Simple);
                assert!(
                    total >= principal.round_dp(2),
                    "simple total {total} below principal {principal} ({rate}%, {days}d)"
                );
            }
        }
    }
}

#[test]
fn test_compound_at_least_simple_beyond_one_period() {
    for rate in [dec!(1), dec!(5), dec!(12.5)] {
        for days in [45u32, 60, 75, 120, 360] {
            let s = interest::total_payable(dec!(1000), rate, days, InterestKind::Simple);
            let c = interest::total_payable(dec!(1000), rate, days, InterestKind::Compound);
            assert!(c >= s, "{rate}% over {days}d: compound {c} < simple {s}");
        }
    }
}

#[test]
fn test_modes_coincide_at_one_period() {
    for rate in [dec!(0), dec!(3), dec!(5), dec!(17.25)] {
        let s = interest::total_payable(dec!(4321), rate, 30, InterestKind::Simple);
        let c = interest::total_payable(dec!(4321), rate, 30, InterestKind::Compound);
        assert_eq!(s, c);
    }
}

#[test]
fn test_reference_values() {
    let calc = |kind, days| interest::total_payable(dec!(1000), dec!(5), days, kind);
    assert_eq!(calc(InterestKind::Simple, 30), dec!(1050.00));
    assert_eq!(calc(InterestKind::Compound, 30), dec!(1050.00));
    assert_eq!(calc(InterestKind::Simple, 60), dec!(1100.00));
    assert_eq!(calc(InterestKind::Compound, 60), dec!(1102.50));
}

#[test]
fn test_balance_idempotent_without_payments() {
    let total = interest::total_payable(dec!(1000), dec!(5), 60, InterestKind::Compound);
    assert_eq!(interest::outstanding_balance(total, Decimal::ZERO), total);
}

#[test]
fn test_loan_terms_from_form_strings() {
    let principal = interest::parse_amount("principal", "1000").unwrap();
    let rate = interest::parse_rate("interest_rate", "5").unwrap();
    let term = interest::parse_term_days("term_days", "60").unwrap();
    let out = interest::calculate_loan_terms(&LoanTermsInput {
        principal,
        interest_rate: rate,
        term_days: term,
        interest_kind: InterestKind::Simple,
        start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        previously_paid: None,
    })
    .unwrap();
    assert_eq!(out.result.total_payable, dec!(1100));
    assert_eq!(out.result.outstanding_balance, dec!(1100));
    assert_eq!(out.result.due_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_empty_form_field_rejected_before_computation() {
    match interest::parse_amount("principal", "   ") {
        Err(LendingError::InvalidInput { field, .. }) => assert_eq!(field, "principal"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

// ===========================================================================
// Scope filter
// ===========================================================================

fn payment_owned_by(owner: Uuid) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        loan_id: Uuid::new_v4(),
        amount: dec!(25),
        payment_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        kind: Default::default(),
        method: Default::default(),
        receipt_number: None,
        notes: None,
        created_at: Default::default(),
        updated_at: Default::default(),
        created_by: Some(owner),
    }
}

#[test]
fn test_scope_admin_is_full_set_lender_is_own_subset() {
    let lender = Requester::new(Uuid::new_v4(), Role::Lender);
    let admin = Requester::new(Uuid::new_v4(), Role::Admin);
    let other = Uuid::new_v4();
    let rows = vec![
        payment_owned_by(lender.id),
        payment_owned_by(other),
        payment_owned_by(lender.id),
        payment_owned_by(other),
    ];

    let all = admin.scope().filter(&rows);
    assert_eq!(all.len(), rows.len());

    let own = lender.scope().filter(&rows);
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|p| p.created_by == Some(lender.id)));
    assert!(own.len() < rows.len());
}

#[test]
fn test_same_restriction_for_every_table() {
    let lender = Requester::new(Uuid::new_v4(), Role::Lender);
    let scope = AccessScope::for_requester(&lender);
    for table in [ScopedTable::Customer, ScopedTable::Loan, ScopedTable::Payment] {
        let r = scope.restriction(table).unwrap();
        assert_eq!(r.column, "created_by");
        assert_eq!(r.value, lender.id);
    }
}

// ===========================================================================
// Classifier
// ===========================================================================

#[test]
fn test_classifier_reference_cases() {
    assert_eq!(
        classify(&[LoanStatus::Active, LoanStatus::Delinquent]),
        CreditStanding {
            in_arrears: true,
            has_active_credit: true,
            current: false
        }
    );
    assert_eq!(
        classify(&[LoanStatus::Active]),
        CreditStanding {
            in_arrears: false,
            has_active_credit: true,
            current: true
        }
    );
    assert_eq!(classify(&[]), CreditStanding::default());
}
