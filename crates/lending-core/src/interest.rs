//! Total payable, outstanding balance and due date for a loan.
//!
//! Rates are percent per 30-day period. Simple interest grows linearly with
//! the number of periods; compound interest capitalises once per period.
//! Fractional periods are allowed (a 45-day term is 1.5 periods).

use chrono::Days as CalendarDays;
use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LendingError;
use crate::models::InterestKind;
use crate::types::{with_metadata, ComputationOutput, Date, Days, Money, Percent};
use crate::LendingResult;

/// Length of one interest period in days.
pub const PERIOD_DAYS: Decimal = dec!(30);

/// Rate used by new loan forms when no configuration default exists.
pub const FALLBACK_RATE: Percent = dec!(5.0);

const MONEY_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTermsInput {
    pub principal: Money,
    /// Percent per 30-day period.
    pub interest_rate: Percent,
    pub term_days: Days,
    #[serde(default)]
    pub interest_kind: InterestKind,
    pub start_date: Date,
    /// Amount already recorded against the loan. Zero for new loans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previously_paid: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTermsOutput {
    pub total_payable: Money,
    /// total_payable - principal.
    pub interest_amount: Money,
    pub outstanding_balance: Money,
    pub due_date: Date,
    /// term_days / 30.
    pub periods: Decimal,
}

// ---------------------------------------------------------------------------
// Core formulas
// ---------------------------------------------------------------------------

/// Total amount payable at maturity, rounded to cents.
///
/// Assumes validated input. A zero principal or zero term short-circuits to
/// zero without evaluating either formula.
///
/// # Panics
///
/// When the total does not fit in a `Decimal`. Use [`try_total_payable`]
/// for unchecked form input.
pub fn total_payable(
    principal: Money,
    rate: Percent,
    term_days: Days,
    kind: InterestKind,
) -> Money {
    if principal <= Decimal::ZERO || term_days == 0 {
        return Decimal::ZERO;
    }

    let periods = periods_for(term_days);
    let rate = rate / dec!(100);

    let total = match kind {
        InterestKind::Simple => principal * (Decimal::ONE + rate * periods),
        InterestKind::Compound => principal * (Decimal::ONE + rate).powd(periods),
    };

    round_money(total)
}

/// Checked [`total_payable`]. A total beyond the `Decimal` range is an
/// `InvalidInput` on `term_days`.
pub fn try_total_payable(
    principal: Money,
    rate: Percent,
    term_days: Days,
    kind: InterestKind,
) -> LendingResult<Money> {
    if principal <= Decimal::ZERO || term_days == 0 {
        return Ok(Decimal::ZERO);
    }

    let periods = periods_for(term_days);
    let per_period = rate / dec!(100);

    let total = match kind {
        InterestKind::Simple => per_period
            .checked_mul(periods)
            .and_then(|growth| growth.checked_add(Decimal::ONE))
            .and_then(|factor| principal.checked_mul(factor)),
        InterestKind::Compound => (Decimal::ONE + per_period)
            .checked_powd(periods)
            .and_then(|factor| principal.checked_mul(factor)),
    };

    total.map(round_money).ok_or_else(|| {
        LendingError::invalid(
            "term_days",
            format!("total payable on {principal} at {rate}% over {term_days} days is out of range"),
        )
    })
}

/// Outstanding balance after `paid` has been recorded against `total`.
pub fn outstanding_balance(total: Money, paid: Money) -> Money {
    total - paid
}

/// Start date plus `term_days` calendar days. No business-day adjustment.
pub fn due_date(start: Date, term_days: Days) -> LendingResult<Date> {
    start
        .checked_add_days(CalendarDays::new(u64::from(term_days)))
        .ok_or_else(|| {
            LendingError::DateError(format!("{start} + {term_days} days is out of range"))
        })
}

/// Standard half-away-from-zero rounding to cents.
pub fn round_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

fn periods_for(term_days: Days) -> Decimal {
    Decimal::from(term_days) / PERIOD_DAYS
}

// ---------------------------------------------------------------------------
// Form field parsing
// ---------------------------------------------------------------------------

/// Parse a monetary form field. Empty, non-numeric or negative is rejected.
pub fn parse_amount(field: &str, raw: &str) -> LendingResult<Money> {
    let value = parse_decimal(field, raw)?;
    if value < Decimal::ZERO {
        return Err(LendingError::invalid(field, "must be at least 0"));
    }
    Ok(value)
}

/// Parse an interest rate form field (percent, min 0).
pub fn parse_rate(field: &str, raw: &str) -> LendingResult<Percent> {
    parse_amount(field, raw)
}

/// Parse a term form field: whole days, min 1.
pub fn parse_term_days(field: &str, raw: &str) -> LendingResult<Days> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LendingError::invalid(field, "is required"));
    }
    let days: i64 = trimmed
        .parse()
        .map_err(|_| LendingError::invalid(field, format!("'{trimmed}' is not a whole number of days")))?;
    if days < 1 {
        return Err(LendingError::invalid(field, "must be at least 1 day"));
    }
    Days::try_from(days).map_err(|_| LendingError::invalid(field, "term is too long"))
}

fn parse_decimal(field: &str, raw: &str) -> LendingResult<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LendingError::invalid(field, "is required"));
    }
    Decimal::from_str(trimmed)
        .map_err(|_| LendingError::invalid(field, format!("'{trimmed}' is not a number")))
}

// ---------------------------------------------------------------------------
// Full loan terms
// ---------------------------------------------------------------------------

/// Compute the derived fields of a loan row from its form input.
pub fn calculate_loan_terms(
    input: &LoanTermsInput,
) -> LendingResult<ComputationOutput<LoanTermsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let total = try_total_payable(
        input.principal,
        input.interest_rate,
        input.term_days,
        input.interest_kind,
    )?;
    let paid = input.previously_paid.unwrap_or(Decimal::ZERO);
    let outstanding = outstanding_balance(total, paid);
    if outstanding < Decimal::ZERO {
        warnings.push(format!(
            "Previously paid {paid} exceeds the recomputed total {total}; balance is negative."
        ));
    }
    if total.is_zero() {
        warnings.push("Principal or term is zero; total payable is zero.".into());
    }

    let output = LoanTermsOutput {
        total_payable: total,
        interest_amount: if total.is_zero() {
            Decimal::ZERO
        } else {
            total - input.principal
        },
        outstanding_balance: outstanding,
        due_date: due_date(input.start_date, input.term_days)?,
        periods: periods_for(input.term_days),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "period_days": PERIOD_DAYS.to_string(),
        "interest_kind": input.interest_kind,
        "rounding": "2 dp, half away from zero",
        "due_date": "calendar days, no business-day adjustment"
    });

    Ok(with_metadata(
        "Per-30-day-period loan interest",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &LoanTermsInput) -> LendingResult<()> {
    if input.principal < Decimal::ZERO {
        return Err(LendingError::invalid("principal", "Principal cannot be negative."));
    }
    if input.interest_rate < Decimal::ZERO {
        return Err(LendingError::invalid(
            "interest_rate",
            "Interest rate cannot be negative.",
        ));
    }
    if let Some(paid) = input.previously_paid {
        if paid < Decimal::ZERO {
            return Err(LendingError::invalid(
                "previously_paid",
                "Paid amount cannot be negative.",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_totals() {
        let p = dec!(1000);
        let r = dec!(5);
        assert_eq!(total_payable(p, r, 30, InterestKind::Simple), dec!(1050.00));
        assert_eq!(total_payable(p, r, 30, InterestKind::Compound), dec!(1050.00));
        assert_eq!(total_payable(p, r, 60, InterestKind::Simple), dec!(1100.00));
        assert_eq!(total_payable(p, r, 60, InterestKind::Compound), dec!(1102.50));
    }

    #[test]
    fn test_zero_principal_or_term_short_circuits() {
        assert_eq!(total_payable(dec!(0), dec!(5), 30, InterestKind::Simple), dec!(0));
        assert_eq!(total_payable(dec!(1000), dec!(5), 0, InterestKind::Compound), dec!(0));
    }

    #[test]
    fn test_zero_rate_returns_principal() {
        assert_eq!(total_payable(dec!(750), dec!(0), 90, InterestKind::Simple), dec!(750));
        assert_eq!(total_payable(dec!(750), dec!(0), 90, InterestKind::Compound), dec!(750));
    }

    #[test]
    fn test_fractional_period_compound() {
        // 1000 * 1.1^1.5 = 1153.7...
        let total = total_payable(dec!(1000), dec!(10), 45, InterestKind::Compound);
        assert!((total - dec!(1153.70)).abs() <= dec!(0.01), "got {total}");
        // Simple: 1000 * (1 + 0.1 * 1.5)
        assert_eq!(total_payable(dec!(1000), dec!(10), 45, InterestKind::Simple), dec!(1150));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 333.33 * (1 + 0.015) = 338.32995 -> 338.33
        assert_eq!(
            total_payable(dec!(333.33), dec!(1.5), 30, InterestKind::Simple),
            dec!(338.33)
        );
    }

    #[test]
    fn test_compound_dominates_after_first_period() {
        for days in [31u32, 60, 90, 180, 365] {
            let s = total_payable(dec!(2500), dec!(7.5), days, InterestKind::Simple);
            let c = total_payable(dec!(2500), dec!(7.5), days, InterestKind::Compound);
            assert!(s >= dec!(2500));
            assert!(c >= s, "compound {c} < simple {s} at {days} days");
        }
    }

    #[test]
    fn test_balance_with_no_payments_is_total() {
        assert_eq!(outstanding_balance(dec!(1102.50), Decimal::ZERO), dec!(1102.50));
        assert_eq!(outstanding_balance(dec!(1102.50), dec!(100)), dec!(1002.50));
    }

    #[test]
    fn test_due_date_uses_calendar_days() {
        assert_eq!(due_date(date(2024, 1, 31), 30).unwrap(), date(2024, 3, 1));
        assert_eq!(due_date(date(2023, 12, 15), 30).unwrap(), date(2024, 1, 14));
        assert_eq!(due_date(date(2024, 6, 1), 0).unwrap(), date(2024, 6, 1));
    }

    #[test]
    fn test_parse_rejects_malformed_fields() {
        assert!(parse_amount("principal", "").is_err());
        assert!(parse_amount("principal", "abc").is_err());
        assert!(parse_amount("principal", "-1").is_err());
        assert_eq!(parse_amount("principal", " 1500.75 ").unwrap(), dec!(1500.75));
        assert_eq!(parse_rate("interest_rate", "5.0").unwrap(), dec!(5.0));
        assert!(parse_term_days("term_days", "0").is_err());
        assert!(parse_term_days("term_days", "1.5").is_err());
        assert_eq!(parse_term_days("term_days", "45").unwrap(), 45);
    }

    #[test]
    fn test_calculate_loan_terms_envelope() {
        let input = LoanTermsInput {
            principal: dec!(1000),
            interest_rate: dec!(5),
            term_days: 60,
            interest_kind: InterestKind::Compound,
            start_date: date(2024, 1, 1),
            previously_paid: Some(dec!(200)),
        };
        let out = calculate_loan_terms(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.total_payable, dec!(1102.50));
        assert_eq!(r.interest_amount, dec!(102.50));
        assert_eq!(r.outstanding_balance, dec!(902.50));
        assert_eq!(r.due_date, date(2024, 3, 1));
        assert_eq!(r.periods, dec!(2));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_calculate_loan_terms_rejects_negative_rate() {
        let input = LoanTermsInput {
            principal: dec!(1000),
            interest_rate: dec!(-1),
            term_days: 30,
            interest_kind: InterestKind::Simple,
            start_date: date(2024, 1, 1),
            previously_paid: None,
        };
        match calculate_loan_terms(&input) {
            Err(LendingError::InvalidInput { field, .. }) => assert_eq!(field, "interest_rate"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_total_is_an_input_error() {
        let input = LoanTermsInput {
            principal: dec!(1000),
            interest_rate: dec!(100),
            term_days: 3650,
            interest_kind: InterestKind::Compound,
            start_date: date(2024, 1, 1),
            previously_paid: None,
        };
        match calculate_loan_terms(&input) {
            Err(LendingError::InvalidInput { field, .. }) => assert_eq!(field, "term_days"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        // Whole number of periods: 2^120 overflows through the integer power path.
        assert!(try_total_payable(dec!(1000), dec!(100), 3600, InterestKind::Compound).is_err());
    }

    #[test]
    fn test_checked_total_matches_total() {
        let cases = [
            (30, InterestKind::Simple),
            (60, InterestKind::Compound),
            (1000, InterestKind::Compound),
        ];
        for (days, kind) in cases {
            assert_eq!(
                try_total_payable(dec!(50000), dec!(20), days, kind).unwrap(),
                total_payable(dec!(50000), dec!(20), days, kind)
            );
        }
    }

    #[test]
    fn test_overpaid_loan_warns() {
        let input = LoanTermsInput {
            principal: dec!(100),
            interest_rate: dec!(0),
            term_days: 30,
            interest_kind: InterestKind::Simple,
            start_date: date(2024, 1, 1),
            previously_paid: Some(dec!(150)),
        };
        let out = calculate_loan_terms(&input).unwrap();
        assert_eq!(out.result.outstanding_balance, dec!(-50));
        assert_eq!(out.warnings.len(), 1);
    }
}
