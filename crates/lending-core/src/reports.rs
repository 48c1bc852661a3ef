//! Date-range activity report over the loans and payments a user can see.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::access::Requester;
use crate::error::LendingError;
use crate::models::{Loan, LoanStatus, Payment};
use crate::portfolio::{LoanQuery, Portfolio};
use crate::types::{with_metadata, ComputationOutput, Date, Money};
use crate::LendingResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    pub from: Date,
    pub to: Date,
}

/// A loan row joined with its customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLoanRow {
    pub start_date: Date,
    pub customer_name: String,
    pub customer_document: String,
    pub principal: Money,
    pub total_payable: Money,
    pub status: LoanStatus,
    pub loan: Loan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// Loans started within the range, newest start date first.
    pub loans: Vec<ReportLoanRow>,
    /// Payments dated within the range, newest first.
    pub payments: Vec<Payment>,
    pub total_principal: Money,
    pub total_payments: Money,
    pub loan_count: usize,
    pub payment_count: usize,
}

pub fn generate_report(
    portfolio: &Portfolio,
    requester: &Requester,
    input: &ReportInput,
) -> LendingResult<ComputationOutput<PortfolioReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.from > input.to {
        return Err(LendingError::InvalidInput {
            field: "from".into(),
            reason: format!("range start {} is after range end {}", input.from, input.to),
        });
    }

    let mut loans: Vec<&Loan> = portfolio
        .loans(requester, &LoanQuery::default())
        .into_iter()
        .filter(|l| l.start_date >= input.from && l.start_date <= input.to)
        .collect();
    loans.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let mut rows = Vec::with_capacity(loans.len());
    for loan in loans {
        let (customer_name, customer_document) = match portfolio.customer(requester, loan.customer_id) {
            Ok(c) => (c.full_name(), c.document.clone()),
            Err(_) => {
                warnings.push(format!("Customer of loan {} is not visible.", loan.id));
                (String::new(), String::new())
            }
        };
        rows.push(ReportLoanRow {
            start_date: loan.start_date,
            customer_name,
            customer_document,
            principal: loan.principal,
            total_payable: loan.total_payable,
            status: loan.status,
            loan: loan.clone(),
        });
    }

    let payments: Vec<Payment> = portfolio
        .payments_between(requester, input.from, input.to)
        .into_iter()
        .cloned()
        .collect();

    let total_principal: Decimal = rows.iter().map(|r| r.principal).sum();
    let total_payments: Decimal = payments.iter().map(|p| p.amount).sum();

    let report = PortfolioReport {
        loan_count: rows.len(),
        payment_count: payments.len(),
        loans: rows,
        payments,
        total_principal,
        total_payments,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "loan_range_field": "start_date",
        "payment_range_field": "payment_date",
        "bounds": "inclusive",
        "scope": if requester.is_admin() { "all rows" } else { "own rows" }
    });

    Ok(with_metadata(
        "Portfolio activity report",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}
