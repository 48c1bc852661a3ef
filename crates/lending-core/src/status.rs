//! Customer credit standing derived from loan statuses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Customer, Loan, LoanStatus};
use crate::types::{Id, Money};

/// Independent facts about a customer's loans. A customer can hold active
/// credit and be in arrears at the same time on different loans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditStanding {
    /// Some loan is delinquent or overdue.
    pub in_arrears: bool,
    /// Some loan is active.
    pub has_active_credit: bool,
    /// Some loan is active and none is in arrears.
    pub current: bool,
}

/// Classify a single customer from the statuses of their loans.
pub fn classify<'a, I>(statuses: I) -> CreditStanding
where
    I: IntoIterator<Item = &'a LoanStatus>,
{
    let mut in_arrears = false;
    let mut has_active_credit = false;
    for status in statuses {
        in_arrears |= status.is_in_arrears();
        has_active_credit |= *status == LoanStatus::Active;
    }
    CreditStanding {
        in_arrears,
        has_active_credit,
        current: has_active_credit && !in_arrears,
    }
}

/// Standing of every customer that appears in `loans`.
pub fn classify_by_customer<'a, I>(loans: I) -> HashMap<Id, CreditStanding>
where
    I: IntoIterator<Item = &'a Loan>,
{
    let mut grouped: HashMap<Id, Vec<LoanStatus>> = HashMap::new();
    for loan in loans {
        grouped.entry(loan.customer_id).or_default().push(loan.status);
    }
    grouped
        .into_iter()
        .map(|(customer, statuses)| (customer, classify(&statuses)))
        .collect()
}

/// Debt still owed per customer. Loans that are paid, cancelled or carry no
/// positive balance are ignored.
pub fn outstanding_by_customer<'a, I>(loans: I) -> HashMap<Id, Money>
where
    I: IntoIterator<Item = &'a Loan>,
{
    let mut debts: HashMap<Id, Money> = HashMap::new();
    for loan in loans {
        if loan.outstanding > Decimal::ZERO && !loan.status.is_closed() {
            *debts.entry(loan.customer_id).or_default() += loan.outstanding;
        }
    }
    debts
}

/// List filter offered on the customer list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerFilter {
    #[default]
    All,
    Active,
    Inactive,
    InArrears,
    Current,
    ActiveCredit,
}

impl CustomerFilter {
    pub fn matches(self, customer: &Customer, standing: &CreditStanding) -> bool {
        match self {
            CustomerFilter::All => true,
            CustomerFilter::Active => customer.active,
            CustomerFilter::Inactive => !customer.active,
            CustomerFilter::InArrears => standing.in_arrears,
            CustomerFilter::Current => standing.current,
            CustomerFilter::ActiveCredit => standing.has_active_credit,
        }
    }
}
