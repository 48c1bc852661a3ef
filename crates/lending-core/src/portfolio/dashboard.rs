use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::access::Requester;
use crate::models::{Loan, LoanStatus};
use crate::types::{Date, Money};
use crate::LendingResult;

use super::{month_of, LoanQuery, Portfolio};

/// How many overdue loans the dashboard lists.
const OVERDUE_PREVIEW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Active customers only.
    pub total_customers: usize,
    pub total_loans: usize,
    pub active_loans: usize,
    pub overdue_loans: usize,
    /// Overdue loans with the nearest due date first.
    pub overdue_preview: Vec<Loan>,
    /// Sum of principal over all visible loans.
    pub principal_lent: Money,
    pub outstanding: Money,
    /// Sum of amounts already paid.
    pub recovered: Money,
    /// Payments dated in the month containing `today`.
    pub collected_this_month: Money,
}

impl Portfolio {
    pub fn dashboard(&self, requester: &Requester, today: Date) -> LendingResult<DashboardStats> {
        let loans = self.loans(requester, &LoanQuery::default());
        let total_customers = self
            .customers(requester)
            .into_iter()
            .filter(|c| c.active)
            .count();

        let count = |status: LoanStatus| loans.iter().filter(|l| l.status == status).count();

        let mut overdue: Vec<&Loan> = loans
            .iter()
            .copied()
            .filter(|l| l.status == LoanStatus::Overdue)
            .collect();
        overdue.sort_by(|a, b| a.due_date.cmp(&b.due_date));

        let (month_start, month_end) = month_of(today)?;
        let collected_this_month = self
            .payments_between(requester, month_start, month_end)
            .iter()
            .map(|p| p.amount)
            .sum();

        let stats = DashboardStats {
            total_customers,
            total_loans: loans.len(),
            active_loans: count(LoanStatus::Active),
            overdue_loans: overdue.len(),
            overdue_preview: overdue.into_iter().take(OVERDUE_PREVIEW).cloned().collect(),
            principal_lent: loans.iter().map(|l| l.principal).sum(),
            outstanding: loans.iter().map(|l| l.outstanding).sum(),
            recovered: loans.iter().map(|l| l.paid_amount).sum::<Decimal>(),
            collected_this_month,
        };
        tracing::debug!(
            requester = %requester.id,
            loans = stats.total_loans,
            customers = stats.total_customers,
            "dashboard computed"
        );
        Ok(stats)
    }
}
