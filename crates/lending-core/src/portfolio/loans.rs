use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::access::Requester;
use crate::error::LendingError;
use crate::interest::{calculate_loan_terms, LoanTermsInput, LoanTermsOutput};
use crate::models::{Customer, Loan, LoanDraft, LoanStatus};
use crate::types::{Id, Money, Percent};
use crate::LendingResult;

use super::{contains_ignore_case, Portfolio};

/// Filters offered on the loan list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanQuery {
    #[serde(default)]
    pub status: Option<LoanStatus>,
    /// Matches customer names and the loan description, case-insensitive.
    #[serde(default)]
    pub search: Option<String>,
}

impl Portfolio {
    /// Visible loans, newest first.
    pub fn loans(&self, requester: &Requester, query: &LoanQuery) -> Vec<&Loan> {
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut rows: Vec<&Loan> = Self::visible(&self.loans, requester)
            .into_iter()
            .filter(|l| query.status.map_or(true, |s| l.status == s))
            .filter(|l| needle.as_deref().map_or(true, |n| self.loan_matches(l, n)))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn loan(&self, requester: &Requester, id: Id) -> LendingResult<&Loan> {
        Self::owned(&self.loans, requester, id)
    }

    /// Loans that can still take a payment.
    pub fn payable_loans(&self, requester: &Requester) -> Vec<&Loan> {
        self.loans(requester, &LoanQuery::default())
            .into_iter()
            .filter(|l| l.status.accepts_payments())
            .collect()
    }

    /// Issue a new loan. Total payable, due date and balance are derived
    /// here once and stored on the row.
    pub fn create_loan(&mut self, requester: &Requester, draft: LoanDraft) -> LendingResult<Loan> {
        let customer = Self::owned(&self.customers, requester, draft.customer_id)?;
        ensure_active(customer)?;

        let rate = match draft.interest_rate {
            Some(rate) => rate,
            None => self.default_interest_rate()?,
        };
        let terms = derive_terms(&draft, rate, Decimal::ZERO)?;

        let now = Utc::now();
        let loan = Loan {
            id: uuid::Uuid::new_v4(),
            customer_id: draft.customer_id,
            principal: draft.principal,
            interest_rate: rate,
            interest_kind: draft.interest_kind,
            term_days: draft.term_days,
            start_date: draft.start_date,
            due_date: terms.due_date,
            total_payable: terms.total_payable,
            paid_amount: Decimal::ZERO,
            outstanding: terms.outstanding_balance,
            status: LoanStatus::Active,
            payment_frequency: draft.payment_frequency,
            description: non_empty(draft.description),
            collateral: non_empty(draft.collateral),
            created_at: now,
            updated_at: now,
            created_by: Some(requester.id),
        };
        tracing::info!(
            loan = %loan.id,
            customer = %loan.customer_id,
            total = %loan.total_payable,
            "loan created"
        );
        self.loans.push(loan.clone());
        Ok(loan)
    }

    /// Replace the editable fields of a loan and recompute its derived
    /// amounts. The recorded paid amount is kept.
    pub fn update_loan(
        &mut self,
        requester: &Requester,
        id: Id,
        draft: LoanDraft,
        status: Option<LoanStatus>,
    ) -> LendingResult<Loan> {
        let existing = Self::owned(&self.loans, requester, id)?;
        let paid = existing.paid_amount;
        let rate = draft.interest_rate.unwrap_or(existing.interest_rate);
        if draft.customer_id != existing.customer_id {
            let customer = Self::owned(&self.customers, requester, draft.customer_id)?;
            ensure_active(customer)?;
        }
        let terms = derive_terms(&draft, rate, paid)?;

        let loan = Self::owned_mut(&mut self.loans, requester, id)?;
        loan.customer_id = draft.customer_id;
        loan.principal = draft.principal;
        loan.interest_rate = rate;
        loan.interest_kind = draft.interest_kind;
        loan.term_days = draft.term_days;
        loan.start_date = draft.start_date;
        loan.due_date = terms.due_date;
        loan.total_payable = terms.total_payable;
        loan.outstanding = terms.outstanding_balance;
        loan.payment_frequency = draft.payment_frequency;
        loan.description = non_empty(draft.description);
        loan.collateral = non_empty(draft.collateral);
        if let Some(status) = status {
            loan.status = status;
        }
        loan.updated_at = Utc::now();
        tracing::info!(loan = %id, total = %loan.total_payable, "loan updated");
        Ok(loan.clone())
    }

    pub fn set_loan_status(
        &mut self,
        requester: &Requester,
        id: Id,
        status: LoanStatus,
    ) -> LendingResult<Loan> {
        let loan = Self::owned_mut(&mut self.loans, requester, id)?;
        loan.status = status;
        loan.updated_at = Utc::now();
        tracing::info!(loan = %id, status = ?status, "loan status changed");
        Ok(loan.clone())
    }

    /// Delete a loan together with its payments.
    pub fn delete_loan(&mut self, requester: &Requester, id: Id) -> LendingResult<()> {
        Self::owned(&self.loans, requester, id)?;
        let before = self.payments.len();
        self.payments.retain(|p| p.loan_id != id);
        self.loans.retain(|l| l.id != id);
        tracing::info!(
            loan = %id,
            payments_removed = before - self.payments.len(),
            deleted_by = %requester.id,
            "loan deleted"
        );
        Ok(())
    }

    fn loan_matches(&self, loan: &Loan, needle_lower: &str) -> bool {
        let customer_match = self
            .customers
            .iter()
            .find(|c| c.id == loan.customer_id)
            .is_some_and(|c| {
                contains_ignore_case(&c.first_name, needle_lower)
                    || contains_ignore_case(&c.last_name, needle_lower)
            });
        customer_match
            || loan
                .description
                .as_deref()
                .is_some_and(|d| contains_ignore_case(d, needle_lower))
    }
}

/// New loans and reassigned loans need an active customer.
fn ensure_active(customer: &Customer) -> LendingResult<()> {
    if !customer.active {
        return Err(LendingError::invalid(
            "customer_id",
            format!("customer {} is inactive", customer.id),
        ));
    }
    Ok(())
}

fn derive_terms(draft: &LoanDraft, rate: Percent, paid: Money) -> LendingResult<LoanTermsOutput> {
    if draft.term_days == 0 {
        return Err(LendingError::invalid("term_days", "must be at least 1 day"));
    }
    let input = LoanTermsInput {
        principal: draft.principal,
        interest_rate: rate,
        term_days: draft.term_days,
        interest_kind: draft.interest_kind,
        start_date: draft.start_date,
        previously_paid: Some(paid),
    };
    Ok(calculate_loan_terms(&input)?.result)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
