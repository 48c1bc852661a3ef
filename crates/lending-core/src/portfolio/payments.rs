use chrono::Utc;
use rust_decimal::Decimal;

use crate::access::Requester;
use crate::error::LendingError;
use crate::interest::outstanding_balance;
use crate::models::{Loan, Payment, PaymentDraft};
use crate::types::{Date, Id, Money};
use crate::LendingResult;

use super::{month_bounds, Portfolio};

impl Portfolio {
    /// Visible payments dated within `[from, to]`, latest payment date first.
    pub fn payments_between(&self, requester: &Requester, from: Date, to: Date) -> Vec<&Payment> {
        let mut rows: Vec<&Payment> = Self::visible(&self.payments, requester)
            .into_iter()
            .filter(|p| p.payment_date >= from && p.payment_date <= to)
            .collect();
        rows.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        rows
    }

    pub fn payments_in_month(
        &self,
        requester: &Requester,
        year: i32,
        month: u32,
    ) -> LendingResult<Vec<&Payment>> {
        let (from, to) = month_bounds(year, month)?;
        Ok(self.payments_between(requester, from, to))
    }

    pub fn payments_for_loan(&self, requester: &Requester, loan_id: Id) -> LendingResult<Vec<&Payment>> {
        Self::owned(&self.loans, requester, loan_id)?;
        let mut rows: Vec<&Payment> = Self::visible(&self.payments, requester)
            .into_iter()
            .filter(|p| p.loan_id == loan_id)
            .collect();
        rows.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(rows)
    }

    /// Record a payment against a payable loan and move its balance.
    pub fn record_payment(
        &mut self,
        requester: &Requester,
        draft: PaymentDraft,
    ) -> LendingResult<Payment> {
        validate_amount(draft.amount)?;
        let loan = Self::owned_mut(&mut self.loans, requester, draft.loan_id)?;
        if !loan.status.accepts_payments() {
            return Err(LendingError::Conflict(format!(
                "loan {} is {:?} and does not accept payments",
                loan.id, loan.status
            )));
        }
        ensure_within_balance(draft.amount, loan.outstanding)?;
        apply(loan, draft.amount);

        let now = Utc::now();
        let payment = Payment {
            id: uuid::Uuid::new_v4(),
            loan_id: draft.loan_id,
            amount: draft.amount,
            payment_date: draft.payment_date,
            kind: draft.kind,
            method: draft.method,
            receipt_number: draft.receipt_number.filter(|r| !r.trim().is_empty()),
            notes: draft.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
            created_by: Some(requester.id),
        };
        tracing::info!(
            payment = %payment.id,
            loan = %payment.loan_id,
            amount = %payment.amount,
            "payment recorded"
        );
        self.payments.push(payment.clone());
        Ok(payment)
    }

    /// Replace a payment. The old amount is returned to its loan before the
    /// new amount is applied.
    pub fn update_payment(
        &mut self,
        requester: &Requester,
        id: Id,
        draft: PaymentDraft,
    ) -> LendingResult<Payment> {
        validate_amount(draft.amount)?;
        let old = Self::owned(&self.payments, requester, id)?.clone();
        let same_loan = old.loan_id == draft.loan_id;

        let target = Self::owned(&self.loans, requester, draft.loan_id)?;
        if !same_loan && !target.status.accepts_payments() {
            return Err(LendingError::Conflict(format!(
                "loan {} is {:?} and does not accept payments",
                target.id, target.status
            )));
        }
        let available = if same_loan {
            target.outstanding + old.amount
        } else {
            target.outstanding
        };
        ensure_within_balance(draft.amount, available)?;

        if let Some(previous) = self.loans.iter_mut().find(|l| l.id == old.loan_id) {
            apply(previous, -old.amount);
        }
        let target = Self::owned_mut(&mut self.loans, requester, draft.loan_id)?;
        apply(target, draft.amount);

        let payment = Self::owned_mut(&mut self.payments, requester, id)?;
        payment.loan_id = draft.loan_id;
        payment.amount = draft.amount;
        payment.payment_date = draft.payment_date;
        payment.kind = draft.kind;
        payment.method = draft.method;
        payment.receipt_number = draft.receipt_number.filter(|r| !r.trim().is_empty());
        payment.notes = draft.notes.filter(|n| !n.trim().is_empty());
        payment.updated_at = Utc::now();
        tracing::info!(payment = %id, amount = %payment.amount, "payment updated");
        Ok(payment.clone())
    }

    /// Delete a payment and return its amount to the loan balance.
    pub fn delete_payment(&mut self, requester: &Requester, id: Id) -> LendingResult<()> {
        let payment = Self::owned(&self.payments, requester, id)?.clone();
        if let Some(loan) = self.loans.iter_mut().find(|l| l.id == payment.loan_id) {
            apply(loan, -payment.amount);
        }
        self.payments.retain(|p| p.id != id);
        tracing::info!(payment = %id, deleted_by = %requester.id, "payment deleted");
        Ok(())
    }
}

fn validate_amount(amount: Money) -> LendingResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LendingError::invalid("amount", "must be greater than 0"));
    }
    Ok(())
}

fn ensure_within_balance(amount: Money, outstanding: Money) -> LendingResult<()> {
    if amount > outstanding {
        return Err(LendingError::invalid(
            "amount",
            format!("{amount} exceeds the outstanding balance {outstanding}"),
        ));
    }
    Ok(())
}

/// Add `amount` (negative to reverse) to the loan's paid total.
fn apply(loan: &mut Loan, amount: Money) {
    loan.paid_amount += amount;
    loan.outstanding = outstanding_balance(loan.total_payable, loan.paid_amount);
    loan.updated_at = Utc::now();
}
