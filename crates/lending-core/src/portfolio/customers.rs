use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::access::Requester;
use crate::error::LendingError;
use crate::models::{Customer, CustomerDraft};
use crate::status::{self, CreditStanding, CustomerFilter};
use crate::types::{Id, Money};
use crate::LendingResult;

use super::{contains_ignore_case, Portfolio};

/// A customer row with its derived credit facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer: Customer,
    pub standing: CreditStanding,
    /// Sum of balances still owed on open loans.
    pub outstanding: Money,
}

impl Portfolio {
    /// Visible customers, newest first.
    pub fn customers(&self, requester: &Requester) -> Vec<&Customer> {
        let mut rows = Self::visible(&self.customers, requester);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn customer(&self, requester: &Requester, id: Id) -> LendingResult<&Customer> {
        Self::owned(&self.customers, requester, id)
    }

    /// Active customers a new loan may be issued to, ordered by name.
    pub fn active_customers(&self, requester: &Requester) -> Vec<&Customer> {
        let mut rows: Vec<&Customer> = Self::visible(&self.customers, requester)
            .into_iter()
            .filter(|c| c.active)
            .collect();
        rows.sort_by(|a, b| a.first_name.cmp(&b.first_name));
        rows
    }

    /// Case-insensitive match on first or last name, substring on document.
    pub fn search_customers(&self, requester: &Requester, term: &str) -> Vec<&Customer> {
        let needle = term.trim().to_lowercase();
        self.customers(requester)
            .into_iter()
            .filter(|c| matches_customer(c, &needle))
            .collect()
    }

    /// Customer list with credit standing and debt, as shown on the list page.
    pub fn customer_overview(
        &self,
        requester: &Requester,
        filter: CustomerFilter,
        search: Option<&str>,
    ) -> Vec<CustomerSummary> {
        let loans = Self::visible(&self.loans, requester);
        let standings = status::classify_by_customer(loans.iter().copied());
        let debts = status::outstanding_by_customer(loans.iter().copied());
        let needle = search.map(|s| s.trim().to_lowercase());

        self.customers(requester)
            .into_iter()
            .filter(|c| needle.as_deref().map_or(true, |n| matches_customer(c, n)))
            .filter_map(|c| {
                let standing = standings.get(&c.id).copied().unwrap_or_default();
                if !filter.matches(c, &standing) {
                    return None;
                }
                Some(CustomerSummary {
                    customer: c.clone(),
                    standing,
                    outstanding: debts.get(&c.id).copied().unwrap_or(Decimal::ZERO),
                })
            })
            .collect()
    }

    pub fn create_customer(
        &mut self,
        requester: &Requester,
        draft: CustomerDraft,
    ) -> LendingResult<Customer> {
        let document = validate_draft(&draft)?;
        self.ensure_unique_document(&document, None)?;

        let now = Utc::now();
        let customer = Customer {
            id: uuid::Uuid::new_v4(),
            document,
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            phone: draft.phone,
            email: draft.email,
            address: draft.address,
            birth_date: draft.birth_date,
            marital_status: draft.marital_status,
            occupation: draft.occupation,
            references: draft.references,
            notes: draft.notes,
            active: draft.active,
            avatar_url: draft.avatar_url,
            created_at: now,
            updated_at: now,
            created_by: Some(requester.id),
        };
        tracing::info!(customer = %customer.id, owner = %requester.id, "customer created");
        self.customers.push(customer.clone());
        Ok(customer)
    }

    /// Replace the editable fields of a customer.
    pub fn update_customer(
        &mut self,
        requester: &Requester,
        id: Id,
        draft: CustomerDraft,
    ) -> LendingResult<Customer> {
        let document = validate_draft(&draft)?;
        Self::owned(&self.customers, requester, id)?;
        self.ensure_unique_document(&document, Some(id))?;

        let customer = Self::owned_mut(&mut self.customers, requester, id)?;
        customer.document = document;
        customer.first_name = draft.first_name.trim().to_string();
        customer.last_name = draft.last_name.trim().to_string();
        customer.phone = draft.phone;
        customer.email = draft.email;
        customer.address = draft.address;
        customer.birth_date = draft.birth_date;
        customer.marital_status = draft.marital_status;
        customer.occupation = draft.occupation;
        customer.references = draft.references;
        customer.notes = draft.notes;
        customer.active = draft.active;
        customer.avatar_url = draft.avatar_url;
        customer.updated_at = Utc::now();
        tracing::info!(customer = %id, "customer updated");
        Ok(customer.clone())
    }

    /// Delete a customer that no longer has loans.
    pub fn delete_customer(&mut self, requester: &Requester, id: Id) -> LendingResult<()> {
        Self::owned(&self.customers, requester, id)?;
        let loan_count = self.loans.iter().filter(|l| l.customer_id == id).count();
        if loan_count > 0 {
            return Err(LendingError::Conflict(format!(
                "customer {id} still has {loan_count} loan(s)"
            )));
        }
        self.customers.retain(|c| c.id != id);
        tracing::info!(customer = %id, deleted_by = %requester.id, "customer deleted");
        Ok(())
    }

    fn ensure_unique_document(&self, document: &str, except: Option<Id>) -> LendingResult<()> {
        let taken = self
            .customers
            .iter()
            .any(|c| c.document == document && Some(c.id) != except);
        if taken {
            Err(LendingError::DuplicateDocument(document.to_string()))
        } else {
            Ok(())
        }
    }
}

fn validate_draft(draft: &CustomerDraft) -> LendingResult<String> {
    let document = draft.document.trim();
    if document.is_empty() {
        return Err(LendingError::invalid("document", "is required"));
    }
    if draft.first_name.trim().is_empty() {
        return Err(LendingError::invalid("first_name", "is required"));
    }
    Ok(document.to_string())
}

fn matches_customer(customer: &Customer, needle_lower: &str) -> bool {
    needle_lower.is_empty()
        || contains_ignore_case(&customer.first_name, needle_lower)
        || contains_ignore_case(&customer.last_name, needle_lower)
        || customer.document.to_lowercase().contains(needle_lower)
}
