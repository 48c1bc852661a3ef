use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use lending_core::access::{Owned, Requester, ScopedTable};
use lending_core::models::{Customer, Loan, Payment};
use lending_core::status::{self, CreditStanding};
use lending_core::{Id, Money};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan_terms(input_json: String) -> NapiResult<String> {
    let input: lending_core::interest::LoanTermsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        lending_core::interest::calculate_loan_terms(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Credit standing
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CustomerStanding {
    #[serde(flatten)]
    standing: CreditStanding,
    outstanding: Money,
}

/// Takes a JSON array of loans and returns standing and debt keyed by
/// customer id.
#[napi]
pub fn classify_loans(loans_json: String) -> NapiResult<String> {
    let loans: Vec<Loan> = serde_json::from_str(&loans_json).map_err(to_napi_error)?;
    let standings = status::classify_by_customer(&loans);
    let debts = status::outstanding_by_customer(&loans);

    let by_customer: BTreeMap<Id, CustomerStanding> = standings
        .into_iter()
        .map(|(customer, standing)| {
            let outstanding = debts.get(&customer).copied().unwrap_or_default();
            (customer, CustomerStanding { standing, outstanding })
        })
        .collect();
    serde_json::to_string(&by_customer).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scope filter
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScopeRowsInput {
    requester: Requester,
    table: ScopedTable,
    rows: serde_json::Value,
}

fn visible_rows<T>(requester: &Requester, rows: serde_json::Value) -> serde_json::Result<String>
where
    T: Owned + Serialize + for<'de> Deserialize<'de>,
{
    let rows: Vec<T> = serde_json::from_value(rows)?;
    serde_json::to_string(&requester.scope().filter(&rows))
}

fn filter_scoped(input: ScopeRowsInput) -> serde_json::Result<String> {
    match input.table {
        ScopedTable::Customer => visible_rows::<Customer>(&input.requester, input.rows),
        ScopedTable::Loan => visible_rows::<Loan>(&input.requester, input.rows),
        ScopedTable::Payment => visible_rows::<Payment>(&input.requester, input.rows),
    }
}

/// Filters `rows` of `table` down to what `requester` may see.
#[napi]
pub fn scope_rows(input_json: String) -> NapiResult<String> {
    let input: ScopeRowsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    filter_scoped(input).map_err(to_napi_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALICE: &str = "6f1c2b8e-0a4d-4b57-9a55-3c1f0b7e2a11";
    const BOB: &str = "0b9d7c3a-5e21-4f8e-8d6b-a2c4e6f80b22";

    fn customer_rows() -> serde_json::Value {
        json!([
            {
                "id": "9a0e4f1c-7b3d-4e52-8c61-1d2f3a4b5c01",
                "documento_identidad": "V-100",
                "nombre": "Ana",
                "created_by": ALICE
            },
            {
                "id": "9a0e4f1c-7b3d-4e52-8c61-1d2f3a4b5c02",
                "documento_identidad": "V-200",
                "nombre": "Luz",
                "created_by": BOB
            }
        ])
    }

    fn input(role: &str, table: &str) -> ScopeRowsInput {
        serde_json::from_value(json!({
            "requester": { "id": ALICE, "role": role },
            "table": table,
            "rows": customer_rows(),
        }))
        .unwrap()
    }

    #[test]
    fn test_lender_keeps_only_own_customers() {
        let out: Vec<Customer> =
            serde_json::from_str(&filter_scoped(input("lender", "customer")).unwrap()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].first_name, "Ana");
    }

    #[test]
    fn test_admin_keeps_every_row() {
        let out: Vec<Customer> =
            serde_json::from_str(&filter_scoped(input("admin", "customer")).unwrap()).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_rows_decoded_as_the_named_table() {
        // Customer rows lack the loan fields, so the loan table rejects them.
        assert!(filter_scoped(input("lender", "loan")).is_err());
        assert!(filter_scoped(input("lender", "payment")).is_err());
    }
}
