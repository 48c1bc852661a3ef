//! In-memory portfolio store.
//!
//! Holds the five tables of the lending backend and exposes every read and
//! mutation on behalf of a [`Requester`]. Row visibility is decided in one
//! place, [`Portfolio::visible`] / [`Portfolio::owned_mut`], so no query path
//! can skip the owner check.

pub mod customers;
pub mod dashboard;
pub mod loans;
pub mod payments;
pub mod session;
pub mod settings;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::access::{Owned, Requester};
use crate::error::LendingError;
use crate::models::{AppUser, ConfigParameter, Customer, Loan, Payment};
use crate::types::{Date, Id};
use crate::LendingResult;

pub use customers::CustomerSummary;
pub use dashboard::DashboardStats;
pub use loans::LoanQuery;
pub use session::{Registration, Session};
pub use settings::{ConfigValue, DEFAULT_RATE_KEY};

/// Serializable copy of every table. Accepts the backend's table names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    #[serde(default, alias = "clientes")]
    pub customers: Vec<Customer>,
    #[serde(default, alias = "prestamos")]
    pub loans: Vec<Loan>,
    #[serde(default, alias = "pagos")]
    pub payments: Vec<Payment>,
    #[serde(default, alias = "configuracion")]
    pub config: Vec<ConfigParameter>,
    #[serde(default, alias = "usuarios")]
    pub users: Vec<AppUser>,
}

#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    customers: Vec<Customer>,
    loans: Vec<Loan>,
    payments: Vec<Payment>,
    config: Vec<ConfigParameter>,
    users: Vec<AppUser>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: PortfolioSnapshot) -> Self {
        tracing::debug!(
            customers = snapshot.customers.len(),
            loans = snapshot.loans.len(),
            payments = snapshot.payments.len(),
            users = snapshot.users.len(),
            "loaded portfolio snapshot"
        );
        Self {
            customers: snapshot.customers,
            loans: snapshot.loans,
            payments: snapshot.payments,
            config: snapshot.config,
            users: snapshot.users,
        }
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            customers: self.customers.clone(),
            loans: self.loans.clone(),
            payments: self.payments.clone(),
            config: self.config.clone(),
            users: self.users.clone(),
        }
    }

    pub fn into_snapshot(self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            customers: self.customers,
            loans: self.loans,
            payments: self.payments,
            config: self.config,
            users: self.users,
        }
    }

    // -----------------------------------------------------------------------
    // Scoping
    // -----------------------------------------------------------------------

    /// Rows of `table` the requester may see, newest insertion first.
    fn visible<'a, T: Owned>(table: &'a [T], requester: &Requester) -> Vec<&'a T> {
        requester.scope().filter(table.iter().rev())
    }

    /// A single row the requester may see.
    fn owned<'a, T: Owned>(table: &'a [T], requester: &Requester, id: Id) -> LendingResult<&'a T> {
        let row = table
            .iter()
            .find(|row| row.row_id() == id)
            .ok_or_else(|| not_found::<T>(id))?;
        deny_logged(requester, row)?;
        Ok(row)
    }

    /// A single row the requester may mutate.
    fn owned_mut<'a, T: Owned>(
        table: &'a mut [T],
        requester: &Requester,
        id: Id,
    ) -> LendingResult<&'a mut T> {
        let row = table
            .iter_mut()
            .find(|row| row.row_id() == id)
            .ok_or_else(|| not_found::<T>(id))?;
        deny_logged(requester, row)?;
        Ok(row)
    }
}

fn deny_logged<T: Owned>(requester: &Requester, row: &T) -> LendingResult<()> {
    if let Err(e) = requester.scope().ensure(row) {
        tracing::warn!(
            requester = %requester.id,
            table = T::TABLE.table_name(),
            row = %row.row_id(),
            "access to foreign row refused"
        );
        return Err(e);
    }
    Ok(())
}

fn not_found<T: Owned>(id: Id) -> LendingError {
    LendingError::NotFound {
        entity: T::TABLE.entity().to_string(),
        id: id.to_string(),
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> LendingResult<(Date, Date)> {
    let first = Date::from_ymd_opt(year, month, 1).ok_or_else(|| {
        LendingError::InvalidInput {
            field: "month".into(),
            reason: format!("{year}-{month:02} is not a valid month"),
        }
    })?;
    let next = if month == 12 {
        Date::from_ymd_opt(year + 1, 1, 1)
    } else {
        Date::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| LendingError::DateError(format!("no month after {year}-{month:02}")))?;
    Ok((first, last))
}

/// Month bounds for the month containing `day`.
pub fn month_of(day: Date) -> LendingResult<(Date, Date)> {
    month_bounds(day.year(), day.month())
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, Date::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, Date::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, dec_last) = month_bounds(2023, 12).unwrap();
        assert_eq!(dec_last, Date::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn test_snapshot_accepts_backend_table_names() {
        let snapshot: PortfolioSnapshot =
            serde_json::from_str(r#"{"clientes": [], "prestamos": [], "usuarios": []}"#).unwrap();
        assert!(snapshot.customers.is_empty());
        let portfolio = Portfolio::from_snapshot(snapshot.clone());
        assert_eq!(portfolio.into_snapshot(), snapshot);
    }
}
