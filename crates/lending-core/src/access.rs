//! Role-scoped row visibility.
//!
//! Admins see every row. Everyone else sees only the rows they created.
//! The same [`AccessScope`] governs reads, counts, aggregates, updates and
//! deletes of customers, loans and payments.

use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::models::{Customer, Loan, Payment, Role};
use crate::types::Id;
use crate::LendingResult;

/// Column holding the owner reference in every scoped table.
pub const OWNER_COLUMN: &str = "created_by";

/// The authenticated user a query runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: Id,
    pub role: Role,
}

impl Requester {
    pub fn new(id: Id, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn scope(&self) -> AccessScope {
        AccessScope::for_requester(self)
    }
}

/// Tables whose rows carry an owner reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopedTable {
    Customer,
    Loan,
    Payment,
}

impl ScopedTable {
    /// Backend table name.
    pub fn table_name(self) -> &'static str {
        match self {
            ScopedTable::Customer => "clientes",
            ScopedTable::Loan => "prestamos",
            ScopedTable::Payment => "pagos",
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            ScopedTable::Customer => "Customer",
            ScopedTable::Loan => "Loan",
            ScopedTable::Payment => "Payment",
        }
    }
}

/// An equality filter a storage client adds to a query before running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRestriction {
    pub table: String,
    pub column: String,
    pub value: Id,
}

/// A row with an owner reference.
pub trait Owned {
    const TABLE: ScopedTable;

    fn row_id(&self) -> Id;

    /// Rows created outside the application may have no owner.
    fn owner(&self) -> Option<Id>;
}

impl Owned for Customer {
    const TABLE: ScopedTable = ScopedTable::Customer;

    fn row_id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<Id> {
        self.created_by
    }
}

impl Owned for Loan {
    const TABLE: ScopedTable = ScopedTable::Loan;

    fn row_id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<Id> {
        self.created_by
    }
}

impl Owned for Payment {
    const TABLE: ScopedTable = ScopedTable::Payment;

    fn row_id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<Id> {
        self.created_by
    }
}

/// Which rows a requester may see and touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner", rename_all = "snake_case")]
pub enum AccessScope {
    Unrestricted,
    OwnedBy(Id),
}

impl AccessScope {
    pub fn for_requester(requester: &Requester) -> Self {
        if requester.is_admin() {
            AccessScope::Unrestricted
        } else {
            AccessScope::OwnedBy(requester.id)
        }
    }

    /// Query restriction for `table`, or `None` when every row is visible.
    pub fn restriction(&self, table: ScopedTable) -> Option<OwnerRestriction> {
        match self {
            AccessScope::Unrestricted => None,
            AccessScope::OwnedBy(owner) => Some(OwnerRestriction {
                table: table.table_name().to_string(),
                column: OWNER_COLUMN.to_string(),
                value: *owner,
            }),
        }
    }

    pub fn permits<T: Owned>(&self, row: &T) -> bool {
        match self {
            AccessScope::Unrestricted => true,
            AccessScope::OwnedBy(owner) => row.owner() == Some(*owner),
        }
    }

    /// Visible subset of `rows`, in input order.
    pub fn filter<'a, T, I>(&self, rows: I) -> Vec<&'a T>
    where
        T: Owned + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        rows.into_iter().filter(|row| self.permits(*row)).collect()
    }

    /// Guard for mutations on a single row.
    pub fn ensure<T: Owned>(&self, row: &T) -> LendingResult<()> {
        if self.permits(row) {
            Ok(())
        } else {
            Err(LendingError::AccessDenied {
                entity: T::TABLE.entity().to_string(),
                id: row.row_id().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn payment(owner: Option<Id>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            loan_id: Uuid::new_v4(),
            amount: dec!(10),
            payment_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            kind: Default::default(),
            method: Default::default(),
            receipt_number: None,
            notes: None,
            created_at: Default::default(),
            updated_at: Default::default(),
            created_by: owner,
        }
    }

    #[test]
    fn test_admin_sees_everything() {
        let admin = Requester::new(Uuid::new_v4(), Role::Admin);
        let rows = vec![payment(Some(Uuid::new_v4())), payment(None), payment(Some(admin.id))];
        let scope = admin.scope();
        assert_eq!(scope.filter(&rows).len(), rows.len());
        assert!(scope.restriction(ScopedTable::Payment).is_none());
    }

    #[test]
    fn test_lender_sees_own_rows_only() {
        let lender = Requester::new(Uuid::new_v4(), Role::Lender);
        let rows = vec![payment(Some(lender.id)), payment(Some(Uuid::new_v4())), payment(None)];
        let visible = lender.scope().filter(&rows);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].created_by, Some(lender.id));
    }

    #[test]
    fn test_operator_is_scoped_like_lender() {
        let operator = Requester::new(Uuid::new_v4(), Role::Operator);
        let restriction = operator.scope().restriction(ScopedTable::Loan).unwrap();
        assert_eq!(restriction.table, "prestamos");
        assert_eq!(restriction.column, OWNER_COLUMN);
        assert_eq!(restriction.value, operator.id);
    }

    #[test]
    fn test_ensure_denies_foreign_row() {
        let lender = Requester::new(Uuid::new_v4(), Role::Lender);
        let foreign = payment(Some(Uuid::new_v4()));
        match lender.scope().ensure(&foreign) {
            Err(LendingError::AccessDenied { entity, .. }) => assert_eq!(entity, "Payment"),
            other => panic!("expected AccessDenied, got {other:?}"),
        }
        assert!(lender.scope().ensure(&payment(Some(lender.id))).is_ok());
    }
}
