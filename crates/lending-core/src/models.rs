//! Stored rows of the lending portfolio.
//!
//! Field and enum names are English; the backend's stored column names and
//! Spanish enum values are accepted as serde aliases so exported tables load
//! without a translation step.

use serde::{Deserialize, Serialize};

use crate::types::{Date, Days, Id, Money, Percent, Timestamp};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How interest accrues over the loan term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestKind {
    /// Linear in the number of 30-day periods.
    #[default]
    Simple,
    /// Compounded once per 30-day period.
    #[serde(alias = "compuesto")]
    Compound,
}

/// Loan status. Set by hand on the loan form, never derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    #[serde(alias = "activo")]
    Active,
    #[serde(alias = "pagado")]
    Paid,
    #[serde(alias = "vencido")]
    Overdue,
    #[serde(alias = "cancelado")]
    Cancelled,
    #[serde(alias = "moroso")]
    Delinquent,
}

impl LoanStatus {
    /// Delinquent and overdue loans both count as "in arrears".
    pub fn is_in_arrears(self) -> bool {
        matches!(self, LoanStatus::Delinquent | LoanStatus::Overdue)
    }

    /// Statuses that still accept payments.
    pub fn accepts_payments(self) -> bool {
        matches!(
            self,
            LoanStatus::Active | LoanStatus::Overdue | LoanStatus::Delinquent
        )
    }

    /// Paid and cancelled loans no longer carry debt.
    pub fn is_closed(self) -> bool {
        matches!(self, LoanStatus::Paid | LoanStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    #[serde(alias = "diario")]
    Daily,
    #[serde(alias = "semanal")]
    Weekly,
    #[serde(alias = "quincenal")]
    Biweekly,
    #[serde(alias = "mensual")]
    Monthly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    #[default]
    #[serde(alias = "normal")]
    Regular,
    #[serde(alias = "adelantado")]
    Advance,
    #[serde(alias = "parcial")]
    Partial,
    #[serde(alias = "completo")]
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "efectivo")]
    Cash,
    #[serde(alias = "transferencia")]
    Transfer,
    #[serde(alias = "cheque")]
    Check,
    #[serde(alias = "tarjeta")]
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "prestamista")]
    Lender,
    #[serde(alias = "operador")]
    Operator,
}

/// Declared type of a configuration parameter value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigValueType {
    #[default]
    #[serde(alias = "texto")]
    Text,
    #[serde(alias = "numero")]
    Number,
    #[serde(alias = "booleano")]
    Boolean,
    #[serde(alias = "fecha")]
    Date,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Id,
    /// National identity document. Unique across the portfolio.
    #[serde(alias = "documento_identidad")]
    pub document: String,
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[serde(alias = "apellido", default)]
    pub last_name: String,
    #[serde(alias = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(alias = "direccion", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(alias = "fecha_nacimiento", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    #[serde(alias = "estado_civil", default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(alias = "ocupacion", default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(alias = "referencias", default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    #[serde(alias = "notas", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(alias = "activo", default = "default_true")]
    pub active: bool,
    #[serde(alias = "foto_url", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    #[serde(default)]
    pub created_by: Option<Id>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Id,
    #[serde(alias = "cliente_id")]
    pub customer_id: Id,
    #[serde(alias = "monto_principal")]
    pub principal: Money,
    /// Percent per 30-day period.
    #[serde(alias = "tasa_interes")]
    pub interest_rate: Percent,
    #[serde(alias = "tipo_interes", default)]
    pub interest_kind: InterestKind,
    #[serde(alias = "plazo_dias")]
    pub term_days: Days,
    #[serde(alias = "fecha_inicio")]
    pub start_date: Date,
    #[serde(alias = "fecha_vencimiento")]
    pub due_date: Date,
    #[serde(alias = "monto_total")]
    pub total_payable: Money,
    #[serde(alias = "monto_pagado", default)]
    pub paid_amount: Money,
    /// Always `total_payable - paid_amount`; rewritten on every edit.
    #[serde(alias = "monto_pendiente")]
    pub outstanding: Money,
    #[serde(alias = "estado", default)]
    pub status: LoanStatus,
    #[serde(alias = "frecuencia_pago", default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(alias = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "garantia", default, skip_serializing_if = "Option::is_none")]
    pub collateral: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    #[serde(default)]
    pub created_by: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Id,
    #[serde(alias = "prestamo_id")]
    pub loan_id: Id,
    #[serde(alias = "monto")]
    pub amount: Money,
    #[serde(alias = "fecha_pago")]
    pub payment_date: Date,
    #[serde(alias = "tipo_pago", default)]
    pub kind: PaymentKind,
    #[serde(alias = "metodo_pago", default)]
    pub method: PaymentMethod,
    #[serde(alias = "numero_recibo", default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(alias = "notas", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    #[serde(default)]
    pub created_by: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParameter {
    pub id: Id,
    #[serde(alias = "clave")]
    pub key: String,
    #[serde(alias = "valor")]
    pub value: String,
    #[serde(alias = "tipo", default)]
    pub value_type: ConfigValueType,
    #[serde(alias = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUser {
    /// Same id as the authentication subsystem's user.
    pub id: Id,
    pub email: String,
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[serde(alias = "apellido", default)]
    pub last_name: String,
    #[serde(alias = "documento_identidad", default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(alias = "celular", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(alias = "rol")]
    pub role: Role,
    /// False until an admin approves the account.
    #[serde(alias = "activo", default)]
    pub active: bool,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Form drafts (editable fields only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub document: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<Date>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub references: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDraft {
    pub customer_id: Id,
    pub principal: Money,
    /// Falls back to the configured default rate when absent.
    #[serde(default)]
    pub interest_rate: Option<Percent>,
    #[serde(default)]
    pub interest_kind: InterestKind,
    pub term_days: Days,
    pub start_date: Date,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub collateral: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub loan_id: Id,
    pub amount: Money,
    pub payment_date: Date,
    #[serde(default)]
    pub kind: PaymentKind,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}
