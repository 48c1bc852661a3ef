use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use lending_core::access::Requester;
use lending_core::interest;
use lending_core::models::{LoanDraft, LoanStatus, PaymentDraft};
use lending_core::portfolio::{LoanQuery, Portfolio, PortfolioSnapshot};
use lending_core::reports::{self, ReportInput};
use lending_core::status::CustomerFilter;

use super::parse_choice;
use crate::input;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Where the portfolio lives and who is asking
#[derive(Args)]
pub struct SnapshotArgs {
    /// Portfolio snapshot file, JSON or YAML (falls back to LEND_DATA)
    #[arg(long)]
    pub data: Option<String>,

    /// Id of the user to act as (falls back to LEND_USER)
    #[arg(long)]
    pub user: Option<Uuid>,
}

#[derive(Args)]
pub struct CustomersArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// all, active, inactive, in-arrears, current, active-credit
    #[arg(long, default_value = "all")]
    pub filter: String,

    /// Match on first name, last name or document
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct LoansArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Only loans with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Match on customer name or loan description
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct PaymentsArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Payments of a single loan instead of a month
    #[arg(long)]
    pub loan: Option<Uuid>,

    /// Calendar year (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Calendar month 1-12 (defaults to the current month)
    #[arg(long)]
    pub month: Option<u32>,
}

#[derive(Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Reference day for "this month" (defaults to today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// First day of the range (inclusive)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day of the range (inclusive)
    #[arg(long)]
    pub to: NaiveDate,
}

#[derive(Args)]
pub struct CreateLoanArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Customer receiving the loan
    #[arg(long)]
    pub customer: Uuid,

    /// Amount lent
    #[arg(long)]
    pub principal: String,

    /// Percent per 30-day period (defaults to the configured rate)
    #[arg(long)]
    pub rate: Option<String>,

    /// Loan term in days
    #[arg(long)]
    pub term_days: String,

    /// simple or compound
    #[arg(long, default_value = "simple")]
    pub kind: String,

    /// First day of the loan (defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// daily, weekly, biweekly or monthly
    #[arg(long, default_value = "daily")]
    pub frequency: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub collateral: Option<String>,
}

#[derive(Args)]
pub struct RecordPaymentArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Loan being paid
    #[arg(long)]
    pub loan: Uuid,

    /// Amount received
    #[arg(long)]
    pub amount: String,

    /// Day the payment was received (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// regular, advance, partial or full
    #[arg(long, default_value = "regular")]
    pub kind: String,

    /// cash, transfer, check or card
    #[arg(long, default_value = "cash")]
    pub method: String,

    #[arg(long)]
    pub receipt: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct ApproveUserArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// User waiting for approval
    #[arg(long)]
    pub id: Uuid,
}

// ---------------------------------------------------------------------------
// Snapshot handling
// ---------------------------------------------------------------------------

/// A loaded snapshot with an authenticated requester.
struct OpenPortfolio {
    path: String,
    portfolio: Portfolio,
    requester: Requester,
}

impl OpenPortfolio {
    fn open(args: &SnapshotArgs, settings: &Settings) -> Result<Self, Box<dyn std::error::Error>> {
        let path = args
            .data
            .clone()
            .or_else(|| settings.data.clone())
            .ok_or("--data is required (or set LEND_DATA)")?;
        let user = args
            .user
            .or(settings.user)
            .ok_or("--user is required (or set LEND_USER)")?;

        let snapshot: PortfolioSnapshot = input::file::read_document(&path)?;
        let portfolio = Portfolio::from_snapshot(snapshot);
        let requester = portfolio.establish_session(user)?.requester();
        Ok(Self {
            path,
            portfolio,
            requester,
        })
    }

    fn save(self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::debug!(path = %self.path, "writing portfolio snapshot");
        input::file::write_document(&self.path, &self.portfolio.into_snapshot())
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CustomerRow {
    id: Uuid,
    document: String,
    name: String,
    phone: Option<String>,
    active: bool,
    in_arrears: bool,
    has_active_credit: bool,
    current: bool,
    outstanding: Decimal,
}

pub fn run_customers(args: CustomersArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let open = OpenPortfolio::open(&args.snapshot, settings)?;
    let filter: CustomerFilter = parse_choice("filter", &args.filter)?;

    let rows: Vec<CustomerRow> = open
        .portfolio
        .customer_overview(&open.requester, filter, args.search.as_deref())
        .into_iter()
        .map(|s| CustomerRow {
            id: s.customer.id,
            name: s.customer.full_name(),
            document: s.customer.document,
            phone: s.customer.phone,
            active: s.customer.active,
            in_arrears: s.standing.in_arrears,
            has_active_credit: s.standing.has_active_credit,
            current: s.standing.current,
            outstanding: s.outstanding,
        })
        .collect();
    Ok(serde_json::to_value(rows)?)
}

pub fn run_loans(args: LoansArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let open = OpenPortfolio::open(&args.snapshot, settings)?;
    let status: Option<LoanStatus> = args
        .status
        .as_deref()
        .map(|s| parse_choice("status", s))
        .transpose()?;
    let query = LoanQuery {
        status,
        search: args.search,
    };
    Ok(serde_json::to_value(open.portfolio.loans(&open.requester, &query))?)
}

pub fn run_payments(args: PaymentsArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    use chrono::Datelike;

    let open = OpenPortfolio::open(&args.snapshot, settings)?;
    let rows = match args.loan {
        Some(loan_id) => open.portfolio.payments_for_loan(&open.requester, loan_id)?,
        None => {
            let now = today();
            let year = args.year.unwrap_or(now.year());
            let month = args.month.unwrap_or(now.month());
            open.portfolio.payments_in_month(&open.requester, year, month)?
        }
    };
    Ok(serde_json::to_value(rows)?)
}

pub fn run_dashboard(args: DashboardArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let open = OpenPortfolio::open(&args.snapshot, settings)?;
    let stats = open
        .portfolio
        .dashboard(&open.requester, args.today.unwrap_or_else(today))?;
    Ok(serde_json::json!({ "result": stats }))
}

pub fn run_report(args: ReportArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let open = OpenPortfolio::open(&args.snapshot, settings)?;
    let input = ReportInput {
        from: args.from,
        to: args.to,
    };
    let result = reports::generate_report(&open.portfolio, &open.requester, &input)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

pub fn run_create_loan(args: CreateLoanArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut open = OpenPortfolio::open(&args.snapshot, settings)?;
    let draft = LoanDraft {
        customer_id: args.customer,
        principal: interest::parse_amount("principal", &args.principal)?,
        interest_rate: args
            .rate
            .as_deref()
            .map(|r| interest::parse_rate("rate", r))
            .transpose()?,
        interest_kind: parse_choice("kind", &args.kind)?,
        term_days: interest::parse_term_days("term_days", &args.term_days)?,
        start_date: args.start_date.unwrap_or_else(today),
        payment_frequency: parse_choice("frequency", &args.frequency)?,
        description: args.description,
        collateral: args.collateral,
    };

    let loan = open.portfolio.create_loan(&open.requester, draft)?;
    open.save()?;
    Ok(serde_json::json!({ "result": loan }))
}

pub fn run_record_payment(
    args: RecordPaymentArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut open = OpenPortfolio::open(&args.snapshot, settings)?;
    let draft = PaymentDraft {
        loan_id: args.loan,
        amount: interest::parse_amount("amount", &args.amount)?,
        payment_date: args.date.unwrap_or_else(today),
        kind: parse_choice("kind", &args.kind)?,
        method: parse_choice("method", &args.method)?,
        receipt_number: args.receipt,
        notes: args.notes,
    };

    let payment = open.portfolio.record_payment(&open.requester, draft)?;
    let loan = open.portfolio.loan(&open.requester, payment.loan_id)?.clone();
    open.save()?;
    Ok(serde_json::json!({
        "result": {
            "payment": payment,
            "paid_amount": loan.paid_amount,
            "outstanding_balance": loan.outstanding,
        }
    }))
}

pub fn run_approve_user(args: ApproveUserArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut open = OpenPortfolio::open(&args.snapshot, settings)?;
    let user = open.portfolio.approve_user(&open.requester, args.id)?;
    open.save()?;
    Ok(serde_json::json!({ "result": user }))
}
