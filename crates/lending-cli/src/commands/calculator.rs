use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use lending_core::interest::{self, LoanTermsInput};
use lending_core::models::{InterestKind, LoanStatus};
use lending_core::status;

use super::parse_choice;
use crate::input;

/// Arguments for the loan calculator
#[derive(Args)]
pub struct LoanTermsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount lent, as typed on the loan form
    #[arg(long)]
    pub principal: Option<String>,

    /// Interest rate in percent per 30-day period
    #[arg(long)]
    pub rate: Option<String>,

    /// Loan term in days
    #[arg(long)]
    pub term_days: Option<String>,

    /// Interest kind: simple or compound
    #[arg(long, default_value = "simple")]
    pub kind: String,

    /// First day of the loan (defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Amount already paid, for the outstanding balance
    #[arg(long)]
    pub paid: Option<Decimal>,
}

/// Arguments for credit standing classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Path to JSON input file with a `statuses` array
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated loan statuses of one customer (e.g. "active,delinquent")
    #[arg(long, value_delimiter = ',')]
    pub statuses: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ClassifyInput {
    statuses: Vec<LoanStatus>,
}

pub fn run_loan_terms(args: LoanTermsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms_input: LoanTermsInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        let term_days = args
            .term_days
            .ok_or("--term-days is required (or provide --input)")?;
        let interest_kind: InterestKind = parse_choice("kind", &args.kind)?;

        LoanTermsInput {
            principal: interest::parse_amount("principal", &principal)?,
            interest_rate: interest::parse_rate("rate", &rate)?,
            term_days: interest::parse_term_days("term_days", &term_days)?,
            interest_kind,
            start_date: args
                .start_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            previously_paid: args.paid,
        }
    };

    tracing::debug!(
        principal = %terms_input.principal,
        rate = %terms_input.interest_rate,
        term_days = terms_input.term_days,
        "computing loan terms"
    );
    let result = interest::calculate_loan_terms(&terms_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let statuses: Vec<LoanStatus> = if let Some(ref path) = args.input {
        input::file::read_json::<ClassifyInput>(path)?.statuses
    } else if let Some(raw) = args.statuses {
        raw.iter()
            .map(|s| parse_choice("statuses", s))
            .collect::<Result<_, _>>()?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value::<ClassifyInput>(data)?.statuses
    } else {
        return Err("--statuses is required (or provide --input)".into());
    };

    let standing = status::classify(&statuses);
    Ok(serde_json::json!({ "result": standing }))
}
