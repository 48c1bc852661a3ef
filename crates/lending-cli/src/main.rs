mod commands;
mod input;
mod output;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::calculator::{ClassifyArgs, LoanTermsArgs};
use commands::portfolio::{
    ApproveUserArgs, CreateLoanArgs, CustomersArgs, DashboardArgs, LoansArgs, PaymentsArgs,
    RecordPaymentArgs, ReportArgs,
};
use settings::Settings;

/// Loan portfolio calculations and records
#[derive(Parser)]
#[command(
    name = "lend",
    version,
    about = "Loan portfolio calculations and records",
    long_about = "A CLI for small lenders: compute total payable and due dates for \
                  simple or compound loans, classify customers by credit standing, \
                  and query or update a portfolio snapshot as a given user."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (falls back to LEND_OUTPUT, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Log debug detail to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Total payable, balance and due date of a loan
    LoanTerms(LoanTermsArgs),
    /// Credit standing from a customer's loan statuses
    Classify(ClassifyArgs),
    /// List customers with their credit standing
    Customers(CustomersArgs),
    /// List loans
    Loans(LoansArgs),
    /// List payments of a month or of one loan
    Payments(PaymentsArgs),
    /// Portfolio totals
    Dashboard(DashboardArgs),
    /// Loans and payments within a date range
    Report(ReportArgs),
    /// Issue a new loan
    CreateLoan(CreateLoanArgs),
    /// Record a payment against a loan
    RecordPayment(RecordPaymentArgs),
    /// Activate a pending user account (admin only)
    ApproveUser(ApproveUserArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_format(flag: Option<OutputFormat>, settings: &Settings) -> OutputFormat {
    flag.or_else(|| {
        settings
            .output
            .as_deref()
            .and_then(|name| OutputFormat::from_str(name, true).ok())
    })
    .unwrap_or(OutputFormat::Json)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "config".yellow().bold(), e);
            Settings::default()
        }
    };
    let format = resolve_format(cli.output, &settings);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::LoanTerms(args) => commands::calculator::run_loan_terms(args),
        Commands::Classify(args) => commands::calculator::run_classify(args),
        Commands::Customers(args) => commands::portfolio::run_customers(args, &settings),
        Commands::Loans(args) => commands::portfolio::run_loans(args, &settings),
        Commands::Payments(args) => commands::portfolio::run_payments(args, &settings),
        Commands::Dashboard(args) => commands::portfolio::run_dashboard(args, &settings),
        Commands::Report(args) => commands::portfolio::run_report(args, &settings),
        Commands::CreateLoan(args) => commands::portfolio::run_create_loan(args, &settings),
        Commands::RecordPayment(args) => commands::portfolio::run_record_payment(args, &settings),
        Commands::ApproveUser(args) => commands::portfolio::run_approve_user(args, &settings),
        Commands::Version => {
            println!("lend {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_beats_configured_format() {
        let settings = Settings {
            output: Some("table".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_format(Some(OutputFormat::Csv), &settings),
            OutputFormat::Csv
        ));
        assert!(matches!(resolve_format(None, &settings), OutputFormat::Table));
        assert!(matches!(
            resolve_format(None, &Settings::default()),
            OutputFormat::Json
        ));
    }

    #[test]
    fn test_cli_parses_loan_terms() {
        let cli = Cli::try_parse_from([
            "lend",
            "loan-terms",
            "--principal",
            "1000",
            "--rate",
            "5",
            "--term-days",
            "60",
            "--kind",
            "compound",
            "--output",
            "minimal",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::LoanTerms(_)));
        assert!(matches!(cli.output, Some(OutputFormat::Minimal)));
    }
}
