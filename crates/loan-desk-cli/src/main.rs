mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::Level;

use commands::amortization::{ScheduleArgs, TermsArgs};
use commands::listing::{LoansArgs, TransactionsArgs};
use commands::quoting::{QuoteArgs, RateArgs};
use commands::servicing::{AdvanceArgs, ProgressArgs, ReviewArgs, SettleArgs, SummaryArgs};
use loan_desk_core::LendingPolicy;

/// Loan quoting, repayment schedules and servicing
#[derive(Parser)]
#[command(
    name = "loandesk",
    version,
    about = "Loan quoting, repayment schedules and servicing",
    long_about = "A CLI for pricing loan applications and tracking their repayment \
                  with decimal precision. Supports rate quotes, flat and amortizing \
                  schedules, loan and transaction lifecycles, progress tracking, \
                  filtered history and portfolio summaries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Lending policy file (JSON or YAML); defaults to the published rate card
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the annual rate for an amount and tenure
    QuoteRate(RateArgs),
    /// Interest, total payable and monthly payment
    Terms(TermsArgs),
    /// Month-by-month repayment schedule
    Schedule(ScheduleArgs),
    /// Price a full application: rate, terms and schedule
    Quote(QuoteArgs),
    /// Repayment progress of a loan
    Progress(ProgressArgs),
    /// Approve or reject a pending application (admin only)
    Review(ReviewArgs),
    /// Move a loan through its lifecycle
    Advance(AdvanceArgs),
    /// Complete or fail a pending transaction
    Settle(SettleArgs),
    /// Filtered, paged transaction history
    Transactions(TransactionsArgs),
    /// Filtered, paged loan list
    Loans(LoansArgs),
    /// Portfolio counts and totals
    Summary(SummaryArgs),
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

fn init_tracing(verbosity: u8) -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_policy(path: Option<&str>) -> Result<LendingPolicy, Box<dyn std::error::Error>> {
    match path {
        Some(p) => input::file::read_policy(p),
        None => Ok(LendingPolicy::default()),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let policy = match load_policy(cli.policy.as_deref()) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::QuoteRate(args) => commands::quoting::run_rate(args, &policy),
        Commands::Terms(args) => commands::amortization::run_terms(args, &policy),
        Commands::Schedule(args) => commands::amortization::run_schedule(args, &policy),
        Commands::Quote(args) => commands::quoting::run_quote(args, &policy),
        Commands::Progress(args) => commands::servicing::run_progress(args),
        Commands::Review(args) => commands::servicing::run_review(args),
        Commands::Advance(args) => commands::servicing::run_advance(args),
        Commands::Settle(args) => commands::servicing::run_settle(args),
        Commands::Transactions(args) => commands::listing::run_transactions(args, &policy),
        Commands::Loans(args) => commands::listing::run_loans(args, &policy),
        Commands::Summary(args) => commands::servicing::run_summary(args),
        Commands::Version => {
            println!("loandesk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
