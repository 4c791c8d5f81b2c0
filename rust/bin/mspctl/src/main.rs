//! `mspctl`: command-line client for the MSP license service.
//!
//! Manages contexts and sign-in, and gives both roles their views:
//! administrators work the request queue and see every customer, clients
//! see their own licenses and submit requests.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use msp_license::model::{CustomerStatus, Decision, LicenseStatus, RequestStatus, TimeFrame};
use msp_license::scope::{CustomerFilter, LicenseFilter, RequestFilter};
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::output::Output;

/// MSP license manager CLI.
#[derive(Parser, Debug)]
#[command(name = "mspctl", version, about = "MSP License Manager client")]
struct Cli {
    /// Path to client config file (default: ~/.msp/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value = "table")]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts.
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    Use { name: String },

    /// Sign in to the current context's server.
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the saved token from the current context.
    Logout,

    /// License requests.
    Requests {
        #[command(subcommand)]
        action: RequestAction,
    },

    /// Customers (admin).
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },

    /// Licenses held by customers.
    Licenses {
        #[command(subcommand)]
        action: LicenseAction,
    },

    /// Summary for the signed-in role.
    Dashboard {
        /// Sales series bucket: daily, weekly or monthly.
        #[arg(long, default_value = "monthly", value_parser = parse_timeframe)]
        timeframe: TimeFrame,
    },

    /// Analytics reports (admin).
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create or update a context.
    Set {
        name: String,
        #[arg(long)]
        server: Option<String>,
        /// Request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// List all contexts.
    List,
}

#[derive(Subcommand, Debug)]
enum RequestAction {
    /// List requests visible to you, newest first.
    List {
        #[arg(long, value_parser = parse_request_status)]
        status: Option<RequestStatus>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Requests awaiting a decision (admin).
    Pending,
    /// Submit a new license request.
    Submit(SubmitArgs),
    /// Approve a pending request (admin).
    Approve {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Reject a pending request (admin).
    Reject {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Customer id. Clients default to their own customer.
    #[arg(long)]
    customer: Option<String>,
    /// License family, e.g. "Microsoft 365".
    #[arg(long = "type")]
    license_type: String,
    #[arg(long)]
    subtype: String,
    /// Email of the user the seat is for.
    #[arg(long)]
    email: String,
    #[arg(long)]
    mobile: String,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand, Debug)]
enum CustomerAction {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_parser = parse_customer_status)]
        status: Option<CustomerStatus>,
    },
}

#[derive(Subcommand, Debug)]
enum LicenseAction {
    /// Held licenses with their renewal status.
    List {
        /// Only this customer's licenses.
        #[arg(long)]
        customer: Option<String>,
        #[arg(long, value_parser = parse_license_status)]
        status: Option<LicenseStatus>,
        #[arg(long, default_value = "")]
        search: String,
    },
}

#[derive(Subcommand, Debug)]
enum ReportAction {
    /// Sales series for one bucket size.
    Sales {
        #[arg(long, default_value = "monthly", value_parser = parse_timeframe)]
        timeframe: TimeFrame,
    },
    /// Licenses held per license type.
    Distribution,
    /// Customers by total spend.
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Revenue per month between two dates (YYYY-MM-DD, inclusive).
    Revenue {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

fn parse_request_status(s: &str) -> Result<RequestStatus, String> {
    RequestStatus::parse(s).ok_or_else(|| format!("unknown status: {s}"))
}

fn parse_customer_status(s: &str) -> Result<CustomerStatus, String> {
    CustomerStatus::parse(s).ok_or_else(|| format!("unknown status: {s}"))
}

fn parse_license_status(s: &str) -> Result<LicenseStatus, String> {
    LicenseStatus::parse(s).ok_or_else(|| format!("unknown status: {s}"))
}

fn parse_timeframe(s: &str) -> Result<TimeFrame, String> {
    TimeFrame::parse(s).ok_or_else(|| format!("unknown timeframe: {s}"))
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{label}: ");
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(ClientConfig::default_path);
    let output = cli.output;

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Set { name, server, timeout } => {
                commands::context::set(&name, server.as_deref(), timeout, &config_path)?;
            }
            ContextAction::List => commands::context::list(&config_path, output)?,
        },

        Commands::Use { name } => commands::context::use_context(&name, &config_path)?,

        Commands::Login { email, password } => {
            let email = match email {
                Some(e) => e,
                None => prompt("Email")?,
            };
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            commands::login::login(&email, &password, &config_path).await?;
        }

        Commands::Logout => commands::login::logout(&config_path)?,

        Commands::Requests { action } => {
            let app = connect(&config_path)?;
            match action {
                RequestAction::List { status, search } => {
                    commands::requests::list(&app, RequestFilter { search, status }, output).await?;
                }
                RequestAction::Pending => commands::requests::pending(&app, output).await?,
                RequestAction::Submit(args) => {
                    let submission = commands::requests::Submission {
                        customer: args.customer,
                        license_type: args.license_type,
                        subtype: args.subtype,
                        email: args.email,
                        mobile: args.mobile,
                        notes: args.notes,
                    };
                    commands::requests::submit(&app, submission, output).await?;
                }
                RequestAction::Approve { id, notes } => {
                    commands::requests::decide(&app, &id, Decision::Approve, notes.as_deref(), output).await?;
                }
                RequestAction::Reject { id, notes } => {
                    commands::requests::decide(&app, &id, Decision::Reject, notes.as_deref(), output).await?;
                }
            }
        }

        Commands::Customers { action } => {
            let app = connect(&config_path)?;
            match action {
                CustomerAction::List { search, status } => {
                    commands::customers::list(&app, CustomerFilter { search, status }, output).await?;
                }
            }
        }

        Commands::Licenses { action } => {
            let app = connect(&config_path)?;
            match action {
                LicenseAction::List { customer, status, search } => {
                    let filter = LicenseFilter { search, status };
                    commands::licenses::list(&app, customer.as_deref(), filter, output).await?;
                }
            }
        }

        Commands::Dashboard { timeframe } => {
            let app = connect(&config_path)?;
            commands::dashboard::show(&app, timeframe, output).await?;
        }

        Commands::Report { action } => {
            let app = connect(&config_path)?;
            match action {
                ReportAction::Sales { timeframe } => commands::report::sales(&app, timeframe, output).await?,
                ReportAction::Distribution => commands::report::distribution(&app, output).await?,
                ReportAction::Top { limit } => commands::report::top_customers(&app, limit, output).await?,
                ReportAction::Revenue { from, to } => commands::report::revenue(&app, from, to, output).await?,
            }
        }
    }

    Ok(())
}

fn connect(config_path: &std::path::Path) -> anyhow::Result<msp_license::AppContext> {
    let config = ClientConfig::load(config_path)?;
    commands::connect(config.require_current()?)
}
