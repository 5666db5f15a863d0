use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use pegfx::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List registered currencies
    List,
    /// Convert an amount between two currencies
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    /// Show the rate of every other currency against a base
    Rates { base: String },
    /// Show daily rates for a currency pair
    Historical {
        from: String,
        to: String,
        /// First day (YYYY-MM-DD), defaults to 30 days before the end
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Run an API request, e.g. "action=convert&amount=10&from=VYR&to=IRE"
    Query { query: String },
}

impl From<Commands> for pegfx::AppCommand {
    fn from(cmd: Commands) -> pegfx::AppCommand {
        match cmd {
            Commands::List => pegfx::AppCommand::List,
            Commands::Convert { amount, from, to } => {
                pegfx::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates { base } => pegfx::AppCommand::Rates { base },
            Commands::Historical {
                from,
                to,
                start,
                end,
            } => pegfx::AppCommand::Historical {
                from,
                to,
                start,
                end,
            },
            Commands::Query { query } => pegfx::AppCommand::Query(query),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => pegfx::cli::setup::setup(),
        Some(cmd) => pegfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
