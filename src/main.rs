use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use fundscrape::cli::backfill::HistoryStream;
use fundscrape::core::log::init_logging;

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

#[derive(Clone, Copy, ValueEnum)]
enum BackfillTarget {
    Nav,
    CumulativeNav,
    Dividends,
    Splits,
    All,
}

impl BackfillTarget {
    fn streams(self) -> Vec<HistoryStream> {
        match self {
            BackfillTarget::Nav => vec![HistoryStream::Nav],
            BackfillTarget::CumulativeNav => vec![HistoryStream::CumulativeNav],
            BackfillTarget::Dividends => vec![HistoryStream::Dividends],
            BackfillTarget::Splits => vec![HistoryStream::Splits],
            BackfillTarget::All => HistoryStream::ALL.to_vec(),
        }
    }
}

impl From<Commands> for fundscrape::AppCommand {
    fn from(cmd: Commands) -> fundscrape::AppCommand {
        match cmd {
            Commands::InitDb => fundscrape::AppCommand::InitDb,
            Commands::RefreshFunds => fundscrape::AppCommand::RefreshFunds,
            Commands::Scrape {
                fund_ids,
                limit,
                fail_fast,
            } => fundscrape::AppCommand::Scrape {
                fund_ids,
                limit,
                fail_fast,
            },
            Commands::Backfill {
                target,
                fund_ids,
                limit,
            } => fundscrape::AppCommand::Backfill {
                streams: target.streams(),
                fund_ids,
                limit,
            },
            Commands::Show { fund_id } => fundscrape::AppCommand::Show { fund_id },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Create the database schema
    InitDb,
    /// Store the open-fund listing (code, name, status, fee)
    RefreshFunds,
    /// Scrape fund profiles into the database
    Scrape {
        /// Funds to scrape; defaults to every stored fund
        fund_ids: Vec<String>,
        /// Scrape at most this many funds
        #[arg(short, long)]
        limit: Option<usize>,
        /// Abort on the first failed fund
        #[arg(long)]
        fail_fast: bool,
    },
    /// Replace stored NAV, dividend or split history
    Backfill {
        #[arg(value_enum)]
        target: BackfillTarget,
        /// Funds to backfill; defaults to every stored fund
        fund_ids: Vec<String>,
        /// Backfill at most this many funds
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Display the stored profile of a fund
    Show { fund_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fundscrape::cli::setup::setup_at_path(path),
            None => fundscrape::cli::setup::setup(),
        },
        Some(cmd) => fundscrape::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
