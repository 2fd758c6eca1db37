pub mod cli;
pub mod core;
pub mod extract;
pub mod providers;
pub mod store;

use crate::cli::backfill::HistoryStream;
use crate::cli::scrape::ScrapeOptions;
use crate::core::config::AppConfig;
use crate::extract::FundScraper;
use crate::providers::{EastmoneyHistoryProvider, HttpFetcher};
use crate::store::SqliteStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that run against the configured sources and database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    InitDb,
    RefreshFunds,
    Scrape {
        fund_ids: Vec<String>,
        limit: Option<usize>,
        fail_fast: bool,
    },
    Backfill {
        streams: Vec<HistoryStream>,
        fund_ids: Vec<String>,
        limit: Option<usize>,
    },
    Show {
        fund_id: String,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let db_path = config.database_path()?;
    let mut store = SqliteStore::open(&db_path)?;
    store.init_schema()?;

    let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
    let eastmoney = &config.providers.eastmoney;

    match command {
        AppCommand::InitDb => {
            println!("Database ready at {}", db_path.display());
        }
        AppCommand::RefreshFunds => {
            let source = EastmoneyHistoryProvider::new(fetcher, eastmoney);
            let written = cli::funds::refresh_funds(&source, &mut store).await?;
            cli::ui::print_total("Fund listings stored:", written);
        }
        AppCommand::Scrape {
            fund_ids,
            limit,
            fail_fast,
        } => {
            let ids = cli::funds::resolve_fund_ids(&store, &fund_ids, limit)?;
            if ids.is_empty() {
                println!("No funds to scrape. Run `refresh-funds` first or pass fund ids.");
                return Ok(());
            }
            info!("Scraping {} funds", ids.len());
            let scraper = FundScraper::new(fetcher, eastmoney);
            let options = ScrapeOptions {
                fail_fast,
                request_delay_ms: config.request_delay_ms,
            };
            let report = cli::scrape::scrape_funds(&scraper, &mut store, &ids, options).await?;
            cli::scrape::display_report(&report);
        }
        AppCommand::Backfill {
            streams,
            fund_ids,
            limit,
        } => {
            let ids = cli::funds::resolve_fund_ids(&store, &fund_ids, limit)?;
            if ids.is_empty() {
                println!("No funds to backfill. Run `refresh-funds` first or pass fund ids.");
                return Ok(());
            }
            info!("Backfilling {} funds", ids.len());
            let source = EastmoneyHistoryProvider::new(fetcher, eastmoney);
            let report = cli::backfill::backfill(
                &source,
                &mut store,
                &ids,
                &streams,
                config.request_delay_ms,
            )
            .await?;
            cli::backfill::display_report(&report);
        }
        AppCommand::Show { fund_id } => {
            cli::show::run(&store, &fund_id)?;
        }
    }

    Ok(())
}
