use super::ui;
use crate::core::{ExtractError, FundSink};
use crate::extract::FundScraper;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeOptions {
    /// Abort the batch on the first failed fund instead of skipping it.
    pub fail_fast: bool,
    pub request_delay_ms: u64,
}

#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub stored: Vec<String>,
    pub failed: Vec<ExtractError>,
}

/// Extracts and stores the profile of every fund in `fund_ids`, in order.
///
/// A failed extraction stores nothing for that fund. Storage failures always
/// abort the batch.
pub async fn scrape_funds(
    scraper: &FundScraper,
    sink: &mut dyn FundSink,
    fund_ids: &[String],
    options: ScrapeOptions,
) -> Result<ScrapeReport> {
    let mut report = ScrapeReport::default();
    let pb = ui::new_progress_bar(fund_ids.len() as u64, true);

    for (i, fund_id) in fund_ids.iter().enumerate() {
        if i > 0 && options.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(options.request_delay_ms)).await;
        }
        pb.set_message(fund_id.clone());

        match scraper.extract_profile(fund_id).await {
            Ok(profile) => {
                sink.upsert_profile(&profile)
                    .with_context(|| format!("Failed to store fund {fund_id}"))?;
                report.stored.push(fund_id.clone());
            }
            Err(e) if options.fail_fast => {
                pb.finish_and_clear();
                return Err(anyhow::Error::new(e).context("Scrape aborted"));
            }
            Err(e) => {
                warn!(fund_id = %fund_id, stage = %e.stage, "Skipping fund: {}", e.kind);
                report.failed.push(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Scraped {} funds, {} stored, {} failed",
        fund_ids.len(),
        report.stored.len(),
        report.failed.len()
    );
    Ok(report)
}

pub fn display_report(report: &ScrapeReport) {
    ui::print_total("Stored:", report.stored.len());
    ui::print_total("Failed:", report.failed.len());

    if report.failed.is_empty() {
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Stage"),
        ui::header_cell("Error"),
    ]);
    for failure in &report.failed {
        table.add_row(vec![
            Cell::new(&failure.fund_id),
            Cell::new(failure.stage.to_string()),
            ui::error_cell(&failure.kind.to_string()),
        ]);
    }
    println!("{table}");
}
