use super::ui;
use crate::core::{DividendEvent, FundSink, HistorySource, NavPoint, SplitEvent};
use anyhow::Result;
use comfy_table::Cell;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Historical series that can be backfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryStream {
    Nav,
    CumulativeNav,
    Dividends,
    Splits,
}

impl HistoryStream {
    pub const ALL: [HistoryStream; 4] = [
        HistoryStream::Nav,
        HistoryStream::CumulativeNav,
        HistoryStream::Dividends,
        HistoryStream::Splits,
    ];
}

impl Display for HistoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HistoryStream::Nav => "nav",
                HistoryStream::CumulativeNav => "cumulative-nav",
                HistoryStream::Dividends => "dividends",
                HistoryStream::Splits => "splits",
            }
        )
    }
}

#[derive(Debug)]
pub struct BackfillFailure {
    pub fund_id: String,
    pub stream: HistoryStream,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BackfillReport {
    pub rows_written: usize,
    pub failed: Vec<BackfillFailure>,
}

/// Rows fetched for one (fund, stream) pair, not yet stored.
enum StreamRows {
    Nav(Vec<NavPoint>),
    CumulativeNav(Vec<NavPoint>),
    Dividends(Vec<DividendEvent>),
    Splits(Vec<SplitEvent>),
}

#[instrument(skip_all, fields(fund_id = %fund_id, stream = %stream))]
async fn fetch_stream(
    source: &dyn HistorySource,
    fund_id: &str,
    stream: HistoryStream,
) -> Result<StreamRows> {
    let rows = match stream {
        HistoryStream::Nav => StreamRows::Nav(source.nav_history(fund_id).await?),
        HistoryStream::CumulativeNav => {
            StreamRows::CumulativeNav(source.cumulative_nav_history(fund_id).await?)
        }
        HistoryStream::Dividends => StreamRows::Dividends(source.dividends(fund_id).await?),
        HistoryStream::Splits => StreamRows::Splits(source.splits(fund_id).await?),
    };
    Ok(rows)
}

fn store_stream(sink: &mut dyn FundSink, fund_id: &str, rows: &StreamRows) -> Result<usize> {
    match rows {
        StreamRows::Nav(points) => sink.replace_nav(fund_id, points),
        StreamRows::CumulativeNav(points) => sink.replace_cumulative_nav(fund_id, points),
        StreamRows::Dividends(events) => sink.replace_dividends(fund_id, events),
        StreamRows::Splits(events) => sink.replace_splits(fund_id, events),
    }
}

/// Replaces the stored series of every fund with a fresh copy from `source`.
///
/// Each (fund, stream) pair is one transaction. A pair whose fetch fails is
/// logged and skipped, leaving that fund's previous rows in place. A storage
/// failure aborts the batch.
pub async fn backfill(
    source: &dyn HistorySource,
    sink: &mut dyn FundSink,
    fund_ids: &[String],
    streams: &[HistoryStream],
    request_delay_ms: u64,
) -> Result<BackfillReport> {
    let mut report = BackfillReport::default();
    let pb = ui::new_progress_bar(fund_ids.len() as u64, true);

    for (i, fund_id) in fund_ids.iter().enumerate() {
        if i > 0 && request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(request_delay_ms)).await;
        }
        pb.set_message(fund_id.clone());

        for &stream in streams {
            let rows = match fetch_stream(source, fund_id, stream).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(fund_id = %fund_id, stream = %stream, "Backfill failed: {:#}", e);
                    report.failed.push(BackfillFailure {
                        fund_id: fund_id.clone(),
                        stream,
                        error: format!("{e:#}"),
                    });
                    continue;
                }
            };
            let written = match store_stream(sink, fund_id, &rows) {
                Ok(written) => written,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e.context(format!(
                        "Backfill aborted: storing {stream} history for fund {fund_id} failed"
                    )));
                }
            };
            debug!(fund_id = %fund_id, stream = %stream, "Stored {} rows", written);
            report.rows_written += written;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Backfilled {} funds: {} rows written, {} failures",
        fund_ids.len(),
        report.rows_written,
        report.failed.len()
    );
    Ok(report)
}

pub fn display_report(report: &BackfillReport) {
    ui::print_total("Rows written:", report.rows_written);
    ui::print_total("Failed:", report.failed.len());

    if report.failed.is_empty() {
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Stream"),
        ui::header_cell("Error"),
    ]);
    for failure in &report.failed {
        table.add_row(vec![
            Cell::new(&failure.fund_id),
            Cell::new(failure.stream.to_string()),
            ui::error_cell(&failure.error),
        ]);
    }
    println!("{table}");
}
