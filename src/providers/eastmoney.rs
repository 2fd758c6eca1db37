use crate::core::config::EastmoneyProviderConfig;
use crate::core::{
    DividendEvent, FundListing, HistorySource, NavPoint, PageFetcher, SplitEvent,
};
use crate::extract::locator::{Document, Locator, Table};
use crate::extract::normalize;
use crate::providers::util::js_assignment;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument};

static FUND_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)datas\s*:\s*(\[\]|\[\[.*?\]\])").unwrap());

const NAV_SERIES: &str = "Data_netWorthTrend";
const CUMULATIVE_NAV_SERIES: &str = "Data_ACWorthTrend";

/// Exchange-local timestamps: the series are stamped at midnight UTC+8.
const MARKET_UTC_OFFSET_SECS: i32 = 8 * 3600;

// Columns of the open-fund listing rows
const LIST_CODE: usize = 0;
const LIST_NAME: usize = 1;
const LIST_STATUS: usize = 9;
const LIST_FEE: usize = 17;

const DIVIDEND_DATE_COLUMN: &str = "除息日";
const DIVIDEND_AMOUNT_COLUMN: &str = "每份分红";
const SPLIT_DATE_COLUMN: &str = "拆分折算日";
const SPLIT_TYPE_COLUMN: &str = "拆分类型";
const SPLIT_RATIO_COLUMN: &str = "拆分折算比例";

/// Structured series and listings from the eastmoney data endpoints.
pub struct EastmoneyHistoryProvider {
    fetcher: Arc<dyn PageFetcher>,
    fee_base_url: String,
    data_base_url: String,
}

impl EastmoneyHistoryProvider {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &EastmoneyProviderConfig) -> Self {
        EastmoneyHistoryProvider {
            fetcher,
            fee_base_url: config.fee_base_url.trim_end_matches('/').to_string(),
            data_base_url: config.data_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn series_url(&self, fund_id: &str) -> String {
        format!("{}/pingzhongdata/{}.js", self.data_base_url, fund_id)
    }

    fn events_url(&self, fund_id: &str) -> String {
        format!("{}/fhsp_{}.html", self.fee_base_url, fund_id)
    }

    fn fund_list_url(&self) -> String {
        format!(
            "{}/Data/Fund_JJJZ_Data.aspx?t=1&lx=1&letter=&gsid=&text=&sort=zdf,desc&page=1,20000&dt={}&atfc=&onlySale=0",
            self.data_base_url,
            chrono::Utc::now().timestamp_millis()
        )
    }

    async fn get(&self, url: &str) -> Result<String> {
        debug!("Requesting {}", url);
        let body = self.fetcher.fetch(url).await?;
        Ok(body)
    }
}

#[async_trait]
impl HistorySource for EastmoneyHistoryProvider {
    #[instrument(name = "ListFunds", skip(self))]
    async fn list_funds(&self) -> Result<Vec<FundListing>> {
        let body = self
            .get(&self.fund_list_url())
            .await
            .context("Failed to fetch the open-fund list")?;
        parse_fund_list(&body)
    }

    #[instrument(name = "NavHistory", skip(self))]
    async fn nav_history(&self, fund_id: &str) -> Result<Vec<NavPoint>> {
        let script = self
            .get(&self.series_url(fund_id))
            .await
            .with_context(|| format!("Failed to fetch NAV series for fund {fund_id}"))?;
        parse_nav_series(fund_id, &script)
    }

    #[instrument(name = "CumulativeNavHistory", skip(self))]
    async fn cumulative_nav_history(&self, fund_id: &str) -> Result<Vec<NavPoint>> {
        let script = self
            .get(&self.series_url(fund_id))
            .await
            .with_context(|| format!("Failed to fetch NAV series for fund {fund_id}"))?;
        parse_cumulative_nav_series(fund_id, &script)
    }

    #[instrument(name = "Dividends", skip(self))]
    async fn dividends(&self, fund_id: &str) -> Result<Vec<DividendEvent>> {
        let html = self
            .get(&self.events_url(fund_id))
            .await
            .with_context(|| format!("Failed to fetch dividend page for fund {fund_id}"))?;
        parse_dividends(fund_id, &html)
    }

    #[instrument(name = "Splits", skip(self))]
    async fn splits(&self, fund_id: &str) -> Result<Vec<SplitEvent>> {
        let html = self
            .get(&self.events_url(fund_id))
            .await
            .with_context(|| format!("Failed to fetch split page for fund {fund_id}"))?;
        parse_splits(fund_id, &html)
    }
}

fn market_date(millis: i64) -> Result<NaiveDate> {
    let offset = FixedOffset::east_opt(MARKET_UTC_OFFSET_SECS)
        .ok_or_else(|| anyhow!("Invalid market UTC offset"))?;
    let instant = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow!("Timestamp out of range: {millis}"))?;
    Ok(instant.with_timezone(&offset).date_naive())
}

#[derive(Debug, Deserialize)]
struct NetWorthPoint {
    x: i64,
    y: Option<f64>,
}

fn parse_nav_series(fund_id: &str, script: &str) -> Result<Vec<NavPoint>> {
    let Some(raw) = js_assignment(script, NAV_SERIES) else {
        debug!("No {} in series script, fund has no NAV history", NAV_SERIES);
        return Ok(Vec::new());
    };
    let points: Vec<NetWorthPoint> = serde_json::from_str(raw)
        .with_context(|| format!("Failed to parse {NAV_SERIES} for fund {fund_id}"))?;

    points
        .into_iter()
        .filter_map(|p| p.y.map(|value| (p.x, value)))
        .map(|(millis, value)| {
            Ok(NavPoint {
                fund_id: fund_id.to_string(),
                date: market_date(millis)?,
                value,
            })
        })
        .collect()
}

fn parse_cumulative_nav_series(fund_id: &str, script: &str) -> Result<Vec<NavPoint>> {
    let Some(raw) = js_assignment(script, CUMULATIVE_NAV_SERIES) else {
        debug!(
            "No {} in series script, fund has no cumulative NAV history",
            CUMULATIVE_NAV_SERIES
        );
        return Ok(Vec::new());
    };
    let pairs: Vec<(i64, Option<f64>)> = serde_json::from_str(raw)
        .with_context(|| format!("Failed to parse {CUMULATIVE_NAV_SERIES} for fund {fund_id}"))?;

    pairs
        .into_iter()
        .filter_map(|(millis, value)| value.map(|v| (millis, v)))
        .map(|(millis, value)| {
            Ok(NavPoint {
                fund_id: fund_id.to_string(),
                date: market_date(millis)?,
                value,
            })
        })
        .collect()
}

fn events_table(html: &str, marker_column: &str) -> Result<Option<Table>> {
    let doc = Document::parse(html);
    for node in doc.find_all(Locator::tag("table")) {
        let table = node.as_table()?;
        if table.has_column(marker_column) {
            return Ok(Some(table));
        }
    }
    Ok(None)
}

fn column(table: &Table, name: &str) -> Result<usize> {
    table
        .column(name)
        .ok_or_else(|| anyhow!("Event table has no '{name}' column"))
}

fn parse_dividends(fund_id: &str, html: &str) -> Result<Vec<DividendEvent>> {
    let Some(table) = events_table(html, DIVIDEND_AMOUNT_COLUMN)? else {
        debug!("No dividend table for fund {}", fund_id);
        return Ok(Vec::new());
    };
    let date_col = column(&table, DIVIDEND_DATE_COLUMN)?;
    let amount_col = column(&table, DIVIDEND_AMOUNT_COLUMN)?;

    table
        .complete_rows()
        .map(|row| {
            let ex_dividend_date = normalize::parse_iso_date(&row[date_col])
                .with_context(|| format!("Bad event date for fund {fund_id}"))?;
            Ok(DividendEvent {
                fund_id: fund_id.to_string(),
                ex_dividend_date,
                dividend_per_share: normalize::parse_dividend_per_share(&row[amount_col]),
            })
        })
        .collect()
}

fn parse_splits(fund_id: &str, html: &str) -> Result<Vec<SplitEvent>> {
    let Some(table) = events_table(html, SPLIT_RATIO_COLUMN)? else {
        debug!("No split table for fund {}", fund_id);
        return Ok(Vec::new());
    };
    let date_col = column(&table, SPLIT_DATE_COLUMN)?;
    let type_col = column(&table, SPLIT_TYPE_COLUMN)?;
    let ratio_col = column(&table, SPLIT_RATIO_COLUMN)?;

    table
        .complete_rows()
        .map(|row| {
            let split_date = normalize::parse_iso_date(&row[date_col])
                .with_context(|| format!("Bad event date for fund {fund_id}"))?;
            Ok(SplitEvent {
                fund_id: fund_id.to_string(),
                split_date,
                split_type: row[type_col].clone(),
                split_ratio: row[ratio_col].clone(),
            })
        })
        .collect()
}

fn list_cell(row: &[serde_json::Value], index: usize) -> String {
    match row.get(index) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_fund_list(body: &str) -> Result<Vec<FundListing>> {
    let raw = FUND_LIST_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| anyhow!("Fund list response has no 'datas' array"))?;
    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_str(raw.as_str()).context("Failed to parse fund list rows")?;

    let listings: Vec<FundListing> = rows
        .iter()
        .map(|row| FundListing {
            fund_id: list_cell(row, LIST_CODE),
            short_name: list_cell(row, LIST_NAME),
            trading_status: list_cell(row, LIST_STATUS),
            subscription_fee_rate: list_cell(row, LIST_FEE),
        })
        .filter(|listing| !listing.fund_id.is_empty())
        .collect();
    debug!("Parsed {} fund listings", listings.len());
    Ok(listings)
}
