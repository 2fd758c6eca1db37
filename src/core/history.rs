//! Historical series abstractions

use crate::core::profile::FundListing;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// One daily value: unit NAV or cumulative NAV depending on the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct NavPoint {
    pub fund_id: String,
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DividendEvent {
    pub fund_id: String,
    pub ex_dividend_date: NaiveDate,
    /// `None` when the source text carries no decimal amount.
    pub dividend_per_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitEvent {
    pub fund_id: String,
    pub split_date: NaiveDate,
    pub split_type: String,
    pub split_ratio: String,
}

/// Already structured series from the data aggregator.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn list_funds(&self) -> Result<Vec<FundListing>>;
    async fn nav_history(&self, fund_id: &str) -> Result<Vec<NavPoint>>;
    async fn cumulative_nav_history(&self, fund_id: &str) -> Result<Vec<NavPoint>>;
    async fn dividends(&self, fund_id: &str) -> Result<Vec<DividendEvent>>;
    async fn splits(&self, fund_id: &str) -> Result<Vec<SplitEvent>>;
}
