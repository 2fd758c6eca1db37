//! Extraction error taxonomy

use std::fmt::Display;
use thiserror::Error;

/// Failure reaching a source page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// What went wrong inside a single extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// A mandatory panel or table is missing from the page.
    #[error("page shape: {0}")]
    PageShape(String),
    /// Located text does not match the pattern expected for its field.
    #[error("field parse: {0}")]
    FieldParse(String),
    /// Period text carries none of the recognized time units.
    #[error("unrecognized period unit in '{0}'")]
    Unit(String),
}

impl ErrorKind {
    pub fn page_shape(what: impl Display) -> Self {
        ErrorKind::PageShape(what.to_string())
    }

    pub fn field_parse(what: impl Display) -> Self {
        ErrorKind::FieldParse(what.to_string())
    }
}

/// Named steps of a fund extraction, reported with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    FetchDetail,
    Name,
    InfoTable,
    ClosedPeriod,
    TradeInfo,
    Manager,
    FetchFeePage,
    RedemptionTable,
    RedemptionPeriod,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Stage::FetchDetail => "fetch_detail",
                Stage::Name => "name",
                Stage::InfoTable => "info_table",
                Stage::ClosedPeriod => "closed_period",
                Stage::TradeInfo => "trade_info",
                Stage::Manager => "manager",
                Stage::FetchFeePage => "fetch_fee_page",
                Stage::RedemptionTable => "redemption_table",
                Stage::RedemptionPeriod => "redemption_period",
            }
        )
    }
}

/// A failed fund extraction. No partial record accompanies it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fund {fund_id}: stage '{stage}' failed: {kind}")]
pub struct ExtractError {
    pub fund_id: String,
    pub stage: Stage,
    pub kind: ErrorKind,
}

/// Tags a stage-local result with the fund and stage it belongs to.
pub trait StageContext<T> {
    fn stage(self, fund_id: &str, stage: Stage) -> Result<T, ExtractError>;
}

impl<T, E> StageContext<T> for Result<T, E>
where
    E: Into<ErrorKind>,
{
    fn stage(self, fund_id: &str, stage: Stage) -> Result<T, ExtractError> {
        self.map_err(|e| ExtractError {
            fund_id: fund_id.to_string(),
            stage,
            kind: e.into(),
        })
    }
}
