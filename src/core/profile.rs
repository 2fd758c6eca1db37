//! Fund profile records produced by the extractors

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::Display;

/// Fund-type marker for money-market funds.
pub const MONEY_MARKET_MARKER: &str = "货币型";

/// Lock-up after subscription, normalized to months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedPeriod {
    /// Open-ended fund; the source field is absent.
    None,
    Months(u32),
    /// Period text used a unit other than years or months. Holds the raw text.
    Unknown(String),
}

impl ClosedPeriod {
    /// Month count for storage. `Unknown` has none.
    pub fn months(&self) -> Option<u32> {
        match self {
            ClosedPeriod::None => Some(0),
            ClosedPeriod::Months(m) => Some(*m),
            ClosedPeriod::Unknown(_) => None,
        }
    }
}

impl Display for ClosedPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosedPeriod::None => write!(f, "0"),
            ClosedPeriod::Months(m) => write!(f, "{m}"),
            ClosedPeriod::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// Minimum redemption tier: holding period in days and the fee for it.
///
/// Both are empty for money-market funds. The period stays text, matching
/// what the fee page and the store carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedemptionInfo {
    pub period_days: String,
    pub rate: String,
}

/// Static profile read from the fund detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicInfo {
    pub short_name: String,
    pub fund_type: String,
    pub scale: Decimal,
    pub inception_date: NaiveDate,
    pub closed_period: ClosedPeriod,
    pub trading_status: String,
    pub estimated_reopen_window: String,
    pub subscription_fee_rate: String,
    pub fund_manager: String,
    pub latest_manager_change_date: NaiveDate,
}

impl BasicInfo {
    pub fn is_money_market(&self) -> bool {
        self.fund_type.contains(MONEY_MARKET_MARKER)
    }
}

/// Complete record for one fund, ready for the storage sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundProfile {
    pub fund_id: String,
    pub short_name: String,
    pub fund_type: String,
    pub scale: Decimal,
    pub inception_date: NaiveDate,
    pub closed_period: ClosedPeriod,
    pub trading_status: String,
    pub estimated_reopen_window: String,
    pub subscription_fee_rate: String,
    pub fund_manager: String,
    pub latest_manager_change_date: NaiveDate,
    pub min_redemption_period_days: String,
    pub min_redemption_rate: String,
}

impl FundProfile {
    pub fn assemble(fund_id: &str, basic: BasicInfo, redemption: RedemptionInfo) -> Self {
        FundProfile {
            fund_id: fund_id.to_string(),
            short_name: basic.short_name,
            fund_type: basic.fund_type,
            scale: basic.scale,
            inception_date: basic.inception_date,
            closed_period: basic.closed_period,
            trading_status: basic.trading_status,
            estimated_reopen_window: basic.estimated_reopen_window,
            subscription_fee_rate: basic.subscription_fee_rate,
            fund_manager: basic.fund_manager,
            latest_manager_change_date: basic.latest_manager_change_date,
            min_redemption_period_days: redemption.period_days,
            min_redemption_rate: redemption.rate,
        }
    }
}

/// Partial row from the open-fund listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundListing {
    pub fund_id: String,
    pub short_name: String,
    pub trading_status: String,
    pub subscription_fee_rate: String,
}
