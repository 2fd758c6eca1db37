//! Minimum redemption tier from the fund fee page.

use super::locator::{Document, Locator};
use super::normalize;
use crate::core::{ErrorKind, ExtractError, RedemptionInfo, Stage, StageContext};
use tracing::debug;

/// Fee-schedule tables. The redemption schedule is always the last one.
const FEE_TABLE: Locator = Locator::class("table", "w650 comm jjfl");

// Columns of a redemption tier row
const PERIOD_COLUMN: usize = 1;
const RATE_COLUMN: usize = 2;

/// Reads the last tier of the redemption schedule: the longest holding
/// period and its fee. The period is normalized to days.
pub fn parse_min_redemption(fund_id: &str, html: &str) -> Result<RedemptionInfo, ExtractError> {
    let (period, rate) = last_tier(html).stage(fund_id, Stage::RedemptionTable)?;
    let period_days =
        normalize::parse_redemption_period_days(&period).stage(fund_id, Stage::RedemptionPeriod)?;

    debug!(fund_id, %period, %period_days, %rate, "Extracted minimum redemption tier");
    Ok(RedemptionInfo { period_days, rate })
}

fn last_tier(html: &str) -> Result<(String, String), ErrorKind> {
    let doc = Document::parse(html);
    let table = doc
        .find_all(FEE_TABLE)
        .pop()
        .ok_or_else(|| ErrorKind::page_shape(format!("missing {FEE_TABLE}")))?
        .as_table()?;

    let row = table
        .rows
        .last()
        .ok_or_else(|| ErrorKind::page_shape("redemption table has no rows"))?;
    match (row.get(PERIOD_COLUMN), row.get(RATE_COLUMN)) {
        (Some(period), Some(rate)) => Ok((period.clone(), rate.clone())),
        _ => Err(ErrorKind::page_shape(format!(
            "redemption row has {} columns, need 3",
            row.len()
        ))),
    }
}
