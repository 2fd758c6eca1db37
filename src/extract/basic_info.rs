//! Static fund profile from the fund detail page.

use super::locator::{Document, Locator, Table};
use super::normalize;
use crate::core::{BasicInfo, ClosedPeriod, ErrorKind, ExtractError, Stage, StageContext};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

const TITLE: Locator = Locator::class("div", "fundDetail-tit");
const INFO_PANEL: Locator = Locator::class("div", "infoOfFund");
const TRADE_PANEL: Locator = Locator::class("div", "buyWayStatic");
const TRADE_ITEM: Locator = Locator::class("div", "staticItem");
const STATUS_CELL: Locator = Locator::class("span", "staticCell");
const REOPEN_WINDOW: Locator = Locator::class("span", "planData kfadate");
const FEE_PRIMARY: Locator = Locator::class("span", "comparePrice");
const FEE_FALLBACK: Locator = Locator::class("span", "nowPrice");
const MANAGER_TAB: Locator = Locator::class("li", "fundManagerTab");

// Positions inside the trade panel
const STATUS_ITEM: usize = 0;
const REOPEN_ITEM: usize = 2;
const FEE_ITEM: usize = 4;

const CLOSED_PERIOD_LABEL: &str = "封闭期";
const MANAGER_COLUMN: &str = "基金经理";
const TENURE_COLUMN: &str = "任职时间";

struct InfoPanel {
    fund_type: String,
    scale: Decimal,
    inception_date: NaiveDate,
    closed_period: ClosedPeriod,
}

struct TradeInfo {
    status: String,
    reopen_window: String,
    fee_rate: String,
}

/// Builds the static profile of `fund_id` from its detail page.
///
/// Each step is guarded separately and reported with its [`Stage`]; a single
/// failing step fails the whole record.
pub fn parse_basic_info(fund_id: &str, html: &str) -> Result<BasicInfo, ExtractError> {
    let doc = Document::parse(html);

    let short_name = fund_name(&doc).stage(fund_id, Stage::Name)?;
    let info_table = info_table(&doc).stage(fund_id, Stage::InfoTable)?;
    let InfoPanel {
        fund_type,
        scale,
        inception_date,
        closed_period,
    } = info_panel(&info_table, fund_id)?;
    let trade = trade_info(&doc).stage(fund_id, Stage::TradeInfo)?;
    let (fund_manager, latest_manager_change_date) =
        current_manager(&doc).stage(fund_id, Stage::Manager)?;

    debug!(
        fund_id,
        %short_name,
        %fund_type,
        %scale,
        %closed_period,
        "Extracted basic info"
    );

    Ok(BasicInfo {
        short_name,
        fund_type,
        scale,
        inception_date,
        closed_period,
        trading_status: trade.status,
        estimated_reopen_window: trade.reopen_window,
        subscription_fee_rate: trade.fee_rate,
        fund_manager,
        latest_manager_change_date,
    })
}

fn fund_name(doc: &Document) -> Result<String, ErrorKind> {
    let title = doc.require(TITLE)?;
    let name_block = title.require(Locator::tag("div"))?;
    let name = normalize::short_name(&name_block.text());
    if name.is_empty() {
        return Err(ErrorKind::field_parse("empty fund name"));
    }
    Ok(name)
}

fn info_table(doc: &Document) -> Result<Table, ErrorKind> {
    doc.require(INFO_PANEL)?.as_table()
}

fn info_panel(table: &Table, fund_id: &str) -> Result<InfoPanel, ExtractError> {
    let basics = || -> Result<_, ErrorKind> {
        let fund_type = normalize::labelled_value(table.cell_required(0, 0)?)?;
        let scale = normalize::parse_scale(table.cell_required(0, 1)?)?;
        let inception_date =
            normalize::parse_iso_date(&normalize::labelled_value(table.cell_required(1, 0)?)?)?;
        Ok((fund_type, scale, inception_date))
    };
    let (fund_type, scale, inception_date) = basics().stage(fund_id, Stage::InfoTable)?;

    let closed_period = match table.find_cell(|text| text.contains(CLOSED_PERIOD_LABEL)) {
        Some(text) => normalize::parse_closed_period(text).stage(fund_id, Stage::ClosedPeriod)?,
        None => ClosedPeriod::None,
    };

    Ok(InfoPanel {
        fund_type,
        scale,
        inception_date,
        closed_period,
    })
}

fn trade_info(doc: &Document) -> Result<TradeInfo, ErrorKind> {
    let panel = doc.require(TRADE_PANEL)?;
    let items = panel.find_all(TRADE_ITEM);
    let item = |index: usize| {
        items.get(index).copied().ok_or_else(|| {
            ErrorKind::page_shape(format!(
                "{TRADE_PANEL} has {} items, need {}",
                items.len(),
                index + 1
            ))
        })
    };

    let status = item(STATUS_ITEM)?.require(STATUS_CELL)?.text();

    let reopen_window = item(REOPEN_ITEM)?
        .find_one(REOPEN_WINDOW)
        .map(|n| n.text())
        .unwrap_or_default();

    let fee_item = item(FEE_ITEM)?;
    let primary = fee_item.find_one(FEE_PRIMARY).map(|n| n.text());
    let fee_rate = match primary {
        Some(text) if !text.is_empty() => text,
        _ => {
            debug!("Primary fee slot empty, using {FEE_FALLBACK}");
            fee_item.require(FEE_FALLBACK)?.text()
        }
    };

    Ok(TradeInfo {
        status,
        reopen_window,
        fee_rate,
    })
}

fn current_manager(doc: &Document) -> Result<(String, NaiveDate), ErrorKind> {
    let table = doc.require(MANAGER_TAB)?.as_table()?;
    let name = table
        .value(0, MANAGER_COLUMN)
        .ok_or_else(|| ErrorKind::page_shape(format!("manager table has no '{MANAGER_COLUMN}' column")))?;
    let tenure = table
        .value(0, TENURE_COLUMN)
        .ok_or_else(|| ErrorKind::page_shape(format!("manager table has no '{TENURE_COLUMN}' column")))?;
    let start = normalize::parse_iso_date(&normalize::tenure_start(tenure))?;
    Ok((name.to_string(), start))
}
