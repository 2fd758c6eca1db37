use super::ui;
use crate::store::{HistoryCounts, SqliteStore, StoredFund};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};

pub fn run(store: &SqliteStore, fund_id: &str) -> Result<()> {
    let Some(fund) = store.get_profile(fund_id)? else {
        anyhow::bail!("Fund {fund_id} is not in the database");
    };
    let counts = store.history_counts(fund_id)?;

    println!(
        "\nFund: {}",
        ui::style_text(
            &format!("{} {}", fund.fund_id, fund.fund_name.as_deref().unwrap_or_default()),
            ui::StyleType::Title
        )
    );
    println!("{}", profile_table(&fund));
    println!("{}", history_table(&counts));
    if fund.inception_date.is_none() {
        println!(
            "{}",
            ui::style_text(
                "Only the listing is stored; run `scrape` for the full profile.",
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

fn profile_table(fund: &StoredFund) -> Table {
    let rows: [(&str, &Option<String>); 12] = [
        ("Name", &fund.fund_name),
        ("Type", &fund.fund_type),
        ("Inception", &fund.inception_date),
        ("Scale (亿)", &fund.latest_scale),
        ("Trading status", &fund.trading_status),
        ("Closed period (months)", &fund.closed_period),
        ("Estimated reopen", &fund.estimated_opening_time),
        ("Subscription fee", &fund.subscription_rate),
        ("Min redemption period (days)", &fund.redemption_period),
        ("Min redemption rate", &fund.redemption_rate),
        ("Manager", &fund.fund_manager),
        ("Manager since", &fund.latest_manager_change_date),
    ];

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), ui::optional_text_cell(value.as_deref())]);
    }
    table
}

fn history_table(counts: &HistoryCounts) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("History"), ui::header_cell("Rows")]);
    for (label, count) in [
        ("NAV", counts.nav),
        ("Cumulative NAV", counts.cumulative_nav),
        ("Dividends", counts.dividends),
        ("Splits", counts.splits),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
