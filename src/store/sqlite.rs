//! SQLite-backed fund storage.

use crate::core::{DividendEvent, FundListing, FundProfile, FundSink, NavPoint, SplitEvent};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Statement, Transaction, params};
use rust_decimal::prelude::ToPrimitive;
use std::path::Path;
use tracing::{debug, info};

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS funds (
    fund_id VARCHAR(20) PRIMARY KEY,
    fund_name TEXT,
    inception_date DATE,
    latest_scale DECIMAL(10, 2),
    fund_type TEXT,
    trading_status TEXT,
    closed_period INTEGER,
    estimated_opening_time TEXT,
    subscription_rate TEXT,
    redemption_period INTEGER,
    redemption_rate TEXT,
    fund_manager TEXT,
    latest_manager_change_date DATE
);

CREATE TABLE IF NOT EXISTS fund_nav (
    fund_id VARCHAR(20),
    value_date DATE,
    nav DECIMAL(10, 4),
    FOREIGN KEY (fund_id) REFERENCES funds(fund_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_fund_nav_date ON fund_nav (fund_id, value_date);

CREATE TABLE IF NOT EXISTS fund_cumulative_nav (
    fund_id VARCHAR(20),
    value_date DATE,
    cumulative_nav DECIMAL(10, 4),
    FOREIGN KEY (fund_id) REFERENCES funds(fund_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_fund_cumulative_nav_date
    ON fund_cumulative_nav (fund_id, value_date);

CREATE TABLE IF NOT EXISTS fund_dividends (
    fund_id VARCHAR(20),
    ex_dividend_date DATE,
    dividend_per_share DECIMAL(10, 4),
    FOREIGN KEY (fund_id) REFERENCES funds(fund_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_fund_dividends_date
    ON fund_dividends (fund_id, ex_dividend_date);

CREATE TABLE IF NOT EXISTS fund_splits (
    fund_id VARCHAR(20),
    split_date DATE,
    split_type TEXT,
    split_ratio TEXT,
    FOREIGN KEY (fund_id) REFERENCES funds(fund_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_fund_splits_date ON fund_splits (fund_id, split_date);
";

const UPSERT_PROFILE: &str = "
INSERT INTO funds (
    fund_id, fund_name, inception_date, latest_scale, fund_type,
    trading_status, closed_period, estimated_opening_time, subscription_rate, redemption_period,
    redemption_rate, fund_manager, latest_manager_change_date)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(fund_id) DO UPDATE SET
    fund_name = excluded.fund_name,
    inception_date = excluded.inception_date,
    latest_scale = excluded.latest_scale,
    fund_type = excluded.fund_type,
    trading_status = excluded.trading_status,
    closed_period = excluded.closed_period,
    estimated_opening_time = excluded.estimated_opening_time,
    subscription_rate = excluded.subscription_rate,
    redemption_period = excluded.redemption_period,
    redemption_rate = excluded.redemption_rate,
    fund_manager = excluded.fund_manager,
    latest_manager_change_date = excluded.latest_manager_change_date";

const UPSERT_LISTING: &str = "
INSERT INTO funds (fund_id, fund_name, trading_status, subscription_rate)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(fund_id) DO UPDATE SET
    fund_name = excluded.fund_name,
    trading_status = excluded.trading_status,
    subscription_rate = excluded.subscription_rate";

/// A stored `funds` row, every column rendered as text. Columns a listing
/// refresh never fills stay `None` until the fund is scraped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredFund {
    pub fund_id: String,
    pub fund_name: Option<String>,
    pub inception_date: Option<String>,
    pub latest_scale: Option<String>,
    pub fund_type: Option<String>,
    pub trading_status: Option<String>,
    pub closed_period: Option<String>,
    pub estimated_opening_time: Option<String>,
    pub subscription_rate: Option<String>,
    pub redemption_period: Option<String>,
    pub redemption_rate: Option<String>,
    pub fund_manager: Option<String>,
    pub latest_manager_change_date: Option<String>,
}

/// Row counts of the history tables for one fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCounts {
    pub nav: usize,
    pub cumulative_nav: usize,
    pub dividends: usize,
    pub splits: usize,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and its parent directory.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
        debug!("Opening database at {}", path.display());
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(SqliteStore { conn })
    }

    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_TABLES)
            .context("Failed to create database schema")?;
        info!("Database schema is ready");
        Ok(())
    }

    pub fn get_profile(&self, fund_id: &str) -> Result<Option<StoredFund>> {
        self.conn
            .query_row(
                "SELECT fund_id, fund_name, inception_date, CAST(latest_scale AS TEXT), fund_type,
                        trading_status, CAST(closed_period AS TEXT), estimated_opening_time,
                        subscription_rate, CAST(redemption_period AS TEXT), redemption_rate,
                        fund_manager, latest_manager_change_date
                 FROM funds WHERE fund_id = ?1",
                [fund_id],
                |row| {
                    Ok(StoredFund {
                        fund_id: row.get(0)?,
                        fund_name: row.get(1)?,
                        inception_date: row.get(2)?,
                        latest_scale: row.get(3)?,
                        fund_type: row.get(4)?,
                        trading_status: row.get(5)?,
                        closed_period: row.get(6)?,
                        estimated_opening_time: row.get(7)?,
                        subscription_rate: row.get(8)?,
                        redemption_period: row.get(9)?,
                        redemption_rate: row.get(10)?,
                        fund_manager: row.get(11)?,
                        latest_manager_change_date: row.get(12)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("Failed to load fund {fund_id}"))
    }

    pub fn history_counts(&self, fund_id: &str) -> Result<HistoryCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE fund_id = ?1"),
                [fund_id],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(n).unwrap_or_default())
        };
        Ok(HistoryCounts {
            nav: count("fund_nav")?,
            cumulative_nav: count("fund_cumulative_nav")?,
            dividends: count("fund_dividends")?,
            splits: count("fund_splits")?,
        })
    }

    /// Swaps every row of `fund_id` in `table` for `rows`, in one transaction.
    fn replace_rows<T>(
        &mut self,
        table: &str,
        fund_id: &str,
        insert_sql: &str,
        rows: &[T],
        bind: impl Fn(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(&format!("DELETE FROM {table} WHERE fund_id = ?1"), [fund_id])?;
        let inserted = insert_all(&tx, insert_sql, rows, bind)
            .with_context(|| format!("Failed to write {table} rows for fund {fund_id}"))?;
        tx.commit()?;

        debug!(
            "Replaced {} {} rows of fund {} with {}",
            removed, table, fund_id, inserted
        );
        Ok(inserted)
    }
}

fn insert_all<T>(
    tx: &Transaction<'_>,
    sql: &str,
    rows: &[T],
    bind: impl Fn(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
) -> Result<usize> {
    let mut stmt = tx.prepare(sql)?;
    let mut inserted = 0;
    for row in rows {
        inserted += bind(&mut stmt, row)?;
    }
    Ok(inserted)
}

impl FundSink for SqliteStore {
    fn upsert_profile(&mut self, profile: &FundProfile) -> Result<()> {
        let scale = profile.scale.to_f64().with_context(|| {
            format!("Scale {} of fund {} is not representable", profile.scale, profile.fund_id)
        })?;

        let tx = self.conn.transaction()?;
        tx.execute(
            UPSERT_PROFILE,
            params![
                profile.fund_id,
                profile.short_name,
                profile.inception_date.to_string(),
                scale,
                profile.fund_type,
                profile.trading_status,
                profile.closed_period.months(),
                profile.estimated_reopen_window,
                profile.subscription_fee_rate,
                profile.min_redemption_period_days,
                profile.min_redemption_rate,
                profile.fund_manager,
                profile.latest_manager_change_date.to_string(),
            ],
        )
        .with_context(|| format!("Failed to upsert fund {}", profile.fund_id))?;
        tx.commit()?;
        Ok(())
    }

    fn upsert_listings(&mut self, listings: &[FundListing]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let written = insert_all(&tx, UPSERT_LISTING, listings, |stmt, listing| {
            stmt.execute(params![
                listing.fund_id,
                listing.short_name,
                listing.trading_status,
                listing.subscription_fee_rate,
            ])
        })
        .context("Failed to upsert fund listings")?;
        tx.commit()?;
        info!("Upserted {} fund listings", written);
        Ok(written)
    }

    fn replace_nav(&mut self, fund_id: &str, points: &[NavPoint]) -> Result<usize> {
        self.replace_rows(
            "fund_nav",
            fund_id,
            "INSERT OR REPLACE INTO fund_nav (fund_id, value_date, nav) VALUES (?1, ?2, ?3)",
            points,
            |stmt, p| stmt.execute(params![p.fund_id, p.date.to_string(), p.value]),
        )
    }

    fn replace_cumulative_nav(&mut self, fund_id: &str, points: &[NavPoint]) -> Result<usize> {
        self.replace_rows(
            "fund_cumulative_nav",
            fund_id,
            "INSERT OR REPLACE INTO fund_cumulative_nav (fund_id, value_date, cumulative_nav)
             VALUES (?1, ?2, ?3)",
            points,
            |stmt, p| stmt.execute(params![p.fund_id, p.date.to_string(), p.value]),
        )
    }

    fn replace_dividends(&mut self, fund_id: &str, events: &[DividendEvent]) -> Result<usize> {
        self.replace_rows(
            "fund_dividends",
            fund_id,
            "INSERT OR REPLACE INTO fund_dividends (fund_id, ex_dividend_date, dividend_per_share)
             VALUES (?1, ?2, ?3)",
            events,
            |stmt, e| {
                stmt.execute(params![
                    e.fund_id,
                    e.ex_dividend_date.to_string(),
                    e.dividend_per_share
                ])
            },
        )
    }

    fn replace_splits(&mut self, fund_id: &str, events: &[SplitEvent]) -> Result<usize> {
        self.replace_rows(
            "fund_splits",
            fund_id,
            "INSERT OR REPLACE INTO fund_splits (fund_id, split_date, split_type, split_ratio)
             VALUES (?1, ?2, ?3, ?4)",
            events,
            |stmt, e| {
                stmt.execute(params![
                    e.fund_id,
                    e.split_date.to_string(),
                    e.split_type,
                    e.split_ratio
                ])
            },
        )
    }

    fn fund_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT fund_id FROM funds ORDER BY fund_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("Failed to list fund ids")?;
        Ok(ids)
    }
}
