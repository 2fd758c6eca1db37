pub mod backfill;
pub mod funds;
pub mod scrape;
pub mod setup;
pub mod show;
pub mod ui;
