use crate::core::history::{DividendEvent, NavPoint, SplitEvent};
use crate::core::profile::{FundListing, FundProfile};
use anyhow::Result;

/// Receives normalized rows. Each call is one transaction.
pub trait FundSink {
    fn upsert_profile(&mut self, profile: &FundProfile) -> Result<()>;
    /// Touches only the listing columns of existing funds.
    fn upsert_listings(&mut self, listings: &[FundListing]) -> Result<usize>;
    fn replace_nav(&mut self, fund_id: &str, points: &[NavPoint]) -> Result<usize>;
    fn replace_cumulative_nav(&mut self, fund_id: &str, points: &[NavPoint]) -> Result<usize>;
    fn replace_dividends(&mut self, fund_id: &str, events: &[DividendEvent]) -> Result<usize>;
    fn replace_splits(&mut self, fund_id: &str, events: &[SplitEvent]) -> Result<usize>;
    /// Every stored fund id, ascending.
    fn fund_ids(&self) -> Result<Vec<String>>;
}
