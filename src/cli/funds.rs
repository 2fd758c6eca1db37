use crate::core::{FundSink, HistorySource};
use anyhow::{Context, Result};
use tracing::info;

/// Upserts the open-fund listing. Returns the number of listings written.
pub async fn refresh_funds(source: &dyn HistorySource, sink: &mut dyn FundSink) -> Result<usize> {
    let listings = source.list_funds().await?;
    info!("Fetched {} fund listings", listings.len());
    sink.upsert_listings(&listings)
        .context("Failed to store fund listings")
}

/// Fund ids for a batch: the explicit ones if given, else every stored fund
/// in ascending order, capped at `limit`.
pub fn resolve_fund_ids(
    sink: &dyn FundSink,
    explicit: &[String],
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut ids = if explicit.is_empty() {
        sink.fund_ids()?
    } else {
        explicit.to_vec()
    };
    if let Some(limit) = limit {
        ids.truncate(limit);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DividendEvent, FundListing, NavPoint, SplitEvent};
    use crate::store::SqliteStore;
    use async_trait::async_trait;

    struct ListingSource(Vec<FundListing>);

    #[async_trait]
    impl HistorySource for ListingSource {
        async fn list_funds(&self) -> Result<Vec<FundListing>> {
            Ok(self.0.clone())
        }
        async fn nav_history(&self, _: &str) -> Result<Vec<NavPoint>> {
            Ok(Vec::new())
        }
        async fn cumulative_nav_history(&self, _: &str) -> Result<Vec<NavPoint>> {
            Ok(Vec::new())
        }
        async fn dividends(&self, _: &str) -> Result<Vec<DividendEvent>> {
            Ok(Vec::new())
        }
        async fn splits(&self, _: &str) -> Result<Vec<SplitEvent>> {
            Ok(Vec::new())
        }
    }

    fn listing(fund_id: &str) -> FundListing {
        FundListing {
            fund_id: fund_id.to_string(),
            short_name: format!("基金{fund_id}"),
            trading_status: "开放申购".to_string(),
            subscription_fee_rate: "0.15%".to_string(),
        }
    }

    async fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        let source = ListingSource(vec![listing("000003"), listing("000001"), listing("000002")]);
        assert_eq!(refresh_funds(&source, &mut store).await.unwrap(), 3);
        store
    }

    #[tokio::test]
    async fn test_refresh_then_resolve_in_ascending_order() {
        let store = seeded_store().await;
        assert_eq!(
            resolve_fund_ids(&store, &[], None).unwrap(),
            vec!["000001", "000002", "000003"]
        );
        assert_eq!(
            resolve_fund_ids(&store, &[], Some(2)).unwrap(),
            vec!["000001", "000002"]
        );
    }

    #[tokio::test]
    async fn test_explicit_ids_win() {
        let store = seeded_store().await;
        let explicit = vec!["161725".to_string(), "000001".to_string()];
        assert_eq!(resolve_fund_ids(&store, &explicit, None).unwrap(), explicit);
        assert_eq!(
            resolve_fund_ids(&store, &explicit, Some(1)).unwrap(),
            vec!["161725"]
        );
    }
}
