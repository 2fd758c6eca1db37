//! Fund page extraction: locate markup, normalize text, assemble records.

pub mod basic_info;
pub mod locator;
pub mod normalize;
pub mod redemption;

#[cfg(test)]
pub(crate) mod testing;

use crate::core::config::EastmoneyProviderConfig;
use crate::core::{
    BasicInfo, ExtractError, FundProfile, PageFetcher, RedemptionInfo, Stage, StageContext,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds fund profiles from the detail page and the fee page of each fund.
pub struct FundScraper {
    fetcher: Arc<dyn PageFetcher>,
    detail_base_url: String,
    fee_base_url: String,
}

impl FundScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &EastmoneyProviderConfig) -> Self {
        FundScraper {
            fetcher,
            detail_base_url: config.detail_base_url.trim_end_matches('/').to_string(),
            fee_base_url: config.fee_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn detail_url(&self, fund_id: &str) -> String {
        format!("{}/{}.html", self.detail_base_url, fund_id)
    }

    pub fn fee_url(&self, fund_id: &str) -> String {
        format!("{}/jjfl_{}.html", self.fee_base_url, fund_id)
    }

    #[instrument(name = "ExtractBasicInfo", skip(self), fields(fund_id = %fund_id))]
    pub async fn extract_basic_info(&self, fund_id: &str) -> Result<BasicInfo, ExtractError> {
        let url = self.detail_url(fund_id);
        debug!("Requesting detail page from {}", url);
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .stage(fund_id, Stage::FetchDetail)?;
        basic_info::parse_basic_info(fund_id, &html)
    }

    /// Money-market funds have no redemption schedule: both fields come back
    /// empty and the fee page is never requested.
    #[instrument(name = "ExtractMinRedemption", skip(self), fields(fund_id = %fund_id))]
    pub async fn extract_min_redemption(
        &self,
        fund_id: &str,
        is_money_market: bool,
    ) -> Result<RedemptionInfo, ExtractError> {
        if is_money_market {
            debug!("Money-market fund, skipping redemption schedule");
            return Ok(RedemptionInfo::default());
        }

        let url = self.fee_url(fund_id);
        debug!("Requesting fee page from {}", url);
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .stage(fund_id, Stage::FetchFeePage)?;
        redemption::parse_min_redemption(fund_id, &html)
    }

    /// Full profile of one fund. Any failing stage fails the whole record.
    pub async fn extract_profile(&self, fund_id: &str) -> Result<FundProfile, ExtractError> {
        let basic = self.extract_basic_info(fund_id).await?;
        let redemption = self
            .extract_min_redemption(fund_id, basic.is_money_market())
            .await?;
        Ok(FundProfile::assemble(fund_id, basic, redemption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClosedPeriod, ErrorKind, FetchError};
    use testing::{DetailPage, FeePage, FixtureFetcher};

    fn scraper(fetcher: Arc<FixtureFetcher>) -> FundScraper {
        let config = EastmoneyProviderConfig {
            detail_base_url: "http://detail.test/".to_string(),
            fee_base_url: "http://fee.test".to_string(),
            data_base_url: "http://data.test".to_string(),
        };
        FundScraper::new(fetcher, &config)
    }

    #[test]
    fn test_page_urls() {
        let scraper = scraper(Arc::new(FixtureFetcher::default()));
        assert_eq!(scraper.detail_url("000001"), "http://detail.test/000001.html");
        assert_eq!(scraper.fee_url("000001"), "http://fee.test/jjfl_000001.html");
    }

    #[tokio::test]
    async fn test_money_market_skips_fee_page() {
        let fetcher = Arc::new(FixtureFetcher::default());
        let scraper = scraper(Arc::clone(&fetcher));

        let info = scraper.extract_min_redemption("000009", true).await.unwrap();

        assert_eq!(info.period_days, "");
        assert_eq!(info.rate, "");
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_extract_profile_for_money_market_fund() {
        let fetcher = Arc::new(FixtureFetcher::default().with_page(
            "http://detail.test/000009.html",
            DetailPage {
                name: "易方达天天理财货币A(000009)",
                fund_type: "货币型",
                ..Default::default()
            }
            .render(),
        ));
        let scraper = scraper(Arc::clone(&fetcher));

        let profile = scraper.extract_profile("000009").await.unwrap();

        assert_eq!(profile.fund_id, "000009");
        assert_eq!(profile.short_name, "易方达天天理财货币A");
        assert_eq!(profile.min_redemption_period_days, "");
        assert_eq!(profile.min_redemption_rate, "");
        // Only the detail page was requested
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_extract_profile_fetches_fee_page() {
        let fetcher = Arc::new(
            FixtureFetcher::default()
                .with_page(
                    "http://detail.test/000001.html",
                    DetailPage {
                        closed_period: Some("封闭期：2年"),
                        ..Default::default()
                    }
                    .render(),
                )
                .with_page("http://fee.test/jjfl_000001.html", FeePage::default().render()),
        );
        let scraper = scraper(Arc::clone(&fetcher));

        let profile = scraper.extract_profile("000001").await.unwrap();

        assert_eq!(profile.short_name, "华夏成长混合");
        assert_eq!(profile.closed_period, ClosedPeriod::Months(24));
        assert_eq!(profile.min_redemption_period_days, "730");
        assert_eq!(profile.min_redemption_rate, "0.00%");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_fee_page_fails_whole_record() {
        let fetcher = Arc::new(FixtureFetcher::default().with_page(
            "http://detail.test/000001.html",
            DetailPage::default().render(),
        ));
        let scraper = scraper(fetcher);

        let err = scraper.extract_profile("000001").await.unwrap_err();

        assert_eq!(err.stage, Stage::FetchFeePage);
        assert!(matches!(
            err.kind,
            ErrorKind::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_tagged_with_stage() {
        let scraper = scraper(Arc::new(FixtureFetcher::default()));

        let err = scraper.extract_basic_info("123456").await.unwrap_err();

        assert_eq!(err.fund_id, "123456");
        assert_eq!(err.stage, Stage::FetchDetail);
    }

    #[tokio::test]
    async fn test_missing_info_panel_produces_no_record() {
        let fetcher = Arc::new(
            FixtureFetcher::default()
                .with_page(
                    "http://detail.test/000001.html",
                    DetailPage {
                        with_info_panel: false,
                        ..Default::default()
                    }
                    .render(),
                )
                .with_page("http://fee.test/jjfl_000001.html", FeePage::default().render()),
        );
        let scraper = scraper(Arc::clone(&fetcher));

        let err = scraper.extract_profile("000001").await.unwrap_err();

        assert_eq!(err.fund_id, "000001");
        assert_eq!(err.stage, Stage::InfoTable);
        assert!(matches!(err.kind, ErrorKind::PageShape(_)));
        // Aborted before the fee page
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_extraction_is_idempotent() {
        let fetcher = Arc::new(
            FixtureFetcher::default()
                .with_page("http://detail.test/000001.html", DetailPage::default().render())
                .with_page("http://fee.test/jjfl_000001.html", FeePage::default().render()),
        );
        let scraper = scraper(fetcher);

        let first = scraper.extract_profile("000001").await.unwrap();
        let second = scraper.extract_profile("000001").await.unwrap();
        assert_eq!(first, second);
    }
}
