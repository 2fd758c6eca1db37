use crate::core::config::HttpConfig;
use crate::core::{FetchError, PageFetcher};
use crate::providers::util::with_retry;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Plain GET over reqwest. Transport failures are retried, HTTP status
/// failures are reported straight away.
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(HttpFetcher {
            client,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = with_retry(
            || async { self.client.get(url).send().await },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Pages are served as UTF-8; stray bytes must not fail the fetch
        let body = response.bytes().await.map_err(transport)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig {
            retries: 0,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/000001.html"))
            .and(header("user-agent", "fundscrape/0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>华夏</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/000001.html", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>华夏</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&HttpConfig {
            retries: 3,
            retry_delay_ms: 1,
            ..Default::default()
        })
        .unwrap();
        let url = format!("{}/missing.html", mock_server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err, FetchError::Status { url, status: 404 });
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xff]))
            .mount(&mock_server)
            .await;

        let body = fetcher().fetch(&mock_server.uri()).await.unwrap();
        assert!(body.starts_with("ok"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let fetcher = fetcher();
        let err = fetcher.fetch("http://127.0.0.1:1/none.html").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
