use regex::Regex;
use std::fmt::Display;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

static JS_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\s+([A-Za-z_$][\w$]*)\s*=\s*([^;]*);").unwrap());

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error of the last attempt
pub async fn with_retry<F, Fut, T, E>(mut operation: F, retries: usize, delay_ms: u64) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Value of a top-level `var name = value;` statement in a data script.
pub fn js_assignment<'a>(script: &'a str, name: &str) -> Option<&'a str> {
    JS_VAR_RE
        .captures_iter(script)
        .find(|caps| &caps[1] == name)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_with_retry_recovers() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<u32, String> = with_retry(
            || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("boom".to_string())
                } else {
                    Ok(7)
                }
            },
            2,
            1,
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<u32, String> = with_retry(
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            },
            1,
            1,
        )
        .await;
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_js_assignment() {
        let script = "var fS_name = \"华夏成长\";var Data_ACWorthTrend = [[1,1.0]];/*end*/";
        assert_eq!(js_assignment(script, "Data_ACWorthTrend"), Some("[[1,1.0]]"));
        assert_eq!(js_assignment(script, "fS_name"), Some("\"华夏成长\""));
        assert_eq!(js_assignment(script, "Data_netWorthTrend"), None);
        assert_eq!(js_assignment(script, "Data_ACWorth"), None);
    }
}
