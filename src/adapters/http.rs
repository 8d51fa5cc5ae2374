// HTTP download of the source list.

use crate::core::retry::{retry_with_backoff, IsRetryable, RetryPolicy};
use crate::domain::model::RawListing;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::reporter::Reporter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::{redirect, Client, Proxy, StatusCode};
use std::fmt;
use std::time::Duration;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; USOM-LIST-ADGUARD-FORMATTER; https://github.com/mertcangokgoz/usom-adguard-mirror)";
const ACCEPT_VALUE: &str =
    "text/plain,text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "tr-TR,tr;q=0.9,en;q=0.8";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            proxy: config.proxy().map(str::to_string),
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            retry: config.retry_policy().clone(),
        }
    }
}

/// Why a single download attempt failed.
#[derive(Debug)]
enum AttemptError {
    Transport(reqwest::Error),
    Status(StatusCode),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Transport(e) => write!(f, "{}", e),
            AttemptError::Status(status) => write!(f, "HTTP {}", status),
        }
    }
}

impl IsRetryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            // 無法建立請求（例如網址本身有誤）重試也沒用
            AttemptError::Transport(e) => !e.is_builder(),
            AttemptError::Status(_) => true,
        }
    }
}

pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            // 單次請求的總上限，避免緩慢傳輸無限拖延
            .timeout(options.connect_timeout.saturating_add(options.read_timeout));

        if let Some(proxy_url) = options.proxy.as_deref() {
            // HTTP 與 HTTPS 走同一個代理
            let proxy = Proxy::all(proxy_url).map_err(|e| EtlError::InvalidConfigValueError {
                field: "proxy".to_string(),
                value: proxy_url.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self {
            client,
            retry: options.retry,
        })
    }

    /// Download `url`, retrying transient failures under the configured policy.
    pub async fn fetch(&self, url: &str, reporter: &dyn Reporter) -> Result<RawListing> {
        let outcome = retry_with_backoff(&self.retry, |attempt| async move {
            reporter.info(&format!("Downloading: {}", url));
            reporter.debug(&format!(
                "Attempt {}/{} for {}",
                attempt, self.retry.max_attempts, url
            ));
            self.fetch_once(url).await
        })
        .await;

        match outcome {
            Ok(body) => {
                reporter.debug(&format!("Downloaded {} bytes from {}", body.len(), url));
                Ok(RawListing::new(url, body))
            }
            Err(e) => {
                reporter.error(&format!("Error occurred while downloading the URL list: {}", e));
                Err(EtlError::FetchError {
                    url: url.to_string(),
                    attempts: e.attempts,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        response.text().await.map_err(AttemptError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::reporter::{Level, MemoryReporter};
    use httpmock::prelude::*;

    fn fast_options(max_attempts: u32) -> FetchOptions {
        FetchOptions {
            retry: RetryPolicy {
                max_attempts,
                max_elapsed: Duration::from_secs(30),
                initial_delay: Duration::from_millis(10),
                multiplier: 2.0,
                max_delay: None,
                jitter: false,
            },
            ..FetchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_headers() {
        let server = MockServer::start();
        let list_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/url-list.txt")
                .header("user-agent", USER_AGENT)
                .header("accept-language", ACCEPT_LANGUAGE_VALUE)
                .header("cache-control", "no-cache");
            then.status(200)
                .header("Content-Type", "text/plain")
                .body("evil.com\nbad.org\n");
        });

        let reporter = MemoryReporter::new();
        let fetcher = Fetcher::new(fast_options(3)).unwrap();
        let url = server.url("/url-list.txt");

        let listing = fetcher.fetch(&url, &reporter).await.unwrap();

        list_mock.assert();
        assert_eq!(listing.body, "evil.com\nbad.org\n");
        assert_eq!(listing.url, url);
        assert_eq!(reporter.messages(Level::Info), vec![format!("Downloading: {}", url)]);
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start();
        let redirect_mock = server.mock(|when, then| {
            when.method(GET).path("/old");
            then.status(302).header("Location", "/new");
        });
        let target_mock = server.mock(|when, then| {
            when.method(GET).path("/new");
            then.status(200).body("moved.example\n");
        });

        let fetcher = Fetcher::new(fast_options(1)).unwrap();
        let listing = fetcher
            .fetch(&server.url("/old"), &MemoryReporter::new())
            .await
            .unwrap();

        redirect_mock.assert();
        target_mock.assert();
        assert_eq!(listing.body, "moved.example\n");
    }

    #[tokio::test]
    async fn test_non_success_status_is_retried_until_ceiling() {
        let server = MockServer::start();
        let failing = server.mock(|when, then| {
            when.method(GET).path("/url-list.txt");
            then.status(503);
        });

        let reporter = MemoryReporter::new();
        let fetcher = Fetcher::new(fast_options(3)).unwrap();

        let result = fetcher.fetch(&server.url("/url-list.txt"), &reporter).await;

        failing.assert_hits(3);
        match result {
            Err(EtlError::FetchError { attempts, message, .. }) => {
                assert_eq!(attempts, 3);
                assert!(message.contains("503"));
            }
            other => panic!("expected FetchError, got {:?}", other),
        }
        assert_eq!(reporter.messages(Level::Info).len(), 3);
        assert_eq!(reporter.messages(Level::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_fetch_error() {
        // 取得一個已關閉的埠
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let fetcher = Fetcher::new(fast_options(2)).unwrap();
        let result = fetcher
            .fetch(&format!("http://127.0.0.1:{}/list", port), &MemoryReporter::new())
            .await;

        assert!(matches!(result, Err(EtlError::FetchError { attempts: 2, .. })));
    }

    #[tokio::test]
    async fn test_unbuildable_request_is_not_retried() {
        let fetcher = Fetcher::new(fast_options(5)).unwrap();
        let result = fetcher.fetch("not a url", &MemoryReporter::new()).await;

        assert!(matches!(result, Err(EtlError::FetchError { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn test_configured_proxy_carries_the_request() {
        let proxy = MockServer::start();
        let proxied = proxy.mock(|when, then| {
            when.method(GET).path("/url-list.txt");
            then.status(200).body("via-proxy.example\n");
        });

        let options = FetchOptions {
            proxy: Some(proxy.base_url()),
            ..fast_options(1)
        };
        let fetcher = Fetcher::new(options).unwrap();

        let listing = fetcher
            .fetch("http://usom.invalid/url-list.txt", &MemoryReporter::new())
            .await
            .unwrap();

        proxied.assert_hits(1);
        assert_eq!(listing.body, "via-proxy.example\n");
    }

    #[tokio::test]
    async fn test_slow_response_is_cut_by_request_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(Duration::from_secs(5))
                .body("late.example\n");
        });

        let options = FetchOptions {
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
            ..fast_options(1)
        };
        let fetcher = Fetcher::new(options).unwrap();
        let started = std::time::Instant::now();

        let result = fetcher
            .fetch(&server.url("/slow"), &MemoryReporter::new())
            .await;

        assert!(matches!(result, Err(EtlError::FetchError { attempts: 1, .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let options = FetchOptions {
            proxy: Some("http://[not-a-host".to_string()),
            ..FetchOptions::default()
        };
        assert!(matches!(
            Fetcher::new(options),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }
}
