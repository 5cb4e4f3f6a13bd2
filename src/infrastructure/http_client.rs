//! HTTP client for marketplace crawling
//!
//! Wraps `reqwest` with the crawler's user agent, transport timeout, cookie
//! store and optional retries. Politeness limits are applied by the crawler,
//! not here.

use crate::infrastructure::config::{ScrapingConfig, defaults};
use anyhow::{Context, Result};
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, USER_AGENT},
    redirect::{Attempt, Policy},
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// A failed fetch; reported through the crawler's error hook, never fatal
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("{url} is outside the allowed domains")]
    DomainNotAllowed { url: String },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// URL of the failed request
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::DomainNotAllowed { url }
            | Self::InvalidUrl { url, .. } => url,
        }
    }

    /// Transport failures and 5xx responses may succeed on another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::HttpStatus { status, .. } => status.is_server_error(),
            Self::DomainNotAllowed { .. } | Self::InvalidUrl { .. } => false,
        }
    }
}

const MAX_REDIRECTS: usize = 10;

/// Redirect refused because its target host is not allowed
#[derive(Error, Debug)]
#[error("redirect to {0} is outside the allowed domains")]
struct RedirectBlocked(String);

/// Body of a successful fetch and the URL that served it after redirects
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub url: String,
    pub body: String,
}

/// HTTP client configuration for crawling
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Extra attempts after a retryable failure
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub follow_redirects: bool,
    /// Hosts redirects may lead to; empty allows every host
    pub allowed_domains: Vec<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            retries: defaults::RETRIES,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
            follow_redirects: true,
            allowed_domains: Vec::new(),
        }
    }
}

impl From<&ScrapingConfig> for HttpClientConfig {
    fn from(scraping: &ScrapingConfig) -> Self {
        Self {
            user_agent: scraping.user_agent.clone(),
            timeout_seconds: scraping.timeout_seconds,
            retries: scraping.retries,
            allowed_domains: scraping.allowed_domains.clone(),
            ..Self::default()
        }
    }
}

/// Shared HTTP client; cloning is cheap and shares the connection pool
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_store(true)
            .redirect(if config.follow_redirects {
                redirect_policy(config.allowed_domains.clone())
            } else {
                Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Same client settings with redirects limited to `domains`
    pub fn with_allowed_domains(&self, domains: &[String]) -> Result<Self> {
        Self::new(HttpClientConfig {
            allowed_domains: domains.to_vec(),
            ..self.config.clone()
        })
    }

    /// Fetch URL and return the body, retrying transport and 5xx failures
    pub async fn get_text(&self, url: &str) -> Result<FetchedText, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.config.retries + 1,
                        url,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedText, FetchError> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| match blocked_redirect(&source) {
                Some(target) => FetchError::DomainNotAllowed { url: target },
                None => FetchError::Request {
                    url: url.to_string(),
                    source,
                },
            })?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status,
                url: final_url,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: final_url.clone(),
            source,
        })?;

        debug!("Successfully fetched: {} ({} chars)", final_url, body.len());
        Ok(FetchedText {
            url: final_url,
            body,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

/// Follow up to `MAX_REDIRECTS` hops, refusing hosts outside `allowed`
fn redirect_policy(allowed: Vec<String>) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let host = attempt.url().host_str().unwrap_or_default();
        if allowed.is_empty() || allowed.iter().any(|domain| domain == host) {
            attempt.follow()
        } else {
            let target = attempt.url().to_string();
            attempt.error(RedirectBlocked(target))
        }
    })
}

fn blocked_redirect(error: &reqwest::Error) -> Option<String> {
    if !error.is_redirect() {
        return None;
    }
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        if let Some(blocked) = inner.downcast_ref::<RedirectBlocked>() {
            return Some(blocked.0.clone());
        }
        source = inner.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(retries: u32) -> HttpClient {
        HttpClient::new(HttpClientConfig {
            user_agent: "agent/1.0".to_string(),
            retries,
            retry_delay_ms: 10,
            ..HttpClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_from_scraping() {
        let scraping = ScrapingConfig {
            user_agent: "agent/1.0".to_string(),
            timeout_seconds: 5,
            retries: 3,
            allowed_domains: vec!["item.rakuten.co.jp".to_string()],
            ..ScrapingConfig::default()
        };
        let config = HttpClientConfig::from(&scraping);

        assert_eq!(config.user_agent, "agent/1.0");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.retries, 3);
        assert_eq!(config.allowed_domains, vec!["item.rakuten.co.jp"]);
        assert!(config.follow_redirects);
    }

    #[tokio::test]
    async fn test_get_text_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item"))
            .and(header("user-agent", "agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetched = client(0)
            .get_text(&format!("{}/item", server.uri()))
            .await
            .unwrap();
        assert_eq!(fetched.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_redirect_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetched = client(0)
            .with_allowed_domains(&["127.0.0.1".to_string()])
            .unwrap()
            .get_text(&format!("{}/old", server.uri()))
            .await
            .unwrap();

        assert_eq!(fetched.url, format!("{}/new", server.uri()));
        assert_eq!(fetched.body, "moved");
    }

    #[tokio::test]
    async fn test_redirect_to_other_host_is_refused() {
        let server = MockServer::start().await;
        let offsite = format!("http://localhost:{}/offsite", server.address().port());
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", offsite.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/offsite"))
            .respond_with(ResponseTemplate::new(200).set_body_string("offsite"))
            .expect(0)
            .mount(&server)
            .await;

        let error = client(2)
            .with_allowed_domains(&["127.0.0.1".to_string()])
            .unwrap()
            .get_text(&format!("{}/start", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(&error, FetchError::DomainNotAllowed { url } if *url == offsite));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let error = client(2)
            .get_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::HttpStatus { status, .. } if status == StatusCode::NOT_FOUND));
        assert!(!error.is_retryable());
        assert!(error.url().ends_with("/missing"));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let error = client(2).get_text(&server.uri()).await.unwrap_err();
        assert!(error.is_retryable());
    }
}
