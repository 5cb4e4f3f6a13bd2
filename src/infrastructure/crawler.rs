//! Polite crawler for marketplace pages
//!
//! `visit` fetches a start URL and, when a follow selector is configured,
//! the pages it links to up to `max_depth`. Hosts are restricted to an
//! allowlist and requests are throttled per domain glob. Failed fetches go
//! to the error hook and never abort the crawl; `visit` returns once every
//! discovered request has completed.

use crate::infrastructure::config::{ScrapingConfig, defaults, rakuten};
use crate::infrastructure::http_client::{FetchError, HttpClient};
use anyhow::{Context, Result, anyhow};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

/// Callback receiving every failed fetch of a crawl
pub type ErrorHook = Arc<dyn Fn(&FetchError) + Send + Sync>;

/// Politeness limit for hosts matching a domain glob
#[derive(Debug, Clone)]
pub struct LimitRule {
    /// Host pattern where `*` matches any run of characters
    pub domain_glob: String,
    /// Requests in flight at once
    pub parallelism: usize,
    /// Minimum spacing between consecutive requests
    pub delay: Duration,
}

impl Default for LimitRule {
    fn default() -> Self {
        Self {
            domain_glob: rakuten::DOMAIN_GLOB.to_string(),
            parallelism: defaults::PARALLELISM,
            delay: Duration::from_millis(defaults::REQUEST_DELAY_MS),
        }
    }
}

/// Crawl boundaries and politeness settings
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Hosts that may be fetched; empty allows every host
    pub allowed_domains: Vec<String>,
    /// Depth of the start URL is 1; links are followed while below this
    pub max_depth: u32,
    pub allow_revisit: bool,
    /// Links to follow from fetched pages, none when unset
    pub follow_selector: Option<String>,
    pub limit_rules: Vec<LimitRule>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::from(&ScrapingConfig::default())
    }
}

impl From<&ScrapingConfig> for CrawlerConfig {
    fn from(scraping: &ScrapingConfig) -> Self {
        Self {
            allowed_domains: scraping.allowed_domains.clone(),
            max_depth: scraping.max_depth,
            allow_revisit: true,
            follow_selector: None,
            limit_rules: vec![LimitRule {
                domain_glob: scraping.domain_glob.clone(),
                parallelism: scraping.parallelism,
                delay: Duration::from_millis(scraping.request_delay_ms),
            }],
        }
    }
}

/// A successfully fetched page; `url` is where redirects ended
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub depth: u32,
    pub body: String,
}

struct CompiledRule {
    pattern: Regex,
    slots: Arc<Semaphore>,
    pacer: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

/// Per-glob concurrency and pacing, shared by every crawl of one crawler
struct PolitenessLimiter {
    rules: Vec<CompiledRule>,
}

impl PolitenessLimiter {
    fn new(rules: &[LimitRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| -> Result<CompiledRule> {
                let pattern = format!("^{}$", regex::escape(&rule.domain_glob).replace(r"\*", ".*"));
                Ok(CompiledRule {
                    pattern: Regex::new(&pattern)
                        .with_context(|| format!("Invalid domain glob '{}'", rule.domain_glob))?,
                    slots: Arc::new(Semaphore::new(rule.parallelism.max(1))),
                    pacer: Quota::with_period(rule.delay).map(RateLimiter::direct),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Wait for a free slot and the pacing delay of the first matching rule
    async fn acquire(&self, host: &str) -> Option<OwnedSemaphorePermit> {
        let rule = self.rules.iter().find(|rule| rule.pattern.is_match(host))?;
        let permit = Arc::clone(&rule.slots).acquire_owned().await.ok()?;
        if let Some(pacer) = &rule.pacer {
            pacer.until_ready().await;
        }
        Some(permit)
    }
}

/// Crawler bound to one HTTP client and one set of politeness limits
#[derive(Clone)]
pub struct Crawler {
    client: HttpClient,
    config: CrawlerConfig,
    follow_selector: Option<Selector>,
    limiter: Arc<PolitenessLimiter>,
    on_error: ErrorHook,
}

impl Crawler {
    pub fn new(client: HttpClient, config: CrawlerConfig) -> Result<Self> {
        let follow_selector = config
            .follow_selector
            .as_deref()
            .map(|s| Selector::parse(s).map_err(|e| anyhow!("Invalid follow selector '{s}': {e}")))
            .transpose()?;
        let limiter = Arc::new(PolitenessLimiter::new(&config.limit_rules)?);
        let client = client.with_allowed_domains(&config.allowed_domains)?;

        Ok(Self {
            client,
            config,
            follow_selector,
            limiter,
            on_error: Arc::new(|e: &FetchError| warn!("Error scraping {}: {}", e.url(), e)),
        })
    }

    /// Replace the default error hook, which logs at warn level
    #[must_use]
    pub fn with_error_hook(mut self, hook: impl Fn(&FetchError) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(hook);
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl from `url` and return every page fetched, in completion order
    pub async fn visit(&self, url: &str) -> Vec<FetchedPage> {
        let mut pages = Vec::new();
        let mut seen = HashSet::new();
        let mut tasks = JoinSet::new();

        self.schedule(&mut tasks, &mut seen, url.to_string(), 1);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((page, links))) => {
                    if page.depth < self.config.max_depth {
                        for link in links {
                            self.schedule(&mut tasks, &mut seen, link, page.depth + 1);
                        }
                    }
                    pages.push(page);
                }
                Ok(Err(e)) => (self.on_error)(&e),
                Err(e) => warn!("Crawl task failed: {}", e),
            }
        }

        info!("Visited {} pages starting from {}", pages.len(), url);
        pages
    }

    fn schedule(
        &self,
        tasks: &mut JoinSet<Result<(FetchedPage, Vec<String>), FetchError>>,
        seen: &mut HashSet<String>,
        url: String,
        depth: u32,
    ) {
        let host = match Url::parse(&url) {
            Ok(parsed) => parsed.host_str().unwrap_or_default().to_string(),
            Err(e) => {
                (self.on_error)(&FetchError::InvalidUrl {
                    url,
                    reason: e.to_string(),
                });
                return;
            }
        };

        if !self.is_allowed(&host) {
            (self.on_error)(&FetchError::DomainNotAllowed { url });
            return;
        }

        if !seen.insert(url.clone()) && !self.config.allow_revisit {
            debug!("Skipping already visited {}", url);
            return;
        }

        let client = self.client.clone();
        let limiter = Arc::clone(&self.limiter);
        let follow_selector = self.follow_selector.clone();

        tasks.spawn(async move {
            let _permit = limiter.acquire(&host).await;
            let fetched = client.get_text(&url).await?;

            // Parse links synchronously; Html is not Send
            let links = follow_selector
                .as_ref()
                .map(|selector| extract_links(&fetched.body, &fetched.url, selector))
                .unwrap_or_default();

            let page = FetchedPage {
                url: fetched.url,
                depth,
                body: fetched.body,
            };
            Ok((page, links))
        });
    }

    fn is_allowed(&self, host: &str) -> bool {
        self.config.allowed_domains.is_empty()
            || self.config.allowed_domains.iter().any(|allowed| allowed == host)
    }
}

/// Absolute URLs of the `href`s matched by `selector`
fn extract_links(body: &str, page_url: &str, selector: &Selector) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let html = Html::parse_document(body);
    html.select(selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .map(String::from)
        .collect()
}
