use crate::events::{CircleEventEmitter, CircleEventSender};
use crate::headers::add_report_headers;
use crate::r#trait::ReportFetcher;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::types::DEFAULT_BASE_URL;
use crate::{LfCircleError, Result};
use async_trait::async_trait;
use http_client::{HttpClient, Request, Response};
use http_types::{Method, Url};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Marker that only appears on a real listening report page.
const REPORT_MARKER: &str = "report-headline-total";

const MAX_REDIRECTS: u32 = 5;

/// Default minimum time between two requests to Last.fm.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Text patterns that mark a throttling page served instead of a report.
fn default_rate_limit_patterns() -> Vec<String> {
    [
        "you're requesting too many pages",
        "slow down",
        "too fast",
        "rate limit",
        "throttled",
        "temporarily blocked",
        "verify you're human",
        "service temporarily unavailable",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// Whether a response body looks like a throttling notice.
///
/// Real report pages are never treated as throttled, whatever text they contain.
fn looks_rate_limited(body: &str, patterns: &[String]) -> bool {
    if body.contains(REPORT_MARKER) {
        return false;
    }
    let body_lower = body.to_lowercase();
    patterns
        .iter()
        .any(|pattern| body_lower.contains(&pattern.to_lowercase()))
}

/// Spaces out request start times so concurrent fetches stay polite.
#[derive(Debug)]
struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    async fn wait_turn(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last_request = Some(Instant::now());
    }
}

/// Fetches weekly listening report pages from the Last.fm website.
///
/// Requests are paced (one request start per [`DEFAULT_MIN_INTERVAL`] by
/// default, shared across concurrent fetches), redirects are followed, and
/// rate limits are retried with backoff.
///
/// # Examples
///
/// ```rust,no_run
/// use lfcircle::{LastFmClient, ReportFetcher};
///
/// # tokio_test::block_on(async {
/// let client = LastFmClient::new(Box::new(http_client::native::NativeClient::new()));
/// let markup = client.fetch("user1").await?;
/// let report = lfcircle::extract(&markup, "user1")?;
/// println!("{} scrobbles", report.scrobble_count);
/// # Ok::<(), lfcircle::LfCircleError>(())
/// # });
/// ```
pub struct LastFmClient {
    client: Box<dyn HttpClient>,
    base_url: String,
    retry_config: RetryConfig,
    rate_limit_patterns: Vec<String>,
    pacer: RequestPacer,
    debug_save_responses: bool,
    events: Option<CircleEventSender>,
}

impl LastFmClient {
    /// Create a new [`LastFmClient`] with the default Last.fm URL.
    pub fn new(client: Box<dyn HttpClient>) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.to_string())
    }

    /// Create a new [`LastFmClient`] with a custom base URL.
    ///
    /// This is useful for testing or for pointing at a mirror.
    pub fn with_base_url(client: Box<dyn HttpClient>, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
            rate_limit_patterns: default_rate_limit_patterns(),
            pacer: RequestPacer::new(DEFAULT_MIN_INTERVAL),
            debug_save_responses: std::env::var("LFCIRCLE_DEBUG_SAVE_RESPONSES").is_ok(),
            events: None,
        }
    }

    /// Replace the rate limit retry configuration.
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Replace the minimum time between request starts.
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.pacer = RequestPacer::new(min_interval);
        self
    }

    /// Emit [`RateLimited`](crate::CircleEvent::RateLimited) events on this channel.
    pub fn with_events(mut self, events: CircleEventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Fetch a page once, following redirects, without retrying.
    async fn get_page(&self, url: &str) -> Result<String> {
        let mut current = url.to_string();

        for _ in 0..=MAX_REDIRECTS {
            self.pacer.wait_turn().await;

            let parsed = Url::parse(&current)
                .map_err(|e| LfCircleError::Retrieval(format!("invalid URL '{current}': {e}")))?;
            let mut request = Request::new(Method::Get, parsed);
            add_report_headers(&mut request);

            log::debug!("GET {current}");
            let mut response = self
                .client
                .send(request)
                .await
                .map_err(|e| LfCircleError::Retrieval(e.to_string()))?;
            log::debug!("Response status: {}", response.status());

            if let Some(location) = redirect_location(&response) {
                current = self.resolve_redirect(&current, &location);
                log::debug!("Following redirect to {current}");
                continue;
            }

            // Handle explicit rate limit responses
            if response.status() == 429 {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|h| h.get(0))
                    .and_then(|v| v.as_str().parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(LfCircleError::RateLimit { retry_after });
            }

            let status = response.status();
            let body = response
                .body_string()
                .await
                .map_err(|e| LfCircleError::Retrieval(e.to_string()))?;

            if self.debug_save_responses {
                self.save_debug_response(&current, status.into(), &body);
            }

            if !status.is_success() {
                return Err(LfCircleError::Retrieval(format!(
                    "non-nominal status code {status} for '{current}'"
                )));
            }

            if looks_rate_limited(&body, &self.rate_limit_patterns) {
                log::debug!("Response body contains rate limit patterns");
                return Err(LfCircleError::RateLimit { retry_after: 60 });
            }

            return Ok(body);
        }

        Err(LfCircleError::Retrieval(format!(
            "too many redirects for '{url}'"
        )))
    }

    fn resolve_redirect(&self, from: &str, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else if location.starts_with('/') {
            format!("{}{location}", self.base_url)
        } else {
            let parent = from.rsplit_once('/').map(|(p, _)| p).unwrap_or(from);
            format!("{parent}/{location}")
        }
    }

    /// Save response to debug directory (optional debug feature)
    fn save_debug_response(&self, url: &str, status_code: u16, body: &str) {
        if let Err(e) = self.try_save_debug_response(url, status_code, body) {
            log::warn!("Failed to save debug response: {e}");
        }
    }

    fn try_save_debug_response(&self, url: &str, status_code: u16, body: &str) -> Result<()> {
        let debug_dir = Path::new("debug_responses");
        fs::create_dir_all(debug_dir).map_err(|e| {
            LfCircleError::Retrieval(format!("Failed to create debug directory: {e}"))
        })?;

        let url_path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let safe_path = url_path.replace(['/', '?', '&', '=', '%', '+'], "_");
        let file_path = debug_dir.join(format!("{timestamp}_{safe_path}_status{status_code}.html"));

        fs::write(&file_path, body)
            .map_err(|e| LfCircleError::Retrieval(format!("Failed to write debug file: {e}")))?;

        log::debug!("Saved HTTP response to {file_path:?} (status: {status_code}, url: {url_path})");
        Ok(())
    }
}

fn redirect_location(response: &Response) -> Option<String> {
    if !matches!(u16::from(response.status()), 301 | 302 | 303 | 307 | 308) {
        return None;
    }
    response
        .header("location")
        .and_then(|h| h.get(0))
        .map(|v| v.as_str().to_string())
}

#[async_trait(?Send)]
impl ReportFetcher for LastFmClient {
    async fn fetch(&self, user: &str) -> Result<String> {
        let url = self.report_url(user);
        let events = self.events.clone();

        let outcome = retry_with_backoff(
            self.retry_config.clone(),
            &format!("fetching {user}'s report"),
            || self.get_page(&url),
            |delay, _| events.emit_rate_limited(user, delay),
        )
        .await?;

        if outcome.attempts_made > 0 {
            log::debug!(
                "Fetched {user}'s report after {} retries ({}s waiting)",
                outcome.attempts_made,
                outcome.total_retry_time
            );
        }

        Ok(outcome.result)
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }
}
