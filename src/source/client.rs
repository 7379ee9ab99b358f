//! Blocking HTTP client with configurable politeness (delay between requests) and optional retries.
//! Serves as the fetch collaborator for source adapters.

use crate::source::{Fetch, SourceError};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; fwoscrape/0.1; +https://github.com/fwoscrape)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DELAY_SECS: u64 = 1;
const MAX_REDIRECTS: usize = 10;

/// Default number of attempts for get_with_retry (initial plus retries).
const DEFAULT_RETRY_COUNT: u32 = 3;
/// Default backoff delays in seconds after each failed attempt.
const DEFAULT_BACKOFF_SECS: [u64; 2] = [1, 2];
/// Backoff for HTTP 429 (rate limit): wait longer so the server can recover.
const BACKOFF_429_SECS: [u64; 4] = [30, 60, 90, 120];

/// Longest file stem used for downloaded images.
const MAX_IMAGE_STEM_LEN: usize = 150;

/// Blocking HTTP client that enforces a delay between requests.
#[derive(Debug)]
pub struct PoliteClient {
    inner: reqwest::blocking::Client,
    delay: Duration,
    last_request: Option<Instant>,
    retry_count: u32,
    backoff_secs: Vec<u64>,
    image_dir: PathBuf,
}

impl PoliteClient {
    /// Build a polite client with default User-Agent, timeout, delay and image directory.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// Directory that [Fetch::fetch_file] writes into.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Perform a GET request with retries for transient failures.
    ///
    /// Retries on: timeout, connection errors, HTTP 5xx, and HTTP 429. Other
    /// statuses are returned as-is for the caller to inspect. Always waits out
    /// the politeness delay before each attempt.
    pub fn get_with_retry(
        &mut self,
        url: &str,
    ) -> Result<reqwest::blocking::Response, reqwest::Error> {
        let mut attempt: u32 = 0;
        loop {
            self.wait_delay();
            let last_attempt = attempt + 1 >= self.retry_count;
            match self.inner.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS;
                    if (status.is_server_error() || rate_limited) && !last_attempt {
                        let backoff = self.backoff(attempt, rate_limited);
                        tracing::debug!(%url, status = status.as_u16(), backoff, "retrying");
                        std::thread::sleep(Duration::from_secs(backoff));
                        attempt += 1;
                        continue;
                    }
                    self.last_request = Some(Instant::now());
                    return Ok(response);
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && !last_attempt {
                        let backoff = self.backoff(attempt, false);
                        tracing::debug!(%url, error = %e, backoff, "retrying");
                        std::thread::sleep(Duration::from_secs(backoff));
                        attempt += 1;
                        continue;
                    }
                    self.last_request = Some(Instant::now());
                    return Err(e);
                }
            }
        }
    }

    fn backoff(&self, attempt: u32, rate_limited: bool) -> u64 {
        let table: &[u64] = if rate_limited {
            &BACKOFF_429_SECS
        } else {
            &self.backoff_secs
        };
        table
            .get(attempt as usize)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(1)
    }

    fn wait_delay(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}

/// Check response status and read body as UTF-8.
fn check_response(
    response: reqwest::blocking::Response,
    url: &str,
    context: Option<&str>,
) -> Result<String, SourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
            context: context.map(String::from),
        });
    }
    response
        .text()
        .map_err(|e| SourceError::BodyRead { source: e })
}

/// File extension for an image response, from its content type.
fn image_extension(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.contains("jpeg") || ct.contains("jpg") => "jpg",
        Some(ct) if ct.contains("png") => "png",
        Some(ct) if ct.contains("webp") => "webp",
        Some(ct) if ct.contains("gif") => "gif",
        _ => "img",
    }
}

/// Stable, filesystem-safe stem for an image URL (scheme dropped, tail kept when long).
fn image_file_stem(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let mut stem = without_scheme
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>();
    while stem.contains("--") {
        stem = stem.replace("--", "-");
    }
    let stem = stem.trim_matches('-');
    let start = stem.len().saturating_sub(MAX_IMAGE_STEM_LEN);
    let stem = stem[start..].trim_start_matches('-');
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem.to_string()
    }
}

impl Fetch for PoliteClient {
    fn fetch_text(&mut self, url: &str) -> Result<String, SourceError> {
        tracing::debug!(%url, "GET");
        let response = self
            .get_with_retry(url)
            .map_err(|e| SourceError::Network {
                url: url.to_string(),
                source: e,
            })?;
        check_response(response, url, None)
    }

    fn fetch_file(&mut self, url: &str) -> Result<Option<String>, SourceError> {
        reqwest::Url::parse(url).map_err(|e| SourceError::InvalidUrl {
            input: url.to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(%url, "GET file");
        let response = self
            .get_with_retry(url)
            .map_err(|e| SourceError::Network {
                url: url.to_string(),
                source: e,
            })?;
        if !response.status().is_success() {
            tracing::debug!(%url, status = response.status().as_u16(), "image declined");
            return Ok(None);
        }
        let ext = image_extension(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = response
            .bytes()
            .map_err(|e| SourceError::BodyRead { source: e })?;

        let path = self
            .image_dir
            .join(format!("{}.{}", image_file_stem(url), ext));
        std::fs::create_dir_all(&self.image_dir).map_err(|e| SourceError::ImageWrite {
            path: self.image_dir.clone(),
            source: e,
        })?;
        std::fs::write(&path, &bytes).map_err(|e| SourceError::ImageWrite {
            path: path.clone(),
            source: e,
        })?;
        Ok(Some(path.display().to_string()))
    }
}

/// Builder for PoliteClient with optional User-Agent, delay, timeout, retry and image directory settings.
#[derive(Debug)]
pub struct PoliteClientBuilder {
    user_agent: Option<String>,
    delay_secs: u64,
    timeout_secs: u64,
    retry_count: u32,
    retry_backoff_secs: Vec<u64>,
    image_dir: Option<PathBuf>,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            delay_secs: DEFAULT_DELAY_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff_secs: DEFAULT_BACKOFF_SECS.to_vec(),
            image_dir: None,
        }
    }
}

impl PoliteClientBuilder {
    /// Set a custom User-Agent. If not set, a browser-like default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set delay between requests in seconds. Default 1.
    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Set request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set number of HTTP attempts for transient failures (default 3).
    pub fn retry_count(mut self, n: u32) -> Self {
        self.retry_count = n.max(1);
        self
    }

    /// Set backoff delays in seconds before each retry. If shorter than retry_count - 1, the last value is reused.
    pub fn retry_backoff_secs(mut self, secs: Vec<u64>) -> Self {
        self.retry_backoff_secs = secs;
        self
    }

    /// Directory for downloaded images. Default: `{cache_dir}/fwoscrape/images`.
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        let backoff_secs = if self.retry_backoff_secs.is_empty() {
            // Exponential 1, 2, 4, ... for (retry_count - 1) steps
            let n = self.retry_count.saturating_sub(1) as usize;
            (0..n).map(|i| 1u64 << i.min(4)).collect::<Vec<_>>()
        } else {
            self.retry_backoff_secs
        };
        let image_dir = self.image_dir.unwrap_or_else(default_image_dir);
        Ok(PoliteClient {
            inner,
            delay: Duration::from_secs(self.delay_secs),
            last_request: None,
            retry_count: self.retry_count,
            backoff_secs,
            image_dir,
        })
    }
}

fn default_image_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fwoscrape")
        .join("images")
}
