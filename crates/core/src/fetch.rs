//! Input acquisition from URLs, files, and stdin.
//!
//! URL inputs pass a scheme gate before any network access and are turned
//! into a [`FetchRecord`] by a [`Fetcher`]. File and stdin inputs are read as
//! raw bytes and go to the engine without archive framing.

use std::fs;
use std::future::Future;
use std::io::{self, Read};
use std::path::PathBuf;
#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
use url::Url;

use crate::archive::FetchRecord;
use crate::{ExtractError, Result};

/// Schemes a URL input may use.
pub const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// HTTP client configuration for fetching pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; tagratio/0.1)".to_string() }
    }
}

/// Checks the scheme of `raw` against [`ALLOWED_SCHEMES`], then parses it.
///
/// The scheme is read syntactically before any parsing, so a disallowed
/// scheme is rejected even when the rest of the URL is malformed. A string
/// without any scheme is reported as the empty scheme, like any other
/// unsupported one.
pub fn check_scheme(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let scheme = scheme_of(raw);
    if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
        return Err(ExtractError::UnsupportedScheme { scheme });
    }
    Url::parse(raw).map_err(|e| ExtractError::InvalidUrl { url: raw.to_string(), reason: e.to_string() })
}

/// Lowercased scheme of `raw`: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
/// before the first `:`, or empty when there is none.
fn scheme_of(raw: &str) -> String {
    let Some((candidate, _)) = raw.split_once(':') else {
        return String::new();
    };
    let mut chars = candidate.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid { candidate.to_ascii_lowercase() } else { String::new() }
}

/// Transport that resolves a URL into a fetch record.
pub trait Fetcher {
    /// Fetches `url`, which has already passed [`check_scheme`].
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchRecord>> + Send;
}

/// Fetches `raw` after the scheme gate; nothing is fetched if the gate fails.
pub async fn fetch_url<F: Fetcher>(fetcher: &F, raw: &str) -> Result<FetchRecord> {
    let url = check_scheme(raw)?;
    let record = fetcher.fetch(&url).await?;
    tracing::debug!(
        url = %record.url,
        status = record.status_code,
        header_bytes = record.header_block.len(),
        body_bytes = record.body.len(),
        "fetched"
    );
    Ok(record)
}

/// reqwest-backed [`Fetcher`] for `http` and `https`.
///
/// Redirects are followed and the final URL is recorded. Non-success status
/// codes are not errors; the status is passed on in the record. reqwest has
/// no FTP support, so `ftp` URLs surface as fetch failures.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: u64,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ExtractError::FetchFailure { url: String::new(), source: e })?;
        Ok(Self { client, timeout: config.timeout })
    }

    fn transport_error(&self, url: &Url, e: reqwest::Error) -> ExtractError {
        if e.is_timeout() {
            ExtractError::FetchTimeout { url: url.to_string(), timeout: self.timeout }
        } else {
            ExtractError::FetchFailure { url: url.to_string(), source: e }
        }
    }
}

#[cfg(feature = "fetch")]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchRecord> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let header_block = header_block(response.headers());
        let body = response.bytes().await.map_err(|e| self.transport_error(url, e))?;

        Ok(FetchRecord { url: final_url, status_code, header_block, body: body.to_vec() })
    }
}

/// Serialises response headers as `Name: value\n` lines.
#[cfg(feature = "fetch")]
fn header_block(headers: &reqwest::header::HeaderMap) -> Vec<u8> {
    let mut block = Vec::new();
    for (name, value) in headers {
        block.extend_from_slice(name.as_str().as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(value.as_bytes());
        block.push(b'\n');
    }
    block
}

/// Reads a local HTML document.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<Vec<u8>> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(ExtractError::FileNotFound(path_buf))
    } else {
        fs::read(&path_buf).map_err(ExtractError::from)
    }
}

/// Reads an HTML document from standard input until EOF.
pub fn fetch_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).map_err(ExtractError::from)?;
    Ok(buffer)
}
