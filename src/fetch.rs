//! Remote access to card-list pages.
//!
//! Only `https` URLs on allow-listed hosts are fetched, and every redirect
//! target is held to the same rule.

use std::error::Error as _;

use cardlist_scraping_utils::selector;
use log::{debug, info, warn};
use reqwest::{redirect, StatusCode};
use scraper::Html;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {0:?}: {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("Only https URLs can be fetched: {0}")]
    InsecureScheme(Url),
    #[error("Host of {0} is not in the allow-list")]
    DisallowedHost(Url),
    #[error("Redirect rejected: {0}")]
    DisallowedRedirect(String),
    #[error("Server returned {status} for {url}")]
    HttpStatus { url: Url, status: StatusCode },
    #[error("Timed out while fetching {0}")]
    Timeout(Url),
    #[error("The page has no card table")]
    TableNotFound,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// `host` is allowed if it equals an entry or is a subdomain of one.
pub fn is_allowed_host<S: AsRef<str>>(host: &str, allowed_hosts: &[S]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    allowed_hosts.iter().any(|allowed| {
        let allowed = allowed.as_ref().to_ascii_lowercase();
        host == allowed
            || host
                .strip_suffix(&allowed)
                .is_some_and(|rest| rest.ends_with('.'))
    })
}

fn check_url<S: AsRef<str>>(url: &Url, allowed_hosts: &[S]) -> Result<(), FetchError> {
    if url.scheme() != "https" {
        return Err(FetchError::InsecureScheme(url.clone()));
    }
    match url.host_str() {
        Some(host) if is_allowed_host(host, allowed_hosts) => Ok(()),
        _ => Err(FetchError::DisallowedHost(url.clone())),
    }
}

pub fn validate_url<S: AsRef<str>>(raw: &str, allowed_hosts: &[S]) -> Result<Url, FetchError> {
    let url =
        Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(raw.to_owned(), e))?;
    check_url(&url, allowed_hosts)?;
    Ok(url)
}

/// Outer HTML of the first `tbody` inside a `table`.
pub fn extract_table_body(html: &str) -> Result<String, FetchError> {
    let document = Html::parse_document(html);
    match document.select(selector!("table tbody")).next() {
        Some(tbody) => Ok(tbody.html()),
        None => {
            warn!("No `table tbody` in a document of {} bytes", html.len());
            Err(FetchError::TableNotFound)
        }
    }
}

pub struct Fetcher {
    client: reqwest::Client,
    allowed_hosts: Vec<String>,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest_client(config)?,
            allowed_hosts: config.allowed_hosts().clone(),
        })
    }

    /// Downloads the page at `raw_url` and returns its card table as a `<tbody>` fragment.
    pub async fn fetch_table(&self, raw_url: &str) -> Result<String, FetchError> {
        let url = validate_url(raw_url, &self.allowed_hosts)?;
        info!("Fetching {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus { url, status });
        }
        let body = response.text().await.map_err(|e| request_error(&url, e))?;
        debug!("Received {} bytes from {url}", body.len());
        extract_table_body(&body)
    }
}

fn reqwest_client(config: &FetchConfig) -> reqwest::Result<reqwest::Client> {
    let allowed_hosts = config.allowed_hosts().clone();
    let max_redirects = config.max_redirects();
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent())
        .redirect(redirect::Policy::custom(move |attempt| {
            match check_redirect(
                attempt.url(),
                attempt.previous().len(),
                &allowed_hosts,
                max_redirects,
            ) {
                Ok(()) => attempt.follow(),
                Err(e) => attempt.error(e),
            }
        }))
        .build()
}

/// Decides on a redirect to `target`.
///
/// `previous` counts the URLs already requested, the first one included,
/// so the `n`-th redirect comes with `previous == n`.
fn check_redirect<S: AsRef<str>>(
    target: &Url,
    previous: usize,
    allowed_hosts: &[S],
    max_redirects: usize,
) -> Result<(), FetchError> {
    if previous > max_redirects {
        return Err(FetchError::DisallowedRedirect(format!(
            "more than {max_redirects} redirects"
        )));
    }
    check_url(target, allowed_hosts).map_err(|e| FetchError::DisallowedRedirect(e.to_string()))
}

fn request_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(url.clone())
    } else if error.is_redirect() {
        let reason = error
            .source()
            .map_or_else(|| error.to_string(), ToString::to_string);
        FetchError::DisallowedRedirect(reason)
    } else {
        FetchError::Request(error)
    }
}
