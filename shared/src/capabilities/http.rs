use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::feed::{reduce_page, GistRecord, RawGist};

pub const GISTS_PATH: &str = "gists/public";
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status}")]
    Status { status: u16 },

    #[error("response had no body")]
    EmptyBody,

    #[error("response body did not decode: {0}")]
    InvalidBody(String),

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// `{base}/gists/public?per_page={per_page}&page={page}`
pub fn gists_url(base: &str, page: u32, per_page: u32) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: truncate_url(base),
        reason,
    };

    if base.len() > MAX_URL_LENGTH {
        return Err(invalid(format!(
            "URL exceeds maximum length of {MAX_URL_LENGTH} bytes"
        )));
    }

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(invalid(format!("invalid scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    let mut url = url.join(GISTS_PATH).map_err(|e| invalid(e.to_string()))?;
    url.query_pairs_mut()
        .clear()
        .append_pair("per_page", &per_page.to_string())
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Maps a finished HTTP exchange into reduced gist records.
pub fn page_result(
    result: crux_http::Result<crux_http::Response<Vec<RawGist>>>,
) -> Result<Vec<GistRecord>, FetchError> {
    let mut response = result.map_err(FetchError::from)?;

    let status: u16 = response.status().into();
    if !(200..300).contains(&status) {
        return Err(FetchError::Status { status });
    }

    response
        .take_body()
        .map(reduce_page)
        .ok_or(FetchError::EmptyBody)
}

impl From<crux_http::Error> for FetchError {
    fn from(e: crux_http::Error) -> Self {
        match e {
            // 4xx and 5xx never reach the callback as a response
            crux_http::Error::Http(http) => Self::Status {
                status: http.code.into(),
            },
            crux_http::Error::Json(reason) => Self::InvalidBody(reason),
            crux_http::Error::Url(reason) => Self::InvalidUrl {
                url: String::new(),
                reason,
            },
            crux_http::Error::Io(_) | crux_http::Error::Timeout => Self::Network(e.to_string()),
        }
    }
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let end = url
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= 100)
            .last()
            .unwrap_or(0);
        format!("{}...", &url[..end])
    }
}
