//! Import of audio published at an http(s) URL.

use std::io::Read;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument};

use super::sniff::{require_category, store_audio};
use crate::error::{Result, SbError};
use crate::retry::RetryPolicy;
use crate::store::AudioStore;

/// Largest response body accepted as an audio file.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Failure of a single download attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),

    #[error("response body exceeds {} bytes", MAX_DOWNLOAD_BYTES)]
    TooLarge,
}

/// True for sources that should be downloaded rather than read from disk.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetches `url`, retrying every failed attempt under `policy`.
#[instrument(skip(policy))]
pub fn download(url: &str, policy: &RetryPolicy, timeout: Duration) -> Result<Vec<u8>> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .build();

    let data = policy
        .execute(|| fetch_once(&agent, url))
        .map_err(|source| SbError::Download {
            url: url.to_string(),
            source,
        })?;
    info!(bytes = data.len(), "Downloaded audio");
    Ok(data)
}

fn fetch_once(agent: &ureq::Agent, url: &str) -> std::result::Result<Vec<u8>, DownloadError> {
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => return Err(DownloadError::Status(code)),
        Err(ureq::Error::Transport(t)) => return Err(DownloadError::Transport(t.to_string())),
    };
    debug!(status = response.status(), "Response received");

    let mut data = Vec::new();
    response
        .into_reader()
        .take(MAX_DOWNLOAD_BYTES + 1)
        .read_to_end(&mut data)?;
    if data.len() as u64 > MAX_DOWNLOAD_BYTES {
        return Err(DownloadError::TooLarge);
    }
    Ok(data)
}

/// Downloads audio from `url`, validates it and stores it.
///
/// The category is checked before any request is made. The stored name
/// defaults to the last path segment of the URL.
#[instrument(skip(store, policy))]
pub fn import_url<S: AudioStore + ?Sized>(
    store: &S,
    url: &str,
    name: Option<&str>,
    category_id: i64,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<i64> {
    require_category(store, category_id)?;
    let data = download(url, policy, timeout)?;
    let name = name.map(str::to_string).or_else(|| name_from_url(url));
    store_audio(store, &data, url, name, category_id)
}

/// Last non-empty path segment, ignoring query and fragment.
fn name_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next()?;
    let rest = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let (_, path) = rest.split_once('/')?;
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}
