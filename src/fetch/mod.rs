//! HTTP access for both the point dataset and the traffic API.
//!
//! Everything goes through [`HttpClient`] so callers can stack
//! [`auth`] wrappers on a [`BasicClient`], and tests can swap in a mock.

pub mod auth;
mod basic;
mod client;

#[cfg(test)]
pub(crate) mod test_support;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};
use std::time::Duration;

/// Builds a GET request with a per-request timeout.
pub fn get_request(url: reqwest::Url, timeout: Duration) -> reqwest::Request {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url);
    *req.timeout_mut() = Some(timeout);
    req
}

/// Downloads `url` and returns the body, failing on any non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let req = get_request(url.parse()?, timeout);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned status {status}");
    }
    Ok(resp.bytes().await?.to_vec())
}
