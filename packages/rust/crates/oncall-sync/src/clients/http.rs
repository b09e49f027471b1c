//! Shared HTTP client builder and response helpers.

use std::time::Duration;

pub(super) fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()
}

pub(super) fn trim_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// First 256 characters of a response body, for error messages.
pub(super) async fn body_preview(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    body.chars().take(256).collect()
}
