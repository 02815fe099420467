// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Join an XRPC method name onto a service base URL.
pub fn xrpc_url(service_url: &str, method: &str) -> Result<url::Url> {
    let base = url::Url::parse(&format!("{}/", service_url.trim_end_matches('/')))?;
    Ok(base.join(&format!("xrpc/{method}"))?)
}
