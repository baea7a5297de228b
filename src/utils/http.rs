// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::SearchConfig;

/// Create a configured asynchronous HTTP client.
///
/// The client keeps a connection pool and is meant to be shared by all workers.
pub fn create_async_client(config: &SearchConfig) -> Result<reqwest::Client> {
    if config.accept_invalid_certs {
        log::warn!("TLS certificate validation is disabled for {}", config.url);
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    Ok(client)
}
