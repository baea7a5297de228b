// src/services/client.rs

//! Register book search client.
//!
//! Submits one search string through the register's search form and returns
//! the raw result page. Retries are the scheduler's business, not this one's.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::SearchConfig;
use crate::utils::http;

/// One round trip to the remote search form.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Submit `variation` and return the response body as text.
    async fn fetch(&self, variation: &str) -> Result<String>;
}

/// Search client for the register book form endpoint.
#[derive(Debug, Clone)]
pub struct RegbookClient {
    client: Client,
    url: String,
    form_field: String,
}

impl RegbookClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Ok(Self::with_client(client, &config.url, &config.form_field))
    }

    /// Create a client on top of an existing `reqwest::Client`.
    pub fn with_client(client: Client, url: impl Into<String>, form_field: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            form_field: form_field.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SearchClient for RegbookClient {
    async fn fetch(&self, variation: &str) -> Result<String> {
        if variation.trim().is_empty() {
            return Err(AppError::invalid_input(format!(
                "empty search string [{variation}]"
            )));
        }

        let params = [(self.form_field.as_str(), variation)];
        let html = self
            .client
            .post(&self.url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(html)
    }
}
