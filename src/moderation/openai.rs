// OpenAI-compatible moderation endpoint.
//
// POSTs {"model", "input"} to {base_url}/moderations with a bearer token and
// reads category_scores from the first result. Works against OpenAI itself
// and against proxies that mirror its API.
//
// API docs: https://platform.openai.com/docs/api-reference/moderations

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ModerationClient, ModerationResult};
use crate::config::Config;

/// Moderation classifier backed by an OpenAI-compatible HTTP API.
pub struct OpenAiModerationClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiModerationClient {
    /// Create a client for `{base_url}/moderations`.
    ///
    /// `timeout` bounds the whole request; the pipeline applies its own
    /// timeout on top, so this only matters for direct callers.
    pub fn new(base_url: &str, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build moderation HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/moderations", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.moderation_base_url,
            config.moderation_api_key.clone(),
            config.moderation_model.clone(),
            config.moderation_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModerationClient for OpenAiModerationClient {
    async fn classify(&self, text: &str) -> Result<ModerationResult> {
        let request = ModerationRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call moderation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Moderation API returned {}: {}", status, body);
        }

        let body: ModerationResponse = response
            .json()
            .await
            .context("Failed to parse moderation API response")?;

        let result = into_result(body)?;

        debug!(
            categories = result.scores.len(),
            top = ?result.top_category().map(|c| c.category.as_str()),
            "Classified text"
        );

        Ok(result)
    }
}

/// Pull the first result's category scores out of the response, keeping order.
pub fn into_result(response: ModerationResponse) -> Result<ModerationResult> {
    let first = response
        .results
        .into_iter()
        .next()
        .context("Moderation API returned an empty result set")?;

    let mut pairs = Vec::with_capacity(first.category_scores.len());
    for (category, value) in first.category_scores {
        let score = value
            .as_f64()
            .with_context(|| format!("Non-numeric score for category {category}: {value}"))?;
        pairs.push((category, score));
    }

    Ok(ModerationResult::from_pairs(pairs))
}

// --- Moderation API request/response types ---

#[derive(Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ModerationResponse {
    pub results: Vec<ModerationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModerationEntry {
    /// Kept as a raw JSON map so category order survives deserialization.
    pub category_scores: serde_json::Map<String, serde_json::Value>,
}
