//! Named-entity extraction via an external NLP service.
//!
//! Entity recognition is delegated to a model served over HTTP (for example
//! a spaCy pipeline behind a small REST wrapper). This module owns the wire
//! format, the restriction to person/organization spans, and retry with
//! exponential backoff for transient service failures.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`ExtractEntities`]: Core trait defining async entity extraction
//! - [`NerClient`]: HTTP implementation speaking the service's JSON protocol
//! - [`RetryExtract`]: Decorator that adds retry logic to any implementation
//!
//! # Wire format
//!
//! Request: `POST {endpoint}` with body `{"text": "..."}`.
//! Response: a JSON array of spans, `[{"text": "...", "label": "..."}]`, in
//! first-occurrence order. Spans whose label is not `PERSON` or `ORG` are
//! dropped; surviving spans keep their order and are not deduplicated.
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{rng, Rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::models::{Entity, EntityCategory};

/// A failed extraction call. Transient variants are retried by
/// [`RetryExtract`]; whatever survives the retries reaches the caller.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("entity service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("entity service answered with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("entity service returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Trait for async entity extraction.
///
/// Implementors take raw article text and return the person/organization
/// mentions found in it. The abstraction allows decorators (like retry
/// logic) and test doubles.
pub trait ExtractEntities {
    /// Extract entities from `text`, in first-occurrence order.
    async fn extract(&self, text: &str) -> Result<Vec<Entity>, ExtractError>;
}

#[derive(Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

/// One span as reported by the service. Labels outside PERSON/ORG are
/// dropped during conversion, not treated as errors.
#[derive(Debug, Deserialize)]
struct NerSpan {
    text: String,
    label: String,
}

fn entities_from_spans(spans: Vec<NerSpan>) -> Vec<Entity> {
    spans
        .into_iter()
        .filter_map(|span| {
            EntityCategory::from_label(&span.label).map(|category| Entity {
                text: span.text,
                category,
            })
        })
        .collect()
}

/// HTTP client for the entity-extraction service.
#[derive(Debug)]
pub struct NerClient {
    http: Client,
    endpoint: Url,
}

impl NerClient {
    pub fn new(endpoint: Url) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self { http, endpoint })
    }
}

impl ExtractEntities for NerClient {
    #[instrument(level = "info", skip_all)]
    async fn extract(&self, text: &str) -> Result<Vec<Entity>, ExtractError> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&NerRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Entity service rejected request");
            return Err(ExtractError::Status(status));
        }

        let body = response.text().await?;
        let spans: Vec<NerSpan> = serde_json::from_str(&body)?;
        let entities = entities_from_spans(spans);

        info!(
            count = entities.len(),
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Extracted entities"
        );
        Ok(entities)
    }
}

/// Wrapper that adds exponential backoff retry logic to any
/// [`ExtractEntities`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryExtract<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryExtract<T>
where
    T: ExtractEntities,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> ExtractEntities for RetryExtract<T>
where
    T: ExtractEntities,
{
    #[instrument(level = "info", skip_all)]
    async fn extract(&self, text: &str) -> Result<Vec<Entity>, ExtractError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.extract(text).await {
                Ok(entities) => {
                    return Ok(entities);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "extract() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "extract() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Extract entities with the standard retry policy (5 attempts, backoff
/// from 1 second). The primary entry point for the pipeline.
#[instrument(level = "info", skip_all)]
pub async fn extract_with_backoff(
    client: &NerClient,
    text: &str,
) -> Result<Vec<Entity>, ExtractError> {
    let t0 = Instant::now();
    let api = RetryExtract::new(client, 5, StdDuration::from_secs(1));
    let res = api.extract(text).await;
    let dt = t0.elapsed();

    match &res {
        Ok(entities) => info!(
            count = entities.len(),
            elapsed_ms_total = dt.as_millis() as u128,
            "extract_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "extract_with_backoff failed")
        }
    }
    res
}

impl<T> ExtractEntities for &T
where
    T: ExtractEntities,
{
    async fn extract(&self, text: &str) -> Result<Vec<Entity>, ExtractError> {
        (*self).extract(text).await
    }
}
