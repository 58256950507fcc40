//! Text-generation API interaction with exponential backoff retry logic.
//!
//! Talks to a Hugging Face style inference endpoint
//! (`POST {endpoint}/models/{model}`) and wraps the call with retry logic.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async text generation
//! - [`InferenceClient`]: HTTP client for one model on the inference API
//! - [`RetryAsk`]: Decorator that retries any `AskAsync` implementation
//!   under a [`RetryPolicy`]
//!
//! # Retry Strategy
//!
//! Each model gets `max_retries` retries from [`GenerationConfig`]
//! (default 2), with delays doubling from one second up to 30 seconds plus
//! 0-250ms of jitter. [`ask_with_backoff`] applies this to a single model;
//! the caller moves on to the backup model when it returns an error.

use crate::config::GenerationConfig;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Trait for async text generation.
pub trait AskAsync {
    /// The type of response returned by the model.
    type Response;

    /// Send a prompt and receive the generated text.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Backoff settings for one model.
///
/// A blog run calls the primary model with this policy and, once it is
/// exhausted, the backup model with a fresh one. Only after both give up
/// does the job fall back to the offline article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` means a single try.
    pub max_retries: usize,
    pub base_delay: StdDuration,
    pub max_delay: StdDuration,
}

impl RetryPolicy {
    /// `max_retries` comes from [`GenerationConfig`]; delays start at one second.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter:
    /// `min(base_delay * 2^(attempt-1), max_delay)`.
    pub fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay.saturating_mul(1u32 << shift).min(self.max_delay)
    }
}

/// Retries a failing [`AskAsync`] call according to a [`RetryPolicy`],
/// sleeping [`RetryPolicy::delay_for`] plus 0-250ms of jitter between tries.
pub struct RetryAsk<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk").field("policy", &self.policy).finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all, fields(max_retries = self.policy.max_retries))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let started = Instant::now();
        let mut attempt = 0usize;

        loop {
            let err = match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };
            attempt += 1;

            if attempt > self.policy.max_retries {
                error!(
                    attempts = attempt,
                    elapsed_ms_total = started.elapsed().as_millis(),
                    error = %err,
                    "Model call failed; no retries left"
                );
                return Err(err);
            }

            let jitter = StdDuration::from_millis(rng().random_range(0..=250));
            let delay = self.policy.delay_for(attempt) + jitter;
            warn!(attempt, ?delay, error = %err, "Model call failed; backing off");
            sleep(delay).await;
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

/// The endpoint answers either with a list of generations or a single one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<Generated>),
    One(Generated),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Many(list) => list.into_iter().next().map(|g| g.generated_text),
            InferenceResponse::One(g) => Some(g.generated_text),
        }
    }
}

/// Text generation against a single model of the inference API.
pub struct InferenceClient {
    http: reqwest::Client,
    url: String,
    token: String,
    parameters: InferenceParameters,
}

impl fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl InferenceClient {
    pub fn new(
        config: &GenerationConfig,
        model: &str,
        token: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: format!(
                "{}/models/{}",
                config.endpoint.trim_end_matches('/'),
                model.trim_matches('/')
            ),
            token: token.to_string(),
            parameters: InferenceParameters {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                repetition_penalty: config.repetition_penalty,
                return_full_text: false,
            },
        })
    }
}

impl AskAsync for InferenceClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = InferenceRequest {
            inputs: text,
            parameters: self.parameters,
        };
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                %status,
                detail = %crate::utils::truncate_for_log(&detail, 300),
                "API call failed"
            );
            return Err(format!("inference API returned {status}").into());
        }

        let parsed: InferenceResponse = resp.json().await?;
        let text = parsed
            .into_text()
            .ok_or("inference API returned no generations")?;
        info!(elapsed_ms = t0.elapsed().as_millis(), chars = text.chars().count(), "API call succeeded");
        Ok(text.trim().to_string())
    }
}

/// Generate text with `model` under [`RetryPolicy::from_config`].
///
/// Returns the last error once the retries for this model are used up.
#[instrument(level = "info", skip_all, fields(%model))]
pub async fn ask_with_backoff(
    config: &GenerationConfig,
    model: &str,
    token: &str,
    prompt: &str,
) -> Result<String, Box<dyn Error>> {
    let t0 = Instant::now();
    let client = InferenceClient::new(config, model, token)?;
    let api = RetryAsk::new(client, RetryPolicy::from_config(config));
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(elapsed_ms_total = dt.as_millis(), "ask_with_backoff succeeded"),
        Err(e) => error!(elapsed_ms_total = dt.as_millis(), error = %e, "ask_with_backoff failed"),
    }
    res
}
