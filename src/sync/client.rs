//! Remote catalog and schedule client.
//!
//! [`CatalogSource`] is the seam between the agent loop and the remote API.
//! [`HttpCatalogClient`] is the production implementation: it applies a
//! per-request timeout and retries failed requests with exponential backoff,
//! so callers never retry on top of it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::models::schedule::ScheduleRecord;
use crate::models::track::SongRecord;
use crate::{AppError, Result};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Source of the remote catalog and play schedule.
pub trait CatalogSource: Send + Sync {
    /// Fetch every catalog record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Sync` on network or decode failure.
    fn fetch_catalog(&self) -> Pin<Box<dyn Future<Output = Result<Vec<SongRecord>>> + Send + '_>>;

    /// Fetch the schedule records; the first one is authoritative.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Sync` on network or decode failure.
    fn fetch_schedule(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScheduleRecord>>> + Send + '_>>;
}

/// HTTP client for the catalog API (`GET /songs`, `GET /schedulers`).
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpCatalogClient {
    /// Build a client from the API section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Sync` if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| AppError::Sync(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Resolved URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let mut backoff = self.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            match self.try_get(&url).await {
                Ok(value) => {
                    debug!(url, attempt, "catalog request succeeded");
                    return Ok(value);
                }
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%err, url, attempt, delay = ?backoff, "catalog request failed; retrying");
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.json::<T>().await?;
        Ok(body)
    }
}

impl CatalogSource for HttpCatalogClient {
    fn fetch_catalog(&self) -> Pin<Box<dyn Future<Output = Result<Vec<SongRecord>>> + Send + '_>> {
        Box::pin(self.get_json("songs"))
    }

    fn fetch_schedule(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScheduleRecord>>> + Send + '_>> {
        Box::pin(self.get_json("schedulers"))
    }
}
