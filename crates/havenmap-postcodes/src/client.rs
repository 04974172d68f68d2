//! HTTP client for the postcodes.io REST API.
//!
//! Wraps `reqwest` with typed response deserialization and envelope status
//! checking. The API answers `GET /postcodes/{postcode}` with
//! `{"status": 200, "result": {...}}` on a match and HTTP 404 with
//! `{"status": 404, "error": "..."}` when the postcode does not exist; both
//! the invalid and the unknown case come back as 404, so the client folds
//! them into `Ok(None)` and leaves format checking to the caller.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use havenmap_core::postcode;
use havenmap_core::Coordinates;

use crate::error::PostcodesError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.postcodes.io/";

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for the postcodes.io REST API.
///
/// Use [`PostcodesClient::new`] for production or
/// [`PostcodesClient::with_base_url`] to point at a mock server in tests.
pub struct PostcodesClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Debug, Deserialize)]
struct LookupEnvelope {
    status: i64,
    #[serde(default)]
    result: Option<LookupResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    longitude: Option<f64>,
    latitude: Option<f64>,
}

impl PostcodesClient {
    /// Creates a new client pointed at the production postcodes.io API.
    ///
    /// # Errors
    ///
    /// Returns [`PostcodesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, PostcodesError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PostcodesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`PostcodesError::ApiError`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, PostcodesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("havenmap/0.1 (service-directory)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // joined paths extend the base rather than replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| PostcodesError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the transient-failure retry policy.
    #[must_use]
    pub fn retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Looks up a postcode and returns its coordinates, or `None` when the
    /// API has no match for it.
    ///
    /// The postcode is compacted (uppercased, spaces stripped) before it is
    /// placed in the URL path. Transient failures are retried with back-off;
    /// see [`crate::retry`].
    ///
    /// # Errors
    ///
    /// - [`PostcodesError::Http`] on network failure or a non-2xx status
    ///   other than 404.
    /// - [`PostcodesError::ApiError`] if the envelope carries an error status.
    /// - [`PostcodesError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn lookup(&self, postcode: &str) -> Result<Option<Coordinates>, PostcodesError> {
        let compacted = postcode::compact(postcode);
        let url = self
            .base_url
            .join(&format!("postcodes/{compacted}"))
            .map_err(|e| PostcodesError::ApiError(format!("invalid postcode path: {e}")))?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.lookup_once(url.clone(), &compacted)
        })
        .await
    }

    async fn lookup_once(
        &self,
        url: Url,
        postcode: &str,
    ) -> Result<Option<Coordinates>, PostcodesError> {
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;

        let body = response.json::<serde_json::Value>().await?;
        let envelope: LookupEnvelope =
            serde_json::from_value(body).map_err(|e| PostcodesError::Deserialize {
                context: format!("lookup({postcode})"),
                source: e,
            })?;

        if envelope.status != 200 {
            return Err(PostcodesError::ApiError(
                envelope
                    .error
                    .unwrap_or_else(|| format!("unexpected envelope status {}", envelope.status)),
            ));
        }

        let Some(result) = envelope.result else {
            return Ok(None);
        };
        // Some live postcodes carry no coordinates (e.g. PO boxes); treat
        // them the same as no match.
        match (result.longitude, result.latitude) {
            (Some(longitude), Some(latitude)) => {
                Ok(Some(Coordinates::new(longitude, latitude)))
            }
            _ => Ok(None),
        }
    }
}
