//! PokeAPI client for fetching location areas and Pokemon
//!
//! Every request goes through the shared `ExpiringCache` first. Only the raw
//! body of a successful response is cached; decoding happens on every read so
//! the cache stays agnostic of the schema.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::cache::ExpiringCache;

/// Base URL for the PokeAPI
pub const POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of location areas per page
const PAGE_SIZE: u32 = 20;

/// Errors that can occur when fetching from the PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A resource name that cannot form a path segment
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Server answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },
}

impl ApiError {
    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Client for the PokeAPI backed by an expiring response cache
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    http: Client,
    cache: ExpiringCache,
    base_url: String,
}

impl PokeApiClient {
    /// Creates a client using the given cache and base URL
    pub fn new(cache: ExpiringCache, base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), cache, base_url)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(http: Client, cache: ExpiringCache, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            cache,
            base_url,
        }
    }

    /// The base URL requests are built from
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The response cache shared with the rest of the session
    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// URL of the first page of location areas
    pub fn first_page_url(&self) -> String {
        format!(
            "{}/location-area/?offset=0&limit={}",
            self.base_url, PAGE_SIZE
        )
    }

    /// Fetches one page of location areas
    ///
    /// # Arguments
    /// * `url` - A page URL, either `first_page_url()` or a `next`/`previous`
    ///   cursor taken from an earlier page
    pub async fn location_areas(&self, url: &str) -> Result<LocationAreaPage, ApiError> {
        self.fetch_json(url).await
    }

    /// Fetches a single location area with its Pokemon encounters
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        let url = self.resource_url("location-area", name)?;
        self.fetch_json(&url).await
    }

    /// Fetches a single Pokemon
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon, ApiError> {
        let url = self.resource_url("pokemon", name)?;
        self.fetch_json(&url).await
    }

    /// Builds `{base}/{endpoint}/{name}` with `name` as a single encoded segment
    fn resource_url(&self, endpoint: &str, name: &str) -> Result<String, ApiError> {
        // Dot segments would be collapsed by URL normalization
        if name.is_empty() || name == "." || name == ".." {
            return Err(ApiError::InvalidName(name.to_string()));
        }
        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            endpoint,
            urlencoding::encode(name)
        ))
    }

    /// Fetches `url` and decodes it, consulting the cache first
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = match self.cache.get(url) {
            Some(body) => {
                debug!(url, "cache hit");
                body
            }
            None => {
                debug!(url, "cache miss");
                let body = self.fetch_raw(url).await?;
                self.cache.put(url, body.clone());
                body
            }
        };

        Ok(serde_json::from_slice(&body)?)
    }

    /// Performs the GET and returns the raw body of a successful response
    async fn fetch_raw(&self, url: &str) -> Result<Bytes, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?)
    }
}
