//! Backend catalogs and selection endpoints.
//!
//! The backend publishes three catalogs under its API path:
//!
//! - `GET {api}/models` - avatar models with optional expression mappings
//! - `GET {api}/voices` - languages, their speakers and the current choice
//! - `GET {api}/llm` - language-model ids and the current choice
//!
//! and two selection endpoints, `POST {api}/voice?language=&speaker=` and
//! `POST {api}/llm?model=`. Requests are made once; there are no retries.

mod types;

use thiserror::Error;

pub use types::{
    LlmCatalog, ModelCatalog, ModelEntry, VoiceCatalog, VoiceSelection, language_name,
};

/// Errors from catalog requests.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request could not be sent or the body not read
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    /// The backend answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body did not have the expected shape
    #[error("Invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// HTTP client for the catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    api_base: String,
}

impl CatalogClient {
    /// Client for the API rooted at `api_base` (e.g. `http://host/virtupy/api`).
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { http, api_base }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    pub async fn fetch_models(&self) -> CatalogResult<ModelCatalog> {
        self.get_json("models").await
    }

    pub async fn fetch_voices(&self) -> CatalogResult<VoiceCatalog> {
        self.get_json("voices").await
    }

    pub async fn fetch_llms(&self) -> CatalogResult<LlmCatalog> {
        self.get_json("llm").await
    }

    /// Make `(language, speaker)` the backend's voice.
    pub async fn set_voice(&self, language: &str, speaker: &str) -> CatalogResult<()> {
        self.post("voice", &[("language", language), ("speaker", speaker)])
            .await
    }

    /// Make `model` the backend's language model.
    pub async fn set_llm(&self, model: &str) -> CatalogResult<()> {
        self.post("llm", &[("model", model)]).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> CatalogResult<T> {
        let endpoint = self.endpoint(path);
        tracing::debug!("GET {endpoint}");

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| CatalogError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        let response = check_status(&endpoint, response)?;

        response.json::<T>().await.map_err(|e| CatalogError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }

    async fn post(&self, path: &str, query: &[(&str, &str)]) -> CatalogResult<()> {
        let endpoint = self.endpoint(path);
        tracing::debug!("POST {endpoint} {query:?}");

        let response = self
            .http
            .post(&endpoint)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        check_status(&endpoint, response)?;
        Ok(())
    }
}

fn check_status(endpoint: &str, response: reqwest::Response) -> CatalogResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CatalogError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}
