//! A provider that speaks the tier JSON contract over HTTP.
//!
//! Every tier exposes the same three endpoints:
//!
//! | Route | Request | Response |
//! |---|---|---|
//! | `POST /v1/text` | [`TextRequest`] | `{ "text": .. }` |
//! | `POST /v1/narration` | [`NarrationRequest`] | `{ "audio_url": .. }` |
//! | `POST /v1/frames` | [`FramesRequest`] | `{ "frames": [..] }` |

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use taleforge_core::error::ProviderError;
use taleforge_core::provider::Provider;
use taleforge_core::request::GenerationRequest;
use taleforge_core::tier::{Capabilities, Tier};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct TextRequest<'a> {
    pub prompt: &'a str,
    pub theme: &'a str,
    pub target_length: u32,
    pub language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct NarrationRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct FramesRequest<'a> {
    pub text: &'a str,
    pub theme: &'a str,
    pub count: u32,
    pub include_text_overlay: bool,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct NarrationResponse {
    audio_url: String,
}

#[derive(Debug, Deserialize)]
struct FramesResponse {
    frames: Vec<String>,
}

/// HTTP-backed provider for one tier.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    tier: Tier,
    capabilities: Capabilities,
    endpoint: String,
    api_key: Option<String>,
    model_path: Option<PathBuf>,
    client: Client,
    timeout: Duration,
}

impl HttpProvider {
    /// Builds a provider posting to `endpoint` with a client-side `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Other` if the HTTP client cannot be built.
    pub fn new(
        tier: Tier,
        capabilities: Capabilities,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build http client: {e}")))?;
        Ok(Self {
            tier,
            capabilities,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            api_key: None,
            model_path: None,
            client,
            timeout,
        })
    }

    /// Sends the key as a bearer token on every call.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Names the model artifact the server should load.
    #[must_use]
    pub fn with_model_path(mut self, model_path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(model_path.into());
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.endpoint);
        debug!(tier = %self.tier, url = %url, "provider request");

        let mut builder = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Quota(format!("{path} returned {status}")));
        }
        if status.is_server_error() {
            return Err(ProviderError::Unavailable(format!("{path} returned {status}")));
        }
        if !status.is_success() {
            return Err(ProviderError::Other(format!("{path} returned {status}")));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::Other(format!("malformed response from {path}: {e}")))
    }

    fn transport_error(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else if err.is_connect() {
            ProviderError::Unavailable(format!("cannot reach {}: {err}", self.endpoint))
        } else {
            ProviderError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let model_path = self.model_path.as_deref().and_then(|p| p.to_str());
        let body = TextRequest {
            prompt: &request.prompt,
            theme: &request.theme,
            target_length: request.target_length,
            language: &request.language,
            model_path,
        };
        let response: TextResponse = self.post("/v1/text", &body).await?;
        Ok(response.text)
    }

    async fn synthesize_narration(
        &self,
        text: &str,
        request: &GenerationRequest,
        voice: Option<&str>,
    ) -> Result<String, ProviderError> {
        let body = NarrationRequest {
            text,
            language: &request.language,
            voice,
        };
        let response: NarrationResponse = self.post("/v1/narration", &body).await?;
        Ok(response.audio_url)
    }

    async fn create_frames(
        &self,
        text: &str,
        request: &GenerationRequest,
        count: u32,
    ) -> Result<Vec<String>, ProviderError> {
        let body = FramesRequest {
            text,
            theme: &request.theme,
            count,
            include_text_overlay: request.include_text_overlay,
        };
        let response: FramesResponse = self.post("/v1/frames", &body).await?;
        Ok(response.frames)
    }
}
