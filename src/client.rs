use std::env;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    PROVIDER_REQUEST_DURATION, PROVIDER_REQUEST_ERRORS, PROVIDER_REQUESTS,
};
use crate::types::{GenerateContentRequest, GenerateContentResponse};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Default model used for chat and image description.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// A generative model that turns a conversation into a reply.
///
/// The chat bridge only ever talks to this trait, so tests substitute a fake.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate a reply for the given conversation.
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// Client for the Gemini API.
#[derive(Debug, Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    model: String,
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication(format!("{API_KEY_ENV} is empty")));
        }
        HeaderValue::from_str(&api_key)
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;

        let base_url = Url::parse(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        // No request timeout: a hung provider call hangs the caller.
        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The endpoint for `generateContent` on the configured model.
    pub fn generate_content_url(&self) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("models/{}:generateContent", self.model))?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| Error::authentication("API key contains invalid characters"))?,
        );
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let message = match detail {
            Some(ErrorDetail {
                message: Some(message),
                status: Some(code),
            }) => format!("{message} ({code})"),
            Some(ErrorDetail {
                message: Some(message),
                status: None,
            }) => message,
            _ => error_body,
        };

        Error::api(
            status.as_u16(),
            status.canonical_reason().map(String::from),
            message,
        )
    }

    async fn send(&self, params: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = self.generate_content_url()?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::http_client(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })
    }
}

#[async_trait::async_trait]
impl GenerativeModel for Gemini {
    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        PROVIDER_REQUESTS.click();
        let start = Instant::now();
        tracing::debug!(model = %self.model, turns = request.contents.len(), "sending generateContent");
        let result = self.send(&request).await;
        PROVIDER_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            PROVIDER_REQUEST_ERRORS.click();
            tracing::warn!(model = %self.model, error = %err, "generateContent failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key() {
        let client = Gemini::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn empty_key_rejected() {
        let err = Gemini::new(Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[test]
    fn endpoint_url() {
        let client = Gemini::with_options(
            Some("k".to_string()),
            Some("http://localhost:9999/v1/".to_string()),
            Some("gemini-test".to_string()),
        )
        .unwrap();
        assert_eq!(
            client.generate_content_url().unwrap().as_str(),
            "http://localhost:9999/v1/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn bad_base_url() {
        let err = Gemini::with_options(Some("k".to_string()), Some("not a url".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }
}
