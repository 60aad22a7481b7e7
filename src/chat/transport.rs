//! The client's connection to the bridge server.

use reqwest::Client as ReqwestClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{AnalyzeImageReply, AnalyzeImageRequest, ChatReply, ChatRequest, ClearReply};

/// Default location of the bridge server.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000/";

/// The three bridge endpoints, as seen from the client.
///
/// Any failure to complete a call is reported as [`Error::Transport`].
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// `POST /api/chat`.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply>;

    /// `POST /api/analyze-image`.
    async fn analyze_image(&self, request: AnalyzeImageRequest) -> Result<AnalyzeImageReply>;

    /// `POST /api/clear`.
    async fn clear(&self) -> Result<ClearReply>;
}

/// [`ChatTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::url(format!("invalid server URL {base_url:?}"), Some(e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(format!("failed to build HTTP client: {e}"), Some(Box::new(e)))
        })?;
        Ok(Self { client, base_url })
    }

    /// The server this transport talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::url(format!("failed to build {path} URL"), Some(e)))
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<R> {
        let url = self.endpoint(path)?;
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("{url}: {e}"), Some(Box::new(e))))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!("{url}: HTTP {status}: {body}"), None));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| Error::transport(format!("{url}: invalid reply: {e}"), Some(Box::new(e))))
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        self.post("api/chat", Some(&request)).await
    }

    async fn analyze_image(&self, request: AnalyzeImageRequest) -> Result<AnalyzeImageReply> {
        self.post("api/analyze-image", Some(&request)).await
    }

    async fn clear(&self) -> Result<ClearReply> {
        self.post::<(), ClearReply>("api/clear", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_onto_base() {
        let transport = HttpTransport::new("http://localhost:3000").unwrap();
        assert_eq!(
            transport.endpoint("api/chat").unwrap().as_str(),
            "http://localhost:3000/api/chat"
        );

        let transport = HttpTransport::new("http://example.com/chat").unwrap();
        assert_eq!(transport.base_url().as_str(), "http://example.com/chat/");
        assert_eq!(
            transport.endpoint("api/clear").unwrap().as_str(),
            "http://example.com/chat/api/clear"
        );
    }

    #[test]
    fn invalid_server_url() {
        assert!(HttpTransport::new("not a url").is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let transport = HttpTransport::new("http://127.0.0.1:9/").unwrap();
        let err = transport.clear().await.unwrap_err();
        assert!(err.is_transport());
    }
}
