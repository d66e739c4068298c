//! Narrow HTTP boundary to the repository.
//!
//! Every component talks to the repository through [`RepositoryClient`], so
//! tests can substitute a mock and no component ever touches the transport
//! directly. The trait is annotated for `mockall`; mocks are exported behind
//! the `test-export-mocks` feature.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;

use crate::config::Settings;

/// Error type for client calls (simple boxed error).
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// The view of an HTTP response the components consume: status, content type
/// and raw body. Headers beyond the content type are not needed anywhere.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily. The repository serves XML and turtle
    /// as UTF-8; anything else only flows through `body` untouched.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Authenticated, synchronous-per-call access to repository resources.
/// One request is in flight at a time; callers sequence their own loops.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError>;

    async fn post(&self, url: &str) -> Result<HttpResponse, ClientError>;

    /// Returns the response status; PUT bodies are never inspected.
    async fn put(&self, url: &str) -> Result<u16, ClientError>;

    /// Returns the response status; DELETE bodies are never inspected.
    async fn delete(&self, url: &str) -> Result<u16, ClientError>;
}

/// Production client: `reqwest` with HTTP basic auth and a per-request
/// timeout. A timeout surfaces as an `Err`, which callers treat exactly like
/// a non-success status.
pub struct FedoraClient {
    http: reqwest::Client,
    username: String,
    password: String,
}

impl FedoraClient {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            username: settings.credentials.username.clone(),
            password: settings.credentials.password.clone(),
        })
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse, ClientError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl RepositoryClient for FedoraClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn post(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let response = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn put(&self, url: &str) -> Result<u16, ClientError> {
        let response = self
            .http
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn delete(&self, url: &str) -> Result<u16, ClientError> {
        let response = self
            .http
            .delete(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_covers_the_whole_2xx_range() {
        let ok = HttpResponse {
            status: 204,
            content_type: None,
            body: Vec::new(),
        };
        assert!(ok.is_success());
        let missing = HttpResponse {
            status: 404,
            content_type: None,
            body: Vec::new(),
        };
        assert!(!missing.is_success());
    }

    #[test]
    fn text_decodes_lossily() {
        let response = HttpResponse {
            status: 200,
            content_type: Some("text/xml".to_string()),
            body: b"<pid>test:1</pid>".to_vec(),
        };
        assert_eq!(response.text(), "<pid>test:1</pid>");
    }
}
