//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::ConsoleError;
use crate::http::response::backend_message;

/// Raw response body, for endpoints that do not answer with JSON
#[derive(Debug, Clone)]
pub struct RawBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// HTTP client for backend communication
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("genie-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        self.client
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header("X-Request-ID", uuid::Uuid::new_v4().to_string())
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        query: &[(String, String)],
    ) -> Result<T, ConsoleError> {
        let response = self
            .request(Method::GET, path, token)
            .query(query)
            .send()
            .await?;
        read_json(Method::GET, response).await
    }

    /// Make a GET request and return the body untouched
    pub async fn get_raw(
        &self,
        path: &str,
        token: &str,
        query: &[(String, String)],
    ) -> Result<RawBody, ConsoleError> {
        let response = self
            .request(Method::GET, path, token)
            .query(query)
            .send()
            .await?;
        let response = check_status(Method::GET, response).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok(RawBody {
            bytes,
            content_type,
        })
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ConsoleError> {
        let response = self
            .request(Method::POST, path, token)
            .json(body)
            .send()
            .await?;
        read_json(Method::POST, response).await
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ConsoleError> {
        let response = self
            .request(Method::PUT, path, token)
            .json(body)
            .send()
            .await?;
        read_json(Method::PUT, response).await
    }

    /// Make a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ConsoleError> {
        let response = self
            .request(Method::PATCH, path, token)
            .json(body)
            .send()
            .await?;
        read_json(Method::PATCH, response).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ConsoleError> {
        let response = self.request(Method::DELETE, path, token).send().await?;
        read_json(Method::DELETE, response).await
    }
}

async fn check_status(method: Method, response: Response) -> Result<Response, ConsoleError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);

    // Prefer the backend's own wording when the body carries one
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| backend_message(&v))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(|r| r.to_string())
                .unwrap_or_else(|| status.to_string())
        });

    Err(ConsoleError::Backend {
        status: Some(status.as_u16()),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(
    method: Method,
    response: Response,
) -> Result<T, ConsoleError> {
    let response = check_status(method, response).await?;
    let bytes = response.bytes().await?;

    // An empty body decodes as JSON null
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes[..]
    };
    Ok(serde_json::from_slice(body)?)
}

/// Validate an identifier before it is interpolated into a path
pub fn path_id(id: &str) -> Result<&str, ConsoleError> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#', '%']) || id.contains(char::is_whitespace) {
        return Err(ConsoleError::ValidationError(format!("Invalid id: {:?}", id)));
    }
    Ok(id)
}
