//! HTTP transport used by the repository client

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{NccError, NccResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

/// A request as built by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            basic_auth: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response after redirects were followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Final URL after redirects
    pub effective_url: String,
}

/// The request never produced a response
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest` backed transport
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> NccResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| NccError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Head => self.client.head(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let effective_url = response.url().to_string();
        let body = match request.method {
            Method::Head => String::new(),
            Method::Get => response
                .text()
                .await
                .map_err(|e| TransportError(e.to_string()))?,
        };

        Ok(HttpResponse {
            status,
            body,
            effective_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("Accept", "application/json")
            .basic_auth("user", "pass");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.header_value("accept"), Some("application/json"));
        assert_eq!(request.basic_auth, Some(("user".to_string(), "pass".to_string())));
    }

    #[tokio::test]
    async fn test_reqwest_transport_follows_redirects() {
        let mut server = Server::new_async().await;
        let url = server.url();

        let _redirect = server
            .mock("HEAD", "/archive")
            .with_status(302)
            .with_header("location", &format!("{}/final.zip", url))
            .create_async()
            .await;
        let _target = server
            .mock("HEAD", "/final.zip")
            .with_status(200)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5), "ncc-test").unwrap();
        let response = transport
            .execute(&HttpRequest::head(format!("{}/archive", url)))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.effective_url, format!("{}/final.zip", url));
    }
}
