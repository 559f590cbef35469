//! Repository client: cache, transport, retry and status handling shared by
//! every backend

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::backends;
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use super::{Authentication, FetchOptions, RepositoryConfiguration, RepositoryResult};
use crate::cache::RuntimeCache;
use crate::core::config::NetworkConfig;
use crate::core::{NccError, NccResult};

/// Upper bound on attempts per request
pub const MAX_ATTEMPTS: u32 = 3;

pub struct RepositoryClient {
    transport: Arc<dyn Transport>,
    cache: Arc<RuntimeCache>,
    max_attempts: u32,
}

impl RepositoryClient {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<RuntimeCache>) -> Self {
        Self {
            transport,
            cache,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Client over `reqwest` configured from the network settings
    pub fn from_config(config: &NetworkConfig, cache: Arc<RuntimeCache>) -> NccResult<Self> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.timeout),
            &config.user_agent_header(),
        )?;
        Ok(Self::new(Arc::new(transport), cache).with_max_attempts(config.retries))
    }

    /// Attempts per request, clamped to `1..=MAX_ATTEMPTS`
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.clamp(1, MAX_ATTEMPTS);
        self
    }

    pub fn cache(&self) -> &RuntimeCache {
        &self.cache
    }

    /// Resolve a source archive (zip or tar) for `vendor/project`
    pub async fn fetch_source_archive(
        &self,
        repository: &RepositoryConfiguration,
        vendor: &str,
        project: &str,
        version: &str,
        auth: Option<&Authentication>,
        options: &FetchOptions,
    ) -> NccResult<RepositoryResult> {
        debug!(
            "Fetching source archive {}/{}={} from {}",
            vendor,
            project,
            version,
            repository.name()
        );
        backends::fetch_source_archive(self, repository, vendor, project, version, auth, options).await
    }

    /// Resolve a prebuilt `.ncc` package for `vendor/project`
    pub async fn fetch_package(
        &self,
        repository: &RepositoryConfiguration,
        vendor: &str,
        project: &str,
        version: &str,
        auth: Option<&Authentication>,
        options: &FetchOptions,
    ) -> NccResult<RepositoryResult> {
        debug!(
            "Fetching package {}/{}={} from {}",
            vendor,
            project,
            version,
            repository.name()
        );
        backends::fetch_package(self, repository, vendor, project, version, auth, options).await
    }

    /// GET a JSON document, served from the cache when present
    pub async fn get_json(&self, request: &HttpRequest) -> NccResult<Value> {
        if let Some(cached) = self.cache.get(&request.url) {
            debug!("Cache hit for {}", request.url);
            return Ok(cached);
        }

        let response = self.send(request).await?;
        let value: Value = serde_json::from_str(&response.body).map_err(|e| {
            NccError::parse(format!("Malformed response from {}: {}", request.url, e))
        })?;

        self.cache.set(request.url.clone(), value.clone());
        Ok(value)
    }

    /// GET a JSON document and deserialize it
    pub async fn get<T: DeserializeOwned>(&self, request: &HttpRequest) -> NccResult<T> {
        let value = self.get_json(request).await?;
        serde_json::from_value(value).map_err(|e| {
            NccError::parse(format!("Unexpected response from {}: {}", request.url, e))
        })
    }

    /// Follow redirects and return the final URL
    pub async fn resolve_redirect(&self, request: &HttpRequest) -> NccResult<String> {
        if let Some(Value::String(url)) = self.cache.get(&request.url) {
            return Ok(url);
        }

        let response = self.send(request).await?;
        self.cache
            .set(request.url.clone(), Value::String(response.effective_url.clone()));
        Ok(response.effective_url)
    }

    async fn send(&self, request: &HttpRequest) -> NccResult<HttpResponse> {
        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self.transport.execute(request).await {
                Ok(response) => break response,
                Err(e) => {
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        request.url, attempt, self.max_attempts, e
                    );
                    if attempt >= self.max_attempts {
                        return Err(NccError::network(format!(
                            "Failed to reach {} after {} attempts: {}",
                            request.url, attempt, e
                        )));
                    }
                }
            }
        };

        check_status(request, &response)?;
        Ok(response)
    }
}

fn check_status(request: &HttpRequest, response: &HttpResponse) -> NccResult<()> {
    match response.status {
        200 => Ok(()),
        401 | 403 => Err(NccError::authentication(format!(
            "Access denied to {} (HTTP {})",
            request.url, response.status
        ))),
        404 => Err(NccError::network(format!("Not found: {}", request.url))),
        status => Err(NccError::network(format!(
            "Unexpected HTTP {} from {}: {}",
            status, request.url, response.body
        ))),
    }
}
