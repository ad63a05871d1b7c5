//! HTTP client settings and the shared transport helper.
//!
//! [`ServiceClient`] owns the pooled `reqwest` client, the API base URL and
//! the bearer token. Endpoint crates build requests with
//! [`ServiceClient::new_request`] and execute them with
//! [`ServiceClient::do_request`]; encoding and decoding stay with the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;
use validator::Validate;

use crate::config::IndigoClientConfig;
use crate::error::{Error, Result};

/// Default timeout for Indigo requests (in seconds)
pub const INDIGO_DEFAULT_TIMEOUT: u64 = 30;

/// Default connect timeout (in seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

const JSON: &str = "application/json";

/// HTTP client configuration.
///
/// Configures timeouts, connection pooling and compression of the underlying
/// `reqwest` client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(INDIGO_DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    base_url: Url,
    token: Option<String>,
    user_agent: Option<String>,
    http_config: ClientConfig,
    tls_verify: bool,
    tls_ca_cert: Option<std::path::PathBuf>,
}

impl ServiceClientBuilder {
    /// Create a builder for the given base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid base URL `{}`: {err}", base_url.as_ref()))
        })?;

        Ok(Self {
            base_url,
            token: None,
            user_agent: None,
            http_config: ClientConfig::new().with_timeout(timeout),
            tls_verify: true,
            tls_ca_cert: None,
        })
    }

    /// Create a builder from an [`IndigoClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation or the
    /// configured URL cannot be parsed.
    pub fn from_config(config: &IndigoClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new(config.parse_api_url()?.as_str(), config.timeout())?
            .with_tls_verify(config.tls_verify);
        builder.http_config = builder
            .http_config
            .with_connect_timeout(config.connect_timeout());
        if let Some(token) = &config.api_token {
            builder = builder.with_token(token.clone());
        }
        if let Some(path) = &config.tls_ca_cert {
            builder = builder.with_ca_cert(path.clone());
        }
        Ok(builder)
    }

    /// Set the bearer token sent with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Trust an additional PEM encoded CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: std::path::PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Returns true if a bearer token has been configured.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if no token was configured, the CA certificate cannot
    /// be loaded, or the HTTP client cannot be built.
    pub fn build(self) -> Result<ServiceClient> {
        let token = self
            .token
            .ok_or_else(|| Error::ConfigError("An API token is required".to_string()))?;

        let config = &self.http_config;
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .gzip(config.enable_compression);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if !self.tls_verify {
            warn!("TLS verification disabled for Indigo client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.tls_ca_cert {
            debug!("loading CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(ServiceClient {
            http,
            base_url: self.base_url,
            token: Arc::new(SecretString::from(token)),
        })
    }
}

/// Authenticated transport shared by the endpoint clients.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    token: Arc<SecretString>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an absolute API path against the base URL.
    ///
    /// Paths starting with `/` replace any path component of the base URL,
    /// so `https://host/prefix` and `/v1/x` resolve to `https://host/v1/x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid path `{path}`: {err}")))
    }

    /// Build an authenticated request.
    ///
    /// When `body` is present it is attached as-is with a JSON content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpError`] if the path does not resolve to a URL.
    pub fn new_request(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| Error::HttpError(format!("Cannot resolve path `{path}`: {err}")))?;
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
            .header(ACCEPT, HeaderValue::from_static(JSON));

        if !params.is_empty() {
            request = request.query(params);
        }

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON))
                .body(body);
        }

        Ok(request)
    }

    /// Send a request and return the response if its status is a success.
    ///
    /// Non-success statuses are read to text and turned into an error by
    /// `map_status`; the body is consumed on every path.
    ///
    /// # Errors
    ///
    /// Returns the mapped transport error.
    pub async fn do_request<F>(&self, request: RequestBuilder, map_status: F) -> Result<Response>
    where
        F: FnOnce(StatusCode, String) -> Error,
    {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "received response");

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(%status, "request failed");
        Err(map_status(status, message))
    }
}
