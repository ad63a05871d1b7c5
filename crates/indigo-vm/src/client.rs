//! Asynchronous Indigo VM API client implementation.

use crate::models::{
    CreateImportUrlInstanceRequest, CreateInstanceRequest, CreateInstanceResponse,
    CreateSnapshotInstanceRequest, CreateWindowsInstanceRequest, InstanceTypeListResponse,
    RegionListResponse, SshKeyListResponse,
};
use crate::Result;
use indigo_core::client::{
    ClientConfig, ServiceClient, ServiceClientBuilder, INDIGO_DEFAULT_TIMEOUT,
};
use indigo_core::config::IndigoClientConfig;
use indigo_core::{Error, RequestContext};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info_span, Instrument};
use url::Url;

const USER_AGENT: &str = concat!("indigo-vm/", env!("CARGO_PKG_VERSION"));

/// Instance creation; all four creation variants share this path.
pub const PATH_CREATE_INSTANCE: &str = "/webarenaIndigo/v1/vm/createinstance";
/// Region listing.
pub const PATH_GET_REGION: &str = "/webarenaIndigo/v1/vm/getregion";
/// Instance type listing.
pub const PATH_INSTANCE_TYPES: &str = "/webarenaIndigo/v1/vm/instancetypes";
/// Active SSH key listing.
pub const PATH_SSH_KEY_ACTIVE_STATUS: &str = "/webarenaIndigo/v1/vm/sshkey/active/status";

/// Builder for [`VmClient`].
#[derive(Debug, Clone)]
pub struct VmClientBuilder {
    inner: ServiceClientBuilder,
}

impl VmClientBuilder {
    /// Create a builder for the specified base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder =
            ServiceClientBuilder::new(base_url, Duration::from_secs(INDIGO_DEFAULT_TIMEOUT))?
                .with_user_agent(USER_AGENT);

        Ok(Self { inner: builder })
    }

    /// Create a builder from a [`IndigoClientConfig`].
    pub fn from_config(config: &IndigoClientConfig) -> Result<Self> {
        let builder = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Configure the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<VmClient> {
        let inner = self.inner.build()?;
        Ok(VmClient { inner })
    }
}

/// Asynchronous Indigo VM API client.
#[derive(Clone, Debug)]
pub struct VmClient {
    inner: ServiceClient,
}

impl VmClient {
    /// Construct a client directly from the base URL and bearer token.
    pub fn new(base_url: impl AsRef<str>, token: impl Into<String>) -> Result<Self> {
        VmClientBuilder::new(base_url)?.with_token(token).build()
    }

    /// Construct a client from a configuration; the token is required.
    pub fn from_config(config: &IndigoClientConfig) -> Result<Self> {
        VmClientBuilder::from_config(config)?.build()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Create an instance with an SSH key.
    pub async fn create_instance(
        &self,
        ctx: &RequestContext,
        request: &CreateInstanceRequest,
    ) -> Result<CreateInstanceResponse> {
        self.send_json(
            ctx,
            "create_instance",
            Method::POST,
            PATH_CREATE_INSTANCE,
            Some(request),
            &[],
        )
        .await
    }

    /// Create a Windows instance.
    pub async fn create_windows_instance(
        &self,
        ctx: &RequestContext,
        request: &CreateWindowsInstanceRequest,
    ) -> Result<CreateInstanceResponse> {
        self.send_json(
            ctx,
            "create_windows_instance",
            Method::POST,
            PATH_CREATE_INSTANCE,
            Some(request),
            &[],
        )
        .await
    }

    /// Create an instance from an image URL.
    pub async fn create_import_url_instance(
        &self,
        ctx: &RequestContext,
        request: &CreateImportUrlInstanceRequest,
    ) -> Result<CreateInstanceResponse> {
        self.send_json(
            ctx,
            "create_import_url_instance",
            Method::POST,
            PATH_CREATE_INSTANCE,
            Some(request),
            &[],
        )
        .await
    }

    /// Create an instance from a snapshot.
    pub async fn create_snapshot_instance(
        &self,
        ctx: &RequestContext,
        request: &CreateSnapshotInstanceRequest,
    ) -> Result<CreateInstanceResponse> {
        self.send_json(
            ctx,
            "create_snapshot_instance",
            Method::POST,
            PATH_CREATE_INSTANCE,
            Some(request),
            &[],
        )
        .await
    }

    /// List regions available for an instance type.
    pub async fn get_region(
        &self,
        ctx: &RequestContext,
        instance_type_id: u64,
    ) -> Result<RegionListResponse> {
        let params = [("instanceTypeId", instance_type_id.to_string())];
        self.get_json(ctx, "get_region", PATH_GET_REGION, &params)
            .await
    }

    /// List instance types.
    pub async fn get_instance_types(&self, ctx: &RequestContext) -> Result<InstanceTypeListResponse> {
        self.get_json(ctx, "get_instance_types", PATH_INSTANCE_TYPES, &[])
            .await
    }

    /// List the account's active SSH keys.
    pub async fn get_ssh_key_active_status(
        &self,
        ctx: &RequestContext,
    ) -> Result<SshKeyListResponse> {
        self.get_json(ctx, "get_ssh_key_active_status", PATH_SSH_KEY_ACTIVE_STATUS, &[])
            .await
    }

    async fn get_json<T>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_json::<(), T>(ctx, operation, Method::GET, path, None, params)
            .await
    }

    async fn send_json<B, R>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let span = info_span!("indigo_request", operation, method = %method, path);

        let call = async {
            let payload = body
                .map(serde_json::to_vec)
                .transpose()
                .map_err(|err| {
                    Error::EncodeError(format!("Failed to encode `{operation}` request: {err}"))
                })?;

            let request = self.inner.new_request(method, path, params, payload)?;
            debug!("sending request");
            let response = self.inner.do_request(request, map_status_to_error).await?;

            let bytes = response.bytes().await?;
            let decoded = serde_json::from_slice::<R>(&bytes).map_err(|err| {
                Error::DecodeError(format!("Failed to parse `{operation}` response: {err}"))
            })?;
            Ok::<R, Error>(decoded)
        };

        let result = ctx.run(call).instrument(span.clone()).await;
        if let Err(err) = &result {
            span.in_scope(|| {
                if err.should_log() {
                    error!(code = err.error_code(), error = %err, "request failed");
                } else {
                    debug!(code = err.error_code(), error = %err, "request failed");
                }
            });
        }
        result
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("Indigo authentication failed: {text}"))
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            Error::BadRequest(format!("Indigo rejected the request: {text}"))
        }
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Indigo temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Indigo server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("Indigo error {status}: {text}")),
    }
}
