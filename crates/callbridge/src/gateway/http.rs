//! Basic-auth JSON client shared by the HTTP gateways.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{GatewayError, GatewayErrorKind, GatewayResult};

/// Credentials for a remote service.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// HTTP client bound to one remote service.
#[derive(Debug, Clone)]
pub(crate) struct ServiceClient {
    client: Client,
    /// Base URL without trailing slash (e.g., "https://voice.example.com/api/v2").
    base_url: String,
    auth: BasicAuth,
}

impl ServiceClient {
    pub(crate) fn new(
        base_url: impl Into<String>,
        auth: BasicAuth,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::from_reqwest("build_client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .basic_auth(&self.auth.username, Some(&self.auth.password))
    }

    /// Send a JSON body and decode a JSON response.
    pub(crate) async fn send_json<B, T>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: &B,
    ) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(operation, %method, path, "gateway request");
        let response = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(operation, e))?;

        let response = check_status(operation, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(operation, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            GatewayError::new(
                operation,
                GatewayErrorKind::Decode,
                format!("Failed to parse response: {e}"),
            )
        })
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn send<B>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<()>
    where
        B: Serialize + ?Sized,
    {
        debug!(operation, %method, path, "gateway request");
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(operation, e))?;

        check_status(operation, response).await.map(|_| ())
    }
}

async fn check_status(operation: &'static str, response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(GatewayError::new(
        operation,
        GatewayErrorKind::Status(status.as_u16()),
        if text.is_empty() {
            status.to_string()
        } else {
            text
        },
    ))
}
