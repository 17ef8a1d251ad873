//! Telephony service gateway: outbound call placement and call control.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::control::ControlDocument;
use super::error::GatewayResult;
use super::http::{BasicAuth, ServiceClient};
use crate::types::{AccountId, CallLegId, ParticipantToken};

/// Parameters for an outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    /// Caller id presented to the far end.
    pub from: String,
    pub to: String,
    pub application_id: String,
    /// URL the telephony service calls once the far end answers.
    pub answer_url: String,
    /// How long the far end may ring before the call is abandoned.
    pub timeout_secs: u32,
}

/// Operations the orchestrator needs from the telephony service.
#[async_trait]
pub trait TelephonyGateway: Send + Sync {
    async fn place_call(&self, account: &AccountId, call: &OutboundCall) -> GatewayResult<CallLegId>;

    /// Hang up a call leg.
    async fn end_call(&self, account: &AccountId, call_leg: &CallLegId) -> GatewayResult<()>;
}

/// Build the document that bridges an answered leg into the media session
/// the token belongs to. Pure; performs no I/O.
pub fn build_transfer_document(token: &ParticipantToken, sip_uri: &str) -> ControlDocument {
    ControlDocument::transfer(token.clone(), sip_uri)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCallRequest<'a> {
    from: &'a str,
    to: &'a str,
    application_id: &'a str,
    answer_url: &'a str,
    call_timeout: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCallResponse {
    call_id: CallLegId,
}

#[derive(Debug, Serialize)]
struct ModifyCallRequest {
    state: &'static str,
}

/// [`TelephonyGateway`] backed by the voice REST API.
#[derive(Debug, Clone)]
pub struct HttpTelephonyGateway {
    client: ServiceClient,
}

impl HttpTelephonyGateway {
    pub fn new(
        base_url: impl Into<String>,
        auth: BasicAuth,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        Ok(Self {
            client: ServiceClient::new(base_url, auth, timeout)?,
        })
    }
}

#[async_trait]
impl TelephonyGateway for HttpTelephonyGateway {
    async fn place_call(&self, account: &AccountId, call: &OutboundCall) -> GatewayResult<CallLegId> {
        let path = format!("accounts/{account}/calls");
        let body = CreateCallRequest {
            from: &call.from,
            to: &call.to,
            application_id: &call.application_id,
            answer_url: &call.answer_url,
            call_timeout: call.timeout_secs,
        };
        let response: CreateCallResponse = self
            .client
            .send_json("place_call", Method::POST, &path, &body)
            .await?;
        Ok(response.call_id)
    }

    async fn end_call(&self, account: &AccountId, call_leg: &CallLegId) -> GatewayResult<()> {
        let path = format!("accounts/{account}/calls/{call_leg}");
        let body = ModifyCallRequest { state: "completed" };
        self.client
            .send("end_call", Method::POST, &path, Some(&body))
            .await
    }
}
