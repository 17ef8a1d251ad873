//! Media-session service gateway.
//!
//! Creates sessions and participants and joins participants to sessions.
//! Every remote fault is translated into a [`GatewayError`]; nothing is retried
//! here because session and participant creation are not idempotent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::error::GatewayResult;
use super::http::{BasicAuth, ServiceClient};
use crate::types::{AccountId, Capability, ParticipantId, ParticipantToken, SessionId};

/// Operations the orchestrator needs from the media-session service.
#[async_trait]
pub trait MediaSessionGateway: Send + Sync {
    /// Create a session. The tag is used for billing categorization.
    async fn create_session(&self, account: &AccountId, tag: &str) -> GatewayResult<SessionId>;

    /// Create a participant allowed to publish the given media.
    async fn create_participant(
        &self,
        account: &AccountId,
        tag: &str,
        capabilities: &[Capability],
    ) -> GatewayResult<(ParticipantId, ParticipantToken)>;

    /// Add an existing participant to a session.
    async fn add_participant_to_session(
        &self,
        account: &AccountId,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> GatewayResult<()>;

    /// Remove a participant from a session.
    async fn remove_participant_from_session(
        &self,
        account: &AccountId,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> GatewayResult<()>;

    /// Delete a participant entirely.
    async fn delete_participant(
        &self,
        account: &AccountId,
        participant: &ParticipantId,
    ) -> GatewayResult<()>;
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    tag: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    id: SessionId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateParticipantRequest<'a> {
    tag: &'a str,
    publish_permissions: &'a [Capability],
    device_api_version: &'static str,
}

#[derive(Debug, Deserialize)]
struct CreateParticipantResponse {
    participant: ParticipantBody,
    token: ParticipantToken,
}

#[derive(Debug, Deserialize)]
struct ParticipantBody {
    id: ParticipantId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRequest<'a> {
    session_id: &'a SessionId,
}

/// [`MediaSessionGateway`] backed by the service's REST API.
#[derive(Debug, Clone)]
pub struct HttpMediaSessionGateway {
    client: ServiceClient,
}

impl HttpMediaSessionGateway {
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
impl MediaSessionGateway for HttpMediaSessionGateway {
    async fn create_session(&self, account: &AccountId, tag: &str) -> GatewayResult<SessionId> {
        let path = format!("accounts/{account}/sessions");
        let response: CreateSessionResponse = self
            .client
            .send_json("create_session", Method::POST, &path, &CreateSessionRequest { tag })
            .await?;
        Ok(response.id)
    }

    async fn create_participant(
        &self,
        account: &AccountId,
        tag: &str,
        capabilities: &[Capability],
    ) -> GatewayResult<(ParticipantId, ParticipantToken)> {
        let path = format!("accounts/{account}/participants");
        let body = CreateParticipantRequest {
            tag,
            publish_permissions: capabilities,
            device_api_version: "V3",
        };
        let response: CreateParticipantResponse = self
            .client
            .send_json("create_participant", Method::POST, &path, &body)
            .await?;
        Ok((response.participant.id, response.token))
    }

    async fn add_participant_to_session(
        &self,
        account: &AccountId,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> GatewayResult<()> {
        let path = format!("accounts/{account}/sessions/{session}/participants/{participant}");
        let body = SubscriptionRequest {
            session_id: session,
        };
        self.client
            .send("add_participant_to_session", Method::PUT, &path, Some(&body))
            .await
    }

    async fn remove_participant_from_session(
        &self,
        account: &AccountId,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> GatewayResult<()> {
        let path = format!("accounts/{account}/sessions/{session}/participants/{participant}");
        self.client
            .send::<()>("remove_participant_from_session", Method::DELETE, &path, None)
            .await
    }

    async fn delete_participant(
        &self,
        account: &AccountId,
        participant: &ParticipantId,
    ) -> GatewayResult<()> {
        let path = format!("accounts/{account}/participants/{participant}");
        self.client
            .send::<()>("delete_participant", Method::DELETE, &path, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_participant_body_shape() {
        let body = CreateParticipantRequest {
            tag: "Alice",
            publish_permissions: Capability::BROWSER,
            device_api_version: "V3",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tag": "Alice",
                "publishPermissions": ["AUDIO", "VIDEO"],
                "deviceApiVersion": "V3"
            })
        );
    }

    #[test]
    fn test_create_participant_response_decodes() {
        let json = r#"{"participant":{"id":"p-1","tag":"Alice"},"token":"tok-1"}"#;
        let response: CreateParticipantResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.participant.id.as_str(), "p-1");
        assert_eq!(response.token.as_str(), "tok-1");
    }
}
