//! HTTP gateway tests against a mock REST server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use callbridge::gateway::{
    BasicAuth, GatewayErrorKind, HttpMediaSessionGateway, HttpTelephonyGateway,
    MediaSessionGateway, OutboundCall, TelephonyGateway,
};
use callbridge::types::{AccountId, CallLegId, Capability, ParticipantId, SessionId};

fn auth() -> BasicAuth {
    BasicAuth {
        username: "api-user".to_string(),
        password: "api-pass".to_string(),
    }
}

fn media(server: &MockServer) -> HttpMediaSessionGateway {
    HttpMediaSessionGateway::new(format!("{}/v1/", server.uri()), auth(), Duration::from_secs(2))
        .unwrap()
}

fn telephony(server: &MockServer, timeout: Duration) -> HttpTelephonyGateway {
    HttpTelephonyGateway::new(format!("{}/api/v2", server.uri()), auth(), timeout).unwrap()
}

fn outbound_call() -> OutboundCall {
    OutboundCall {
        from: "+15550001111".to_string(),
        to: "+15550002222".to_string(),
        application_id: "voice-app".to_string(),
        answer_url: "https://bridge.test/Callbacks/answer?room=lobby".to_string(),
        timeout_secs: 30,
    }
}

#[tokio::test]
async fn test_create_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct-1/sessions"))
        .and(basic_auth("api-user", "api-pass"))
        .and(body_json(json!({ "tag": "customer_123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sess-9", "tag": "customer_123" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = media(&server)
        .create_session(&AccountId::new("acct-1"), "customer_123")
        .await
        .unwrap();

    assert_eq!(session, SessionId::new("sess-9"));
}

#[tokio::test]
async fn test_create_participant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct-1/participants"))
        .and(body_json(json!({
            "tag": "Bob",
            "publishPermissions": ["AUDIO"],
            "deviceApiVersion": "V3"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "participant": { "id": "part-7", "publishPermissions": ["AUDIO"] },
            "token": "eyJ.token.sig"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (id, token) = media(&server)
        .create_participant(&AccountId::new("acct-1"), "Bob", Capability::PSTN)
        .await
        .unwrap();

    assert_eq!(id, ParticipantId::new("part-7"));
    assert_eq!(token.as_str(), "eyJ.token.sig");
}

#[tokio::test]
async fn test_session_membership_calls() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/accounts/acct-1/sessions/sess-9/participants/part-7"))
        .and(body_json(json!({ "sessionId": "sess-9" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/accounts/acct-1/sessions/sess-9/participants/part-7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/accounts/acct-1/participants/part-7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = media(&server);
    let account = AccountId::new("acct-1");
    let session = SessionId::new("sess-9");
    let participant = ParticipantId::new("part-7");

    gateway
        .add_participant_to_session(&account, &session, &participant)
        .await
        .unwrap();
    gateway
        .remove_participant_from_session(&account, &session, &participant)
        .await
        .unwrap();
    gateway.delete_participant(&account, &participant).await.unwrap();
}

#[tokio::test]
async fn test_error_status_is_reported_with_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct-1/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let err = media(&server)
        .create_session(&AccountId::new("acct-1"), "customer_123")
        .await
        .unwrap_err();

    assert_eq!(err.operation, "create_session");
    assert_eq!(err.kind, GatewayErrorKind::Status(401));
    assert_eq!(err.message, "invalid credentials");
}

#[tokio::test]
async fn test_malformed_response_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct-1/participants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let err = media(&server)
        .create_participant(&AccountId::new("acct-1"), "Alice", Capability::BROWSER)
        .await
        .unwrap_err();

    assert_eq!(err.operation, "create_participant");
    assert_eq!(err.kind, GatewayErrorKind::Decode);
}

#[tokio::test]
async fn test_place_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/accounts/voice-1/calls"))
        .and(basic_auth("api-user", "api-pass"))
        .and(body_json(json!({
            "from": "+15550001111",
            "to": "+15550002222",
            "applicationId": "voice-app",
            "answerUrl": "https://bridge.test/Callbacks/answer?room=lobby",
            "callTimeout": 30
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "callId": "c-42",
            "applicationId": "voice-app"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let call_leg = telephony(&server, Duration::from_secs(2))
        .place_call(&AccountId::new("voice-1"), &outbound_call())
        .await
        .unwrap();

    assert_eq!(call_leg, CallLegId::new("c-42"));
}

#[tokio::test]
async fn test_end_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/accounts/voice-1/calls/c-42"))
        .and(body_json(json!({ "state": "completed" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    telephony(&server, Duration::from_secs(2))
        .end_call(&AccountId::new("voice-1"), &CallLegId::new("c-42"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_end_call_for_unknown_leg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/accounts/voice-1/calls/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = telephony(&server, Duration::from_secs(2))
        .end_call(&AccountId::new("voice-1"), &CallLegId::new("gone"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, GatewayErrorKind::Status(404));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/accounts/voice-1/calls"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "callId": "c-late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = telephony(&server, Duration::from_millis(200))
        .place_call(&AccountId::new("voice-1"), &outbound_call())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.operation, "place_call");
}
