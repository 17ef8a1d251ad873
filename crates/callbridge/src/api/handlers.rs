//! HTTP request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::gateway::{CONTROL_DOCUMENT_CONTENT_TYPE, ControlDocument};
use crate::types::{CallLegId, ParticipantId, ParticipantToken, RoomName};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Person {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinCallRequest {
    #[serde(default)]
    pub room: Option<String>,
    pub caller: Person,
}

#[derive(Debug, Serialize)]
pub struct JoinCallResponse {
    pub message: &'static str,
    pub token: ParticipantToken,
    pub room: RoomName,
}

#[derive(Debug, Deserialize)]
pub struct StartPstnCallRequest {
    #[serde(default)]
    pub room: Option<String>,
    pub callee: Person,
}

#[derive(Debug, Serialize)]
pub struct CallStatusResponse {
    pub status: &'static str,
    pub room: RoomName,
}

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub room: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdLookupQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdLookupResponse {
    pub attendee: String,
}

/// Body the telephony service posts with an answer event. Every field is optional;
/// GET callbacks carry no body at all.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    pub event_type: Option<String>,
    pub call_id: Option<CallLegId>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Join a browser participant to a room.
pub async fn join_call(
    State(state): State<AppState>,
    payload: Result<Json<JoinCallRequest>, JsonRejection>,
) -> ApiResult<Json<JoinCallResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let name = display_name(&request.caller)?;
    let room = RoomName::new(request.room.as_deref());

    info!(room = %room, "joining browser participant");
    let joined = state.orchestrator.join_browser(&room, name).await?;

    Ok(Json(JoinCallResponse {
        message: "created participant and setup session",
        token: joined.participant.token,
        room: joined.room,
    }))
}

/// Dial the configured phone number into a room.
pub async fn start_pstn_call(
    State(state): State<AppState>,
    payload: Result<Json<StartPstnCallRequest>, JsonRejection>,
) -> ApiResult<Json<CallStatusResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let name = display_name(&request.callee)?;
    let room = RoomName::new(request.room.as_deref());

    info!(room = %room, "starting PSTN call");
    let ringing = state
        .orchestrator
        .join_pstn(
            &room,
            name,
            &state.dial_plan.from_number,
            &state.dial_plan.to_number,
        )
        .await?;

    Ok(Json(CallStatusResponse {
        status: "ringing",
        room: ringing.room,
    }))
}

/// Answer callback from the telephony service.
///
/// Responds with the transfer document that bridges the answered call into the
/// room's session. Duplicate or stale callbacks get an empty acknowledgement.
pub async fn answer_callback(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let room = RoomName::new(query.room.as_deref());
    let event = parse_answer_event(&body);
    debug!(room = %room, event_type = ?event.event_type, call_id = ?event.call_id, "answer callback");

    let document = match state
        .orchestrator
        .handle_answer(&room, event.call_id.as_ref())
    {
        Ok(document) => document,
        Err(err) if err.is_benign_callback() => ControlDocument::Acknowledge,
        Err(err) => return Err(err.into()),
    };

    control_document_response(&document)
}

/// Hang up the room's PSTN call.
pub async fn end_pstn_call(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
) -> ApiResult<Json<CallStatusResponse>> {
    let room = RoomName::new(query.room.as_deref());
    state.orchestrator.end_pstn(&room).await?;

    Ok(Json(CallStatusResponse {
        status: "hungup",
        room,
    }))
}

/// Map a participant id from a media event back to a display name.
pub async fn id_lookup(
    State(state): State<AppState>,
    Query(query): Query<IdLookupQuery>,
) -> ApiResult<Json<IdLookupResponse>> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("id query parameter is required"))?;

    let attendee = state
        .orchestrator
        .resolve_display_name(&ParticipantId::new(id))?;
    Ok(Json(IdLookupResponse { attendee }))
}

fn display_name(person: &Person) -> ApiResult<&str> {
    let name = person.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    Ok(name)
}

fn parse_answer_event(body: &[u8]) -> AnswerEvent {
    if body.is_empty() {
        return AnswerEvent::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "answer callback body is not an answer event");
        AnswerEvent::default()
    })
}

fn control_document_response(document: &ControlDocument) -> ApiResult<Response> {
    let xml = document.to_xml()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTROL_DOCUMENT_CONTENT_TYPE)],
        xml,
    )
        .into_response())
}
