//! Test utilities and common setup.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use callbridge::api::{self, AppState, DialPlan};
use callbridge::gateway::{
    GatewayError, GatewayErrorKind, GatewayResult, MediaSessionGateway, OutboundCall,
    TelephonyGateway,
};
use callbridge::orchestrator::{CallOrchestrator, OrchestratorConfig};
use callbridge::types::{AccountId, CallLegId, Capability, ParticipantId, ParticipantToken, SessionId};

pub const FROM_NUMBER: &str = "+15550001111";
pub const TO_NUMBER: &str = "+15550002222";

fn fault(operation: &'static str) -> GatewayError {
    GatewayError::new(operation, GatewayErrorKind::Status(500), "injected failure")
}

/// In-memory media-session service that records every call.
#[derive(Default)]
pub struct FakeMedia {
    pub counter: AtomicUsize,
    pub session_delay: Option<Duration>,
    pub sessions_created: AtomicUsize,
    pub fail_create_session: AtomicBool,
    pub fail_create_participant: AtomicBool,
    pub fail_add: AtomicBool,
    pub participants: Mutex<Vec<(ParticipantId, String, Vec<Capability>)>>,
    pub joined: Mutex<Vec<(SessionId, ParticipantId)>>,
    pub removed: Mutex<Vec<(SessionId, ParticipantId)>>,
    pub deleted: Mutex<Vec<ParticipantId>>,
}

impl FakeMedia {
    fn next(&self) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn joined(&self) -> Vec<(SessionId, ParticipantId)> {
        self.joined.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<ParticipantId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<(SessionId, ParticipantId)> {
        self.removed.lock().unwrap().clone()
    }

    pub fn capabilities_of(&self, id: &ParticipantId) -> Option<Vec<Capability>> {
        self.participants
            .lock()
            .unwrap()
            .iter()
            .find(|(pid, _, _)| pid == id)
            .map(|(_, _, caps)| caps.clone())
    }
}

#[async_trait]
impl MediaSessionGateway for FakeMedia {
    async fn create_session(&self, _account: &AccountId, _tag: &str) -> GatewayResult<SessionId> {
        if let Some(delay) = self.session_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create_session.load(Ordering::SeqCst) {
            return Err(fault("create_session"));
        }
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(SessionId::new(format!("session-{}", self.next())))
    }

    async fn create_participant(
        &self,
        _account: &AccountId,
        tag: &str,
        capabilities: &[Capability],
    ) -> GatewayResult<(ParticipantId, ParticipantToken)> {
        if self.fail_create_participant.load(Ordering::SeqCst) {
            return Err(fault("create_participant"));
        }
        let n = self.next();
        let id = ParticipantId::new(format!("participant-{n}"));
        self.participants
            .lock()
            .unwrap()
            .push((id.clone(), tag.to_string(), capabilities.to_vec()));
        Ok((id, ParticipantToken::new(format!("token-{n}"))))
    }

    async fn add_participant_to_session(
        &self,
        _account: &AccountId,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> GatewayResult<()> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(fault("add_participant_to_session"));
        }
        self.joined
            .lock()
            .unwrap()
            .push((session.clone(), participant.clone()));
        Ok(())
    }

    async fn remove_participant_from_session(
        &self,
        _account: &AccountId,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> GatewayResult<()> {
        self.removed
            .lock()
            .unwrap()
            .push((session.clone(), participant.clone()));
        Ok(())
    }

    async fn delete_participant(
        &self,
        _account: &AccountId,
        participant: &ParticipantId,
    ) -> GatewayResult<()> {
        self.deleted.lock().unwrap().push(participant.clone());
        Ok(())
    }
}

/// In-memory telephony service that records placed and ended calls.
#[derive(Default)]
pub struct FakeTelephony {
    pub counter: AtomicUsize,
    pub place_delay: Option<Duration>,
    pub fail_place: AtomicBool,
    pub end_failure: Mutex<Option<GatewayErrorKind>>,
    pub placed: Mutex<Vec<OutboundCall>>,
    pub ended: Mutex<Vec<CallLegId>>,
}

impl FakeTelephony {
    pub fn placed(&self) -> Vec<OutboundCall> {
        self.placed.lock().unwrap().clone()
    }

    pub fn ended(&self) -> Vec<CallLegId> {
        self.ended.lock().unwrap().clone()
    }

    pub fn fail_end_with(&self, kind: Option<GatewayErrorKind>) {
        *self.end_failure.lock().unwrap() = kind;
    }
}

#[async_trait]
impl TelephonyGateway for FakeTelephony {
    async fn place_call(&self, _account: &AccountId, call: &OutboundCall) -> GatewayResult<CallLegId> {
        if let Some(delay) = self.place_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_place.load(Ordering::SeqCst) {
            return Err(fault("place_call"));
        }
        self.placed.lock().unwrap().push(call.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CallLegId::new(format!("call-{n}")))
    }

    async fn end_call(&self, _account: &AccountId, call_leg: &CallLegId) -> GatewayResult<()> {
        let failure = *self.end_failure.lock().unwrap();
        if let Some(kind) = failure {
            return Err(GatewayError::new("end_call", kind, "injected failure"));
        }
        self.ended.lock().unwrap().push(call_leg.clone());
        Ok(())
    }
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        media_account: AccountId::new("media-acct"),
        telephony_account: AccountId::new("voice-acct"),
        application_id: "voice-app".to_string(),
        callback_base_url: "https://bridge.test/".to_string(),
        request_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

pub fn orchestrator(media: Arc<FakeMedia>, telephony: Arc<FakeTelephony>) -> CallOrchestrator {
    CallOrchestrator::new(test_config(), media, telephony)
}

/// Orchestrator plus handles to its fakes.
pub fn test_orchestrator() -> (Arc<CallOrchestrator>, Arc<FakeMedia>, Arc<FakeTelephony>) {
    let media = Arc::new(FakeMedia::default());
    let telephony = Arc::new(FakeTelephony::default());
    let orchestrator = Arc::new(orchestrator(media.clone(), telephony.clone()));
    (orchestrator, media, telephony)
}

/// Create a test application backed by fake gateways.
pub fn test_app() -> (Router, Arc<CallOrchestrator>, Arc<FakeMedia>, Arc<FakeTelephony>) {
    let (orchestrator, media, telephony) = test_orchestrator();
    let state = AppState::new(
        orchestrator.clone(),
        DialPlan {
            from_number: FROM_NUMBER.to_string(),
            to_number: TO_NUMBER.to_string(),
        },
    );
    (api::create_router(state), orchestrator, media, telephony)
}
