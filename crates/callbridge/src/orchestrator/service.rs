//! Call orchestration service.
//!
//! Sequences the remote calls that put browser and phone participants into a
//! room's media session, and reacts to the telephony answer callback by
//! bridging the phone leg into that session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use super::directory::AttendeeDirectory;
use super::error::{CallError, CallResult};
use super::state::{AnswerRejected, LegState, PendingTransfer, PstnLeg};
use crate::gateway::{
    ControlDocument, DEFAULT_BRIDGE_SIP_URI, GatewayErrorKind, MediaSessionGateway, OutboundCall,
    TelephonyGateway, build_transfer_document, with_deadline,
};
use crate::registry::SessionRegistry;
use crate::types::{
    AccountId, CallLegId, Capability, Participant, ParticipantId, RoomName, SessionId,
};

/// Settings the orchestrator needs to talk to the gateways.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub media_account: AccountId,
    pub telephony_account: AccountId,
    /// Billing tag attached to every created session.
    pub billing_tag: String,
    /// Telephony application that owns outbound calls.
    pub application_id: String,
    /// Public URL prefix under which `/Callbacks/answer` is reachable.
    pub callback_base_url: String,
    /// Ring timeout passed to the telephony service.
    pub call_timeout_secs: u32,
    pub bridge_sip_uri: String,
    /// Upper bound for every individual gateway call.
    pub request_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            media_account: AccountId::new(""),
            telephony_account: AccountId::new(""),
            billing_tag: "customer_123".to_string(),
            application_id: String::new(),
            callback_base_url: "http://localhost:5000/".to_string(),
            call_timeout_secs: 30,
            bridge_sip_uri: DEFAULT_BRIDGE_SIP_URI.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl OrchestratorConfig {
    /// Answer callback URL for a room. The room travels in the query string
    /// so the callback can be correlated without global state.
    pub fn answer_url(&self, room: &RoomName) -> String {
        format!(
            "{}/Callbacks/answer?room={}",
            self.callback_base_url.trim_end_matches('/'),
            urlencoding::encode(room.as_str())
        )
    }
}

/// A browser participant that joined a room.
#[derive(Debug, Clone)]
pub struct BrowserJoin {
    pub room: RoomName,
    pub session: SessionId,
    pub participant: Participant,
}

/// A phone participant whose outbound call is ringing.
#[derive(Debug, Clone)]
pub struct PstnRinging {
    pub room: RoomName,
    pub session: SessionId,
    pub participant: Participant,
    pub call_leg: CallLegId,
}

/// Owns all call state: room sessions, attendees and each room's PSTN leg.
pub struct CallOrchestrator {
    config: OrchestratorConfig,
    registry: SessionRegistry,
    media: Arc<dyn MediaSessionGateway>,
    telephony: Arc<dyn TelephonyGateway>,
    cleanup: Cleanup,
    legs: DashMap<RoomName, Arc<Mutex<PstnLeg>>>,
    directory: Arc<AttendeeDirectory>,
}

impl CallOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        media: Arc<dyn MediaSessionGateway>,
        telephony: Arc<dyn TelephonyGateway>,
    ) -> Self {
        let registry = SessionRegistry::new(
            media.clone(),
            config.media_account.clone(),
            config.request_timeout,
        );
        let cleanup = Cleanup {
            media: media.clone(),
            account: config.media_account.clone(),
            timeout: config.request_timeout,
        };
        Self {
            config,
            registry,
            media,
            telephony,
            cleanup,
            legs: DashMap::new(),
            directory: Arc::new(AttendeeDirectory::new()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Join a browser participant (audio and video) to the room's session and
    /// return what the media client needs to connect.
    pub async fn join_browser(&self, room: &RoomName, display_name: &str) -> CallResult<BrowserJoin> {
        let session = self
            .registry
            .get_or_create(room, &self.config.billing_tag)
            .await?;

        let participant = self
            .create_participant(display_name, Capability::BROWSER)
            .await?;
        self.join_session(&session, &participant).await?;

        self.directory
            .record(participant.id.clone(), display_name, room.clone());
        info!(
            room = %room,
            session_id = %session,
            participant_id = %participant.id,
            "browser participant joined"
        );

        Ok(BrowserJoin {
            room: room.clone(),
            session,
            participant,
        })
    }

    /// Create an audio-only participant for a phone and dial it. The room
    /// holds at most one PSTN leg at a time.
    pub async fn join_pstn(
        &self,
        room: &RoomName,
        display_name: &str,
        from_number: &str,
        to_number: &str,
    ) -> CallResult<PstnRinging> {
        let leg = self.leg(room);
        lock(&leg)
            .begin_placing()
            .map_err(|state| CallError::TransferAlreadyPending {
                room: room.clone(),
                state,
            })?;
        // Reverts to Idle on error or if this future is dropped mid-flight.
        let mut reservation =
            PlacingReservation::new(leg, self.cleanup.clone(), self.directory.clone());

        let transfer = match self
            .place_pstn_leg(&mut reservation, room, display_name, from_number, to_number)
            .await
        {
            Ok(transfer) => transfer,
            Err(err) => {
                warn!(room = %room, error = %err, "PSTN join failed");
                return Err(err);
            }
        };

        reservation.complete(transfer.clone());
        info!(
            room = %room,
            participant_id = %transfer.participant.id,
            call_leg = %transfer.call_leg,
            "PSTN call ringing"
        );

        Ok(PstnRinging {
            room: room.clone(),
            session: transfer.session,
            participant: transfer.participant,
            call_leg: transfer.call_leg,
        })
    }

    async fn place_pstn_leg(
        &self,
        reservation: &mut PlacingReservation,
        room: &RoomName,
        display_name: &str,
        from_number: &str,
        to_number: &str,
    ) -> CallResult<PendingTransfer> {
        let session = self
            .registry
            .get_or_create(room, &self.config.billing_tag)
            .await?;

        let mut participant = self.create_participant(display_name, Capability::PSTN).await?;
        reservation.track(session.clone(), participant.id.clone());
        if let Err(err) = self.join_session(&session, &participant).await {
            reservation.untrack();
            return Err(err);
        }
        self.directory
            .record(participant.id.clone(), display_name, room.clone());

        let call = OutboundCall {
            from: from_number.to_string(),
            to: to_number.to_string(),
            application_id: self.config.application_id.clone(),
            answer_url: self.config.answer_url(room),
            timeout_secs: self.config.call_timeout_secs,
        };
        let placed = with_deadline(
            "place_call",
            self.config.request_timeout,
            self.telephony.place_call(&self.config.telephony_account, &call),
        )
        .await;

        let call_leg = match placed {
            Ok(call_leg) => call_leg,
            Err(err) => {
                // The phone can never reach this participant; take it back out.
                forget_attendee(&self.directory, &participant.id);
                self.cleanup
                    .discard(Some(&session), &participant.id)
                    .await;
                reservation.untrack();
                return Err(CallError::JoinFailed(err));
            }
        };

        participant.call_leg = Some(call_leg.clone());
        Ok(PendingTransfer {
            session,
            participant,
            call_leg,
        })
    }

    /// React to the telephony service reporting that the far end answered.
    ///
    /// `call_leg` is the id carried by the callback, when present. Returns the
    /// transfer document bound to the pending phone participant's token.
    pub fn handle_answer(
        &self,
        room: &RoomName,
        call_leg: Option<&CallLegId>,
    ) -> CallResult<ControlDocument> {
        let answered = match self.existing_leg(room) {
            Some(leg) => lock(&leg).answer(call_leg),
            None => Err(AnswerRejected::NoPendingTransfer),
        };

        let transfer = answered.map_err(|rejected| {
            let err = match rejected {
                AnswerRejected::NoPendingTransfer => CallError::NoPendingTransfer { room: room.clone() },
                AnswerRejected::OutOfOrder(state) => CallError::OutOfOrderCallback {
                    room: room.clone(),
                    state,
                },
                AnswerRejected::UnknownCallLeg(call_leg) => CallError::UnknownCallLeg {
                    room: room.clone(),
                    call_leg,
                },
            };
            warn!(room = %room, error = %err, "ignoring answer callback");
            err
        })?;

        info!(
            room = %room,
            participant_id = %transfer.participant.id,
            call_leg = %transfer.call_leg,
            "PSTN call answered, bridging into session"
        );
        Ok(build_transfer_document(
            &transfer.participant.token,
            &self.config.bridge_sip_uri,
        ))
    }

    /// Hang up the room's PSTN leg and free the slot for another call.
    pub async fn end_pstn(&self, room: &RoomName) -> CallResult<CallLegId> {
        let no_call = || CallError::NoActiveCall { room: room.clone() };

        let leg = self.existing_leg(room).ok_or_else(no_call)?;
        let transfer = lock(&leg).begin_hangup().ok_or_else(no_call)?;
        let hangup = HangupReservation::new(leg);

        let ended = with_deadline(
            "end_call",
            self.config.request_timeout,
            self.telephony
                .end_call(&self.config.telephony_account, &transfer.call_leg),
        )
        .await;

        match ended {
            Ok(()) => {}
            // The far end already hung up; the leg is gone either way.
            Err(err) if err.kind == GatewayErrorKind::Status(404) => {
                debug!(room = %room, call_leg = %transfer.call_leg, "call already ended remotely");
            }
            Err(err) => {
                error!(room = %room, call_leg = %transfer.call_leg, error = %err, "failed to end PSTN call");
                return Err(CallError::EndCallFailed(err));
            }
        }

        hangup.complete();
        info!(room = %room, call_leg = %transfer.call_leg, "PSTN call ended");
        Ok(transfer.call_leg)
    }

    /// Display name recorded for a participant.
    pub fn resolve_display_name(&self, participant: &ParticipantId) -> CallResult<String> {
        self.directory
            .display_name(participant)
            .ok_or_else(|| CallError::NotFound(participant.clone()))
    }

    /// Current PSTN leg state of a room.
    pub fn leg_state(&self, room: &RoomName) -> LegState {
        self.existing_leg(room)
            .map(|leg| lock(&leg).state())
            .unwrap_or(LegState::Idle)
    }

    /// Session already established for a room, without creating one.
    pub fn session_for(&self, room: &RoomName) -> Option<SessionId> {
        self.registry.lookup(room)
    }

    async fn create_participant(
        &self,
        display_name: &str,
        capabilities: &[Capability],
    ) -> CallResult<Participant> {
        let (id, token) = with_deadline(
            "create_participant",
            self.config.request_timeout,
            self.media
                .create_participant(&self.config.media_account, display_name, capabilities),
        )
        .await
        .map_err(CallError::ParticipantCreateFailed)?;

        debug!(participant_id = %id, ?capabilities, "created participant");
        Ok(Participant {
            id,
            tag: display_name.to_string(),
            capabilities: capabilities.to_vec(),
            token,
            call_leg: None,
        })
    }

    /// Add a participant to a session, deleting it again if that fails.
    async fn join_session(&self, session: &SessionId, participant: &Participant) -> CallResult<()> {
        let added = with_deadline(
            "add_participant_to_session",
            self.config.request_timeout,
            self.media.add_participant_to_session(
                &self.config.media_account,
                session,
                &participant.id,
            ),
        )
        .await;

        if let Err(err) = added {
            self.cleanup.discard(None, &participant.id).await;
            return Err(CallError::JoinFailed(err));
        }
        Ok(())
    }

    fn leg(&self, room: &RoomName) -> Arc<Mutex<PstnLeg>> {
        self.legs.entry(room.clone()).or_default().clone()
    }

    fn existing_leg(&self, room: &RoomName) -> Option<Arc<Mutex<PstnLeg>>> {
        self.legs.get(room).map(|leg| leg.clone())
    }
}

/// Best-effort removal of participants nobody will use.
#[derive(Clone)]
struct Cleanup {
    media: Arc<dyn MediaSessionGateway>,
    account: AccountId,
    timeout: Duration,
}

impl Cleanup {
    /// Failures are logged and never replace the error that triggered the cleanup.
    async fn discard(&self, session: Option<&SessionId>, participant: &ParticipantId) {
        let account = &self.account;
        let timeout = self.timeout;

        if let Some(session) = session {
            if let Err(err) = with_deadline(
                "remove_participant_from_session",
                timeout,
                self.media
                    .remove_participant_from_session(account, session, participant),
            )
            .await
            {
                warn!(participant_id = %participant, error = %err, "failed to remove orphaned participant from session");
            }
        }

        match with_deadline(
            "delete_participant",
            timeout,
            self.media.delete_participant(account, participant),
        )
        .await
        {
            Ok(()) => debug!(participant_id = %participant, "discarded orphaned participant"),
            Err(err) => {
                warn!(participant_id = %participant, error = %err, "failed to delete orphaned participant")
            }
        }
    }
}

fn forget_attendee(directory: &AttendeeDirectory, participant: &ParticipantId) {
    if let Some(attendee) = directory.remove(participant) {
        debug!(participant_id = %participant, room = %attendee.room, "reclaimed directory entry");
    }
}

fn lock(leg: &Mutex<PstnLeg>) -> MutexGuard<'_, PstnLeg> {
    // Transitions never panic midway, so a poisoned leg is still consistent.
    leg.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a room's leg in `Placing`; falls back to `Idle` unless completed.
///
/// A tracked participant is still owed cleanup. If the reservation is dropped
/// while one is tracked, its directory entry is removed and the participant
/// is discarded on a background task.
struct PlacingReservation {
    leg: Arc<Mutex<PstnLeg>>,
    cleanup: Cleanup,
    directory: Arc<AttendeeDirectory>,
    participant: Option<(SessionId, ParticipantId)>,
    armed: bool,
}

impl PlacingReservation {
    fn new(leg: Arc<Mutex<PstnLeg>>, cleanup: Cleanup, directory: Arc<AttendeeDirectory>) -> Self {
        Self {
            leg,
            cleanup,
            directory,
            participant: None,
            armed: true,
        }
    }

    fn track(&mut self, session: SessionId, participant: ParticipantId) {
        self.participant = Some((session, participant));
    }

    /// The participant has been cleaned up (or never needs to be).
    fn untrack(&mut self) {
        self.participant = None;
    }

    fn complete(mut self, transfer: PendingTransfer) {
        lock(&self.leg).placed(transfer);
        self.armed = false;
    }
}

impl Drop for PlacingReservation {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        lock(&self.leg).abort_placing();

        let Some((session, participant)) = self.participant.take() else {
            return;
        };
        forget_attendee(&self.directory, &participant);
        match Handle::try_current() {
            Ok(handle) => {
                let cleanup = self.cleanup.clone();
                handle.spawn(async move {
                    cleanup.discard(Some(&session), &participant).await;
                });
            }
            Err(_) => {
                warn!(participant_id = %participant, "no runtime to discard abandoned participant");
            }
        }
    }
}

/// Holds a room's leg in `Hanging`; restores the prior state unless completed.
struct HangupReservation {
    leg: Arc<Mutex<PstnLeg>>,
    armed: bool,
}

impl HangupReservation {
    fn new(leg: Arc<Mutex<PstnLeg>>) -> Self {
        Self { leg, armed: true }
    }

    fn complete(mut self) {
        lock(&self.leg).finish_hangup();
        self.armed = false;
    }
}

impl Drop for HangupReservation {
    fn drop(&mut self) {
        if self.armed {
            lock(&self.leg).abort_hangup();
        }
    }
}
