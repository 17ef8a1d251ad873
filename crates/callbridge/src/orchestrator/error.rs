//! Orchestrator error types.

use thiserror::Error;

use super::state::LegState;
use crate::gateway::GatewayError;
use crate::registry::RegistryUnavailable;
use crate::types::{CallLegId, ParticipantId, RoomName};

/// Result type for orchestrator operations.
pub type CallResult<T> = Result<T, CallError>;

/// Errors returned by [`CallOrchestrator`](super::CallOrchestrator) operations.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("Session unavailable for room '{room}': {source}")]
    SessionUnavailable {
        room: RoomName,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to create participant: {0}")]
    ParticipantCreateFailed(#[source] GatewayError),

    #[error("Failed to join participant to the call: {0}")]
    JoinFailed(#[source] GatewayError),

    #[error("Room '{room}' already has a PSTN call in flight ({state})")]
    TransferAlreadyPending { room: RoomName, state: LegState },

    #[error("No pending transfer for room '{room}'")]
    NoPendingTransfer { room: RoomName },

    #[error("Answer callback for room '{room}' arrived while the call was {state}")]
    OutOfOrderCallback { room: RoomName, state: LegState },

    #[error("Answer callback for room '{room}' names unknown call leg {call_leg}")]
    UnknownCallLeg { room: RoomName, call_leg: CallLegId },

    #[error("No active PSTN call for room '{room}'")]
    NoActiveCall { room: RoomName },

    #[error("Failed to end PSTN call: {0}")]
    EndCallFailed(#[source] GatewayError),

    #[error("Participant not found: {0}")]
    NotFound(ParticipantId),
}

impl CallError {
    /// The remote failure behind this error, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::SessionUnavailable { source, .. } => Some(source),
            Self::ParticipantCreateFailed(e) | Self::JoinFailed(e) | Self::EndCallFailed(e) => Some(e),
            _ => None,
        }
    }

    /// Duplicate or stale answer callbacks: logged and acknowledged, never fatal.
    pub fn is_benign_callback(&self) -> bool {
        matches!(
            self,
            Self::NoPendingTransfer { .. }
                | Self::OutOfOrderCallback { .. }
                | Self::UnknownCallLeg { .. }
        )
    }
}

impl From<RegistryUnavailable> for CallError {
    fn from(err: RegistryUnavailable) -> Self {
        Self::SessionUnavailable {
            room: err.room,
            source: err.source,
        }
    }
}
