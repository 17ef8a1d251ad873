//! Per-room PSTN leg state machine.
//!
//! ```text
//! Idle --join_pstn--> Placing --placed--> Ringing --answer--> Bridged
//!  ^                     |                   |                   |
//!  |                  failure            end_pstn            end_pstn
//!  |                     v                   v                   v
//!  +------------------ Idle  <--hung up--  Hanging  <------------+
//! ```
//!
//! A failed hangup puts `Hanging` back to the state it came from.

use std::fmt;

use crate::types::{CallLegId, Participant, SessionId};

/// A placed PSTN leg waiting for (or past) its answer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub session: SessionId,
    pub participant: Participant,
    pub call_leg: CallLegId,
}

/// Name of a [`PstnLeg`] state, for errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegState {
    Idle,
    Placing,
    Ringing,
    Bridged,
    Hanging,
}

impl fmt::Display for LegState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Placing => "placing",
            Self::Ringing => "ringing",
            Self::Bridged => "bridged",
            Self::Hanging => "hanging",
        })
    }
}

/// Why an answer callback was not turned into a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerRejected {
    NoPendingTransfer,
    OutOfOrder(LegState),
    UnknownCallLeg(CallLegId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PstnLeg {
    #[default]
    Idle,
    Placing,
    Ringing(PendingTransfer),
    Bridged(PendingTransfer),
    Hanging {
        transfer: PendingTransfer,
        was_bridged: bool,
    },
}

impl PstnLeg {
    pub fn state(&self) -> LegState {
        match self {
            Self::Idle => LegState::Idle,
            Self::Placing => LegState::Placing,
            Self::Ringing(_) => LegState::Ringing,
            Self::Bridged(_) => LegState::Bridged,
            Self::Hanging { .. } => LegState::Hanging,
        }
    }

    /// Reserve the room's single PSTN slot. Fails with the current state
    /// when a leg is already in flight.
    pub fn begin_placing(&mut self) -> Result<(), LegState> {
        match self {
            Self::Idle => {
                *self = Self::Placing;
                Ok(())
            }
            other => Err(other.state()),
        }
    }

    pub fn placed(&mut self, transfer: PendingTransfer) {
        debug_assert_eq!(self.state(), LegState::Placing);
        *self = Self::Ringing(transfer);
    }

    pub fn abort_placing(&mut self) {
        if matches!(self, Self::Placing) {
            *self = Self::Idle;
        }
    }

    /// Consume an answer callback. `call_leg` is the id reported by the
    /// callback, when it carries one.
    pub fn answer(&mut self, call_leg: Option<&CallLegId>) -> Result<PendingTransfer, AnswerRejected> {
        let transfer = match self {
            Self::Idle => return Err(AnswerRejected::NoPendingTransfer),
            Self::Ringing(transfer) => transfer.clone(),
            other => return Err(AnswerRejected::OutOfOrder(other.state())),
        };

        if let Some(reported) = call_leg.filter(|reported| **reported != transfer.call_leg) {
            return Err(AnswerRejected::UnknownCallLeg(reported.clone()));
        }

        *self = Self::Bridged(transfer.clone());
        Ok(transfer)
    }

    /// Move a live leg to `Hanging` and hand back its transfer. `None` when
    /// there is no live leg to hang up.
    pub fn begin_hangup(&mut self) -> Option<PendingTransfer> {
        let (transfer, was_bridged) = match std::mem::take(self) {
            Self::Ringing(transfer) => (transfer, false),
            Self::Bridged(transfer) => (transfer, true),
            other => {
                *self = other;
                return None;
            }
        };
        *self = Self::Hanging {
            transfer: transfer.clone(),
            was_bridged,
        };
        Some(transfer)
    }

    pub fn finish_hangup(&mut self) {
        if matches!(self, Self::Hanging { .. }) {
            *self = Self::Idle;
        }
    }

    /// Restore the pre-hangup state after a failed hangup.
    pub fn abort_hangup(&mut self) {
        *self = match std::mem::take(self) {
            Self::Hanging {
                transfer,
                was_bridged: true,
            } => Self::Bridged(transfer),
            Self::Hanging {
                transfer,
                was_bridged: false,
            } => Self::Ringing(transfer),
            other => other,
        };
    }
}
