//! Call orchestration core.
//!
//! Provides:
//! - Room to session mapping (via [`SessionRegistry`](crate::registry::SessionRegistry))
//! - Browser and PSTN joins with compensation on partial failure
//! - Answer-callback handling that bridges a ringing phone leg into its room
//! - Participant display-name lookup

mod directory;
mod error;
mod service;
mod state;

pub use directory::{Attendee, AttendeeDirectory};
pub use error::{CallError, CallResult};
pub use service::{BrowserJoin, CallOrchestrator, OrchestratorConfig, PstnRinging};
pub use state::{AnswerRejected, LegState, PendingTransfer, PstnLeg};
