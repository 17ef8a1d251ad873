//! Call bridge library.
//!
//! Coordinates calls that join a browser participant (media session) and a
//! telephone participant (PSTN leg) in the same room. The PSTN leg is bridged
//! into the room's media session when the telephony service reports that the
//! far end answered.

pub mod api;
pub mod config;
pub mod gateway;
pub mod orchestrator;
pub mod registry;
pub mod types;

pub use config::AppConfig;
pub use orchestrator::{CallError, CallOrchestrator, OrchestratorConfig};
