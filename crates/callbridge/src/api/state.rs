//! Application state shared across handlers.

use std::sync::Arc;

use crate::orchestrator::CallOrchestrator;

/// Numbers used for outbound PSTN calls. Process configuration, never request input.
#[derive(Debug, Clone)]
pub struct DialPlan {
    pub from_number: String,
    pub to_number: String,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<CallOrchestrator>,
    pub dial_plan: Arc<DialPlan>,
}

impl AppState {
    pub fn new(orchestrator: Arc<CallOrchestrator>, dial_plan: DialPlan) -> Self {
        Self {
            orchestrator,
            dial_plan: Arc::new(dial_plan),
        }
    }
}
