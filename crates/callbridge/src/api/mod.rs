//! HTTP API module.
//!
//! Thin translation between HTTP requests and [`CallOrchestrator`](crate::orchestrator::CallOrchestrator)
//! operations, including the telephony answer callback.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::{create_router, create_router_with_static};
pub use state::{AppState, DialPlan};
