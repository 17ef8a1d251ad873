//! Request/response wrappers around the external media-session and telephony services.
//!
//! Gateways are stateless and never retry; retry policy belongs to the caller.

mod control;
mod deadline;
mod error;
mod http;
mod media;
mod telephony;

pub use control::{
    CONTROL_DOCUMENT_CONTENT_TYPE, ControlDocument, ControlDocumentError, DEFAULT_BRIDGE_SIP_URI,
};
pub use deadline::with_deadline;
pub use error::{GatewayError, GatewayErrorKind, GatewayResult};
pub use http::BasicAuth;
pub use media::{HttpMediaSessionGateway, MediaSessionGateway};
pub use telephony::{HttpTelephonyGateway, OutboundCall, TelephonyGateway, build_transfer_document};
