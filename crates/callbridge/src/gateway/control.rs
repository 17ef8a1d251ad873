//! Declarative call-control documents returned to the telephony service.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::types::ParticipantToken;

/// SIP endpoint of the media service that answered PSTN legs are bridged into.
pub const DEFAULT_BRIDGE_SIP_URI: &str = "sip:sipx.webrtc.bandwidth.com:5060";

/// Content type the telephony service expects for control documents.
pub const CONTROL_DOCUMENT_CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Error)]
#[error("Failed to render control document: {0}")]
pub struct ControlDocumentError(String);

/// Instruction executed by the telephony service on a live call leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlDocument {
    /// Bridge the leg into the media session the token was issued for.
    Transfer {
        token: ParticipantToken,
        sip_uri: String,
    },
    /// Empty response; leaves the leg as it is.
    Acknowledge,
}

impl ControlDocument {
    pub fn transfer(token: ParticipantToken, sip_uri: impl Into<String>) -> Self {
        Self::Transfer {
            token,
            sip_uri: sip_uri.into(),
        }
    }

    /// Token the document bridges with, if any.
    pub fn token(&self) -> Option<&ParticipantToken> {
        match self {
            Self::Transfer { token, .. } => Some(token),
            Self::Acknowledge => None,
        }
    }

    /// Serialize to the XML verbs the telephony service executes.
    pub fn to_xml(&self) -> Result<String, ControlDocumentError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write(&mut writer, Event::Start(BytesStart::new("Response")))?;

        if let Self::Transfer { token, sip_uri } = self {
            write(&mut writer, Event::Start(BytesStart::new("Transfer")))?;

            let uui = format!("{token};encoding=jwt");
            let mut sip = BytesStart::new("SipUri");
            sip.push_attribute(("uui", uui.as_str()));
            write(&mut writer, Event::Start(sip))?;
            write(&mut writer, Event::Text(BytesText::new(sip_uri)))?;
            write(&mut writer, Event::End(BytesEnd::new("SipUri")))?;

            write(&mut writer, Event::End(BytesEnd::new("Transfer")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("Response")))?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| ControlDocumentError(e.to_string()))
    }
}

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), ControlDocumentError> {
    writer
        .write_event(event)
        .map_err(|e| ControlDocumentError(e.to_string()))
}
