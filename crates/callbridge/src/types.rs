//! Identifiers and value types shared across the gateways and the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Room used when a request does not name one.
pub const DEFAULT_ROOM: &str = "lobby";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Account that scopes every call to a remote service.
    AccountId
);
string_id!(
    /// Session identifier issued by the media-session service.
    SessionId
);
string_id!(
    /// Participant identifier issued by the media-session service.
    ParticipantId
);
string_id!(
    /// Telephony call-leg identifier returned when an outbound call is placed.
    CallLegId
);
string_id!(
    /// Opaque session-join token handed to the media client.
    ParticipantToken
);

/// Media a participant is allowed to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Capability {
    Audio,
    Video,
}

impl Capability {
    /// Capabilities granted to browser participants.
    pub const BROWSER: &'static [Capability] = &[Capability::Audio, Capability::Video];

    /// Capabilities granted to phone participants. Phone legs are audio-only.
    pub const PSTN: &'static [Capability] = &[Capability::Audio];
}

/// Human-facing room name. Blank names collapse to [`DEFAULT_ROOM`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(name) if !name.is_empty() => Self(name.to_string()),
            _ => Self(DEFAULT_ROOM.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomName {
    fn default() -> Self {
        Self(DEFAULT_ROOM.to_string())
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(value: &str) -> Self {
        Self::new(Some(value))
    }
}

/// A participant as issued by the media-session service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    /// Display tag. Never carries PII beyond the name the caller chose.
    pub tag: String,
    pub capabilities: Vec<Capability>,
    pub token: ParticipantToken,
    /// Set only for phone participants once the outbound call is placed.
    pub call_leg: Option<CallLegId>,
}
