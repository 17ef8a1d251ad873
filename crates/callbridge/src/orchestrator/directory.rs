//! Participant id to display name lookup.

use dashmap::DashMap;

use crate::types::{ParticipantId, RoomName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub display_name: String,
    pub room: RoomName,
}

/// Reverse lookup used to put a human name on media events that only carry
/// a participant id.
#[derive(Debug, Default)]
pub struct AttendeeDirectory {
    attendees: DashMap<ParticipantId, Attendee>,
}

impl AttendeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, participant: ParticipantId, display_name: impl Into<String>, room: RoomName) {
        self.attendees.insert(
            participant,
            Attendee {
                display_name: display_name.into(),
                room,
            },
        );
    }

    pub fn display_name(&self, participant: &ParticipantId) -> Option<String> {
        self.attendees
            .get(participant)
            .map(|entry| entry.display_name.clone())
    }

    pub fn remove(&self, participant: &ParticipantId) -> Option<Attendee> {
        self.attendees.remove(participant).map(|(_, attendee)| attendee)
    }

}
