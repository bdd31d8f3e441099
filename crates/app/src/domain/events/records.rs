//! Event Records

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Event UUID
pub type EventUuid = TypedUuid<EventRecord>;

/// Attendee UUID
pub type AttendeeUuid = TypedUuid<AttendeeRecord>;

/// Event Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub uuid: EventUuid,
    pub title: String,
    pub location: Option<String>,
    pub starts_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Attendee Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeRecord {
    pub uuid: AttendeeUuid,
    pub event: EventUuid,

    /// Lower-cased; unique per event.
    pub email: String,

    pub name: String,
    pub created_at: Timestamp,
}

/// An event together with everyone registered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWithAttendees {
    pub event: EventRecord,
    pub attendees: Vec<AttendeeRecord>,
}
