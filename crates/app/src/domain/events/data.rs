//! Events Data

use jiff::Timestamp;

use crate::domain::events::records::{AttendeeUuid, EventUuid};

/// New Event Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub uuid: EventUuid,
    pub title: String,
    pub location: Option<String>,
    pub starts_at: Timestamp,
}

/// New Attendee Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendee {
    pub uuid: AttendeeUuid,
    pub email: String,
    pub name: String,
}
