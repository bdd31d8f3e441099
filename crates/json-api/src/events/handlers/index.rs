//! Event Index Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::domain::events::records::EventRecord;

use crate::{extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventResponse {
    pub id: Uuid,

    pub title: String,

    pub location: Option<String>,

    pub starts_at: String,
}

impl From<EventRecord> for EventResponse {
    fn from(event: EventRecord) -> Self {
        EventResponse {
            id: event.uuid.into(),
            title: event.title,
            location: event.location,
            starts_at: event.starts_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct EventsResponse {
    /// Events that have not started, soonest first
    pub events: Vec<EventResponse>,
}

/// Event Index Handler
#[endpoint(tags("events"), summary = "List Upcoming Events")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<EventsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let events = state
        .app
        .events
        .list_upcoming(Timestamp::now())
        .await
        .or_500("failed to fetch events")?;

    Ok(Json(EventsResponse {
        events: events.into_iter().map(Into::into).collect(),
    }))
}
