//! Create Event Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use agora_app::domain::events::{data::NewEvent, records::EventUuid};

use crate::{
    events::{errors::into_status_error, index::EventResponse},
    extensions::*,
    state::State,
};

/// Create Event Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateEventRequest {
    pub title: String,

    #[serde(default)]
    pub location: Option<String>,

    /// RFC 3339 timestamp
    pub starts_at: String,
}

/// Create Event Handler
#[endpoint(
    tags("events"),
    summary = "Create Event",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Event created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateEventRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<EventResponse>, StatusError> {
    depot.admin_or_403()?;

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let starts_at = request
        .starts_at
        .parse::<Timestamp>()
        .or_400("invalid startsAt")?;

    let event = state
        .app
        .events
        .create_event(NewEvent {
            uuid: EventUuid::new(),
            title: request.title,
            location: request.location,
            starts_at,
        })
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/events/{}", event.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(event.into()))
}
