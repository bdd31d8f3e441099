//! Register Attendee Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_app::domain::events::{
    data::NewAttendee,
    records::{AttendeeRecord, AttendeeUuid},
};

use crate::{events::errors::into_status_error, extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RegisterAttendeeRequest {
    pub name: String,

    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttendeeResponse {
    pub id: Uuid,

    pub event_id: Uuid,

    pub name: String,

    /// Lower-cased email
    pub email: String,
}

impl From<AttendeeRecord> for AttendeeResponse {
    fn from(attendee: AttendeeRecord) -> Self {
        AttendeeResponse {
            id: attendee.uuid.into(),
            event_id: attendee.event.into(),
            name: attendee.name,
            email: attendee.email,
        }
    }
}

/// Register Attendee Handler
#[endpoint(
    tags("events"),
    summary = "Register Attendee",
    responses(
        (status_code = StatusCode::CREATED, description = "Attendee registered"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing name or email"),
        (status_code = StatusCode::NOT_FOUND, description = "Event not found"),
        (status_code = StatusCode::CONFLICT, description = "Already registered"),
    ),
)]
pub(crate) async fn handler(
    event: PathParam<Uuid>,
    json: JsonBody<RegisterAttendeeRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<AttendeeResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let attendee = state
        .app
        .events
        .register_attendee(
            event.into_inner().into(),
            NewAttendee {
                uuid: AttendeeUuid::new(),
                email: request.email,
                name: request.name,
            },
        )
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(attendee.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use agora_app::domain::events::{EventsServiceError, records::EventUuid};

    use crate::test_helpers::{Mocks, public_service};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        public_service(
            mocks,
            Router::with_path("events/{event}/attendees").post(handler),
        )
    }

    fn registering(result: Result<AttendeeRecord, EventsServiceError>) -> Mocks {
        let mut mocks = Mocks::default();

        mocks
            .events
            .expect_register_attendee()
            .once()
            .return_once(move |_, _| result);

        mocks
    }

    #[tokio::test]
    async fn test_register_attendee_success() -> TestResult {
        let event = EventUuid::new();
        let mut mocks = Mocks::default();

        mocks
            .events
            .expect_register_attendee()
            .once()
            .withf(move |e, attendee| *e == event && attendee.name == "Ada Obi")
            .return_once(move |_, attendee| {
                Ok(AttendeeRecord {
                    uuid: attendee.uuid,
                    event,
                    email: "ada@example.com".to_string(),
                    name: attendee.name,
                    created_at: Timestamp::UNIX_EPOCH,
                })
            });

        let mut res = TestClient::post(format!("http://example.com/events/{event}/attendees"))
            .json(&json!({ "name": "Ada Obi", "email": "Ada@Example.com" }))
            .send(&make_service(mocks))
            .await;

        let body: AttendeeResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.event_id, event.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_registration_returns_409() -> TestResult {
        let res = TestClient::post(format!(
            "http://example.com/events/{}/attendees",
            EventUuid::new()
        ))
        .json(&json!({ "name": "Ada Obi", "email": "ada@example.com" }))
        .send(&make_service(registering(Err(
            EventsServiceError::AlreadyRegistered,
        ))))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_event_returns_404() -> TestResult {
        let res = TestClient::post(format!(
            "http://example.com/events/{}/attendees",
            EventUuid::new()
        ))
        .json(&json!({ "name": "Ada Obi", "email": "ada@example.com" }))
        .send(&make_service(registering(Err(EventsServiceError::NotFound))))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
