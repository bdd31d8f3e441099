//! Event Errors

use salvo::http::StatusError;
use tracing::error;

use agora_app::domain::events::EventsServiceError;

pub(crate) fn into_status_error(error: EventsServiceError) -> StatusError {
    match error {
        EventsServiceError::NotFound => StatusError::not_found().brief("Event not found"),
        EventsServiceError::AlreadyRegistered => {
            StatusError::conflict().brief("Already registered for this event")
        }
        EventsServiceError::MissingRequiredData | EventsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid event payload")
        }
        EventsServiceError::Sql(source) => {
            error!("events storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
