//! Notification Errors

use salvo::http::StatusError;
use tracing::error;

use agora_app::domain::notifications::NotificationsServiceError;

pub(crate) fn into_status_error(error: NotificationsServiceError) -> StatusError {
    match error {
        NotificationsServiceError::NotFound => {
            StatusError::not_found().brief("Notification not found")
        }
        NotificationsServiceError::MissingRequiredData | NotificationsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid notification")
        }
        NotificationsServiceError::Sql(source) => {
            error!("notifications storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
