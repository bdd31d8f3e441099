//! Solution Errors

use salvo::http::StatusError;
use tracing::error;

use agora_app::domain::solutions::SolutionsServiceError;

pub(crate) fn into_status_error(error: SolutionsServiceError) -> StatusError {
    match error {
        SolutionsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Solution already exists")
        }
        SolutionsServiceError::MissingRequiredData | SolutionsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid solution payload")
        }
        SolutionsServiceError::NotFound => StatusError::not_found().brief("Solution not found"),
        SolutionsServiceError::Sql(source) => {
            error!("solutions storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
