//! Voucher Errors

use salvo::http::StatusError;
use tracing::error;

use agora_app::domain::vouchers::VouchersServiceError;

pub(crate) fn into_status_error(error: VouchersServiceError) -> StatusError {
    match error {
        VouchersServiceError::AlreadyExists => {
            StatusError::conflict().brief("Voucher code already exists")
        }
        VouchersServiceError::NotFound => StatusError::not_found().brief("Voucher not found"),
        VouchersServiceError::MissingRequiredData | VouchersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid voucher payload")
        }
        VouchersServiceError::InvalidDiscount => {
            StatusError::bad_request().brief(VouchersServiceError::InvalidDiscount.to_string())
        }
        VouchersServiceError::Rejected(rejection) => {
            StatusError::unprocessable_entity().brief(rejection.to_string())
        }
        VouchersServiceError::Sql(source) => {
            error!("vouchers storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
