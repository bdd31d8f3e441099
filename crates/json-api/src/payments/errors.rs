//! Payment Errors

use salvo::http::StatusError;
use tracing::error;

use agora_app::payments::PaymentsServiceError;

pub(crate) fn into_status_error(error: PaymentsServiceError) -> StatusError {
    match error {
        PaymentsServiceError::MissingRequiredData(field) => {
            StatusError::bad_request().brief(format!("missing required field: {field}"))
        }
        PaymentsServiceError::SolutionNotFound => {
            StatusError::not_found().brief("Solution not found")
        }
        PaymentsServiceError::OrderNotFound => {
            StatusError::not_found().brief("No order matches this payment reference")
        }
        PaymentsServiceError::ReferenceRejected(message) => {
            StatusError::not_found().brief(format!("Payment reference not recognised: {message}"))
        }
        PaymentsServiceError::Voucher(rejection) => {
            StatusError::unprocessable_entity().brief(rejection.to_string())
        }
        PaymentsServiceError::InitiationFailed(source)
        | PaymentsServiceError::VerificationUnavailable(source) => {
            error!("payment gateway error: {source}");

            StatusError::bad_gateway().brief("Payment gateway unavailable")
        }
        PaymentsServiceError::Solutions(source) => {
            error!("solutions error during payment: {source}");

            StatusError::internal_server_error()
        }
        PaymentsServiceError::Vouchers(source) => {
            error!("vouchers error during payment: {source}");

            StatusError::internal_server_error()
        }
        PaymentsServiceError::Orders(source) => {
            error!("orders error during payment: {source}");

            StatusError::internal_server_error()
        }
        PaymentsServiceError::Ledger(source) => {
            error!("ledger error during payment: {source}");

            StatusError::internal_server_error()
        }
    }
}
