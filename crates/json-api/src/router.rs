//! App Router

use salvo::Router;

use crate::{
    auth, events, healthcheck, notifications, observability, orders, payments, solutions,
    vouchers,
};

/// Routes reachable without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(
            Router::with_path("solutions")
                .get(solutions::index::handler)
                .push(Router::with_path("{solution}").get(solutions::get::handler)),
        )
        .push(Router::with_path("vouchers/preview").post(vouchers::preview::handler))
        .push(
            Router::with_path("payments")
                .post(payments::initiate::handler)
                .push(Router::with_path("verify").get(payments::verify::handler)),
        )
        .push(
            Router::with_path("events")
                .get(events::index::handler)
                .push(
                    Router::with_path("{event}/attendees").post(events::register::handler),
                ),
        )
}

/// Routes behind bearer authentication.
pub fn app_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("notifications")
                .get(notifications::index::handler)
                .push(Router::with_path("read").put(notifications::read_all::handler))
                .push(
                    Router::with_path("{notification}")
                        .delete(notifications::delete::handler)
                        .push(Router::with_path("read").put(notifications::read::handler)),
                ),
        )
        .push(admin_router())
}

/// Administrative routes. User principals are turned away before any extraction runs.
fn admin_router() -> Router {
    Router::new()
        .hoop(auth::middleware::require_admin)
        .push(Router::with_path("solutions").post(solutions::create::handler))
        .push(
            Router::with_path("vouchers")
                .get(vouchers::index::handler)
                .post(vouchers::create::handler)
                .push(Router::with_path("{code}").get(vouchers::get::handler)),
        )
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .push(Router::with_path("{order}").get(orders::get::handler)),
        )
        .push(Router::with_path("events").post(events::create::handler))
}
