//! Agora JSON API Server

use std::{process, sync::Arc};

use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use tokio::sync::watch;
use tracing::{error, info};

use agora_app::{
    context::{AppContext, Integrations},
    mail::SmtpMailer,
    payments::gateway::PaystackClient,
};

use crate::{config::ServerConfig, state::State};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod config;
mod events;
mod extensions;
mod healthcheck;
mod notifications;
mod observability;
mod orders;
mod payments;
mod router;
mod shutdown;
mod solutions;
mod state;
#[cfg(test)]
mod test_helpers;
mod vouchers;

/// Agora JSON API Server entry point
///
/// # Panics
///
/// Panics if the server fails to bind or serve requests
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(e) = observability::init_logging(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Logging error: {e}");
        }

        process::exit(1);
    }

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let gateway = match PaystackClient::new(&config.gateway.paystack()) {
        Ok(gateway) => gateway,
        Err(init_error) => {
            error!("failed to initialize payment gateway: {init_error}");

            process::exit(1);
        }
    };

    let mailer = match SmtpMailer::new(&config.mail.smtp()) {
        Ok(mailer) => mailer,
        Err(init_error) => {
            error!("failed to initialize mailer: {init_error}");

            process::exit(1);
        }
    };

    let integrations = Integrations {
        gateway: Arc::new(gateway),
        mailer: Arc::new(mailer),
        payments: config.payments.settings(),
    };

    let app = match AppContext::from_database_url(
        &config.database.database_url,
        config.database.pool(),
        integrations,
    )
    .await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    // Background tasks stop once the shutdown signal flips this to true
    let (workers_tx, workers_rx) = watch::channel(false);

    tokio::spawn(
        app.ledger_sweeper(config.workers.sweep_interval())
            .run(workers_rx.clone()),
    );

    tokio::spawn(
        app.reminder_scheduler(
            config
                .workers
                .reminder_settings(config.payments.retry_policy()),
        )
        .run(workers_rx),
    );

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(State::from_app_context(app)))
        .push(router::public_router())
        .push(router::app_router());

    let doc = OpenApi::new("Agora API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.server.shutdown_grace();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, workers_tx, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(router).await;
}
