//! App Context

use std::{sync::Arc, time::Duration};

use sqlx::PgPool;
use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db, PoolSettings},
    domain::{
        events::{EventsService, PgEventsService},
        ledger::{LedgerService, PgLedgerService, sweeper::LedgerSweeper},
        notifications::{NotificationsService, PgNotificationsService},
        orders::{OrdersService, PgOrdersService},
        solutions::{PgSolutionsService, SolutionsService},
        users::{PgUsersService, UsersService},
        vouchers::{PgVouchersService, VouchersService},
    },
    mail::Mailer,
    payments::{
        PaymentDependencies, PaymentSettings, PaymentWorkflow, PaymentsService,
        gateway::PaymentGateway,
    },
    reminders::{InMemoryReminderStore, ReminderScheduler, ReminderSettings},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// Outbound integrations the services depend on.
#[derive(Clone)]
pub struct Integrations {
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub payments: PaymentSettings,
}

#[derive(Clone)]
pub struct AppContext {
    pub solutions: Arc<dyn SolutionsService>,
    pub vouchers: Arc<dyn VouchersService>,
    pub orders: Arc<dyn OrdersService>,
    pub users: Arc<dyn UsersService>,
    pub notifications: Arc<dyn NotificationsService>,
    pub events: Arc<dyn EventsService>,
    pub ledger: Arc<dyn LedgerService>,
    pub payments: Arc<dyn PaymentsService>,
    pub auth: Arc<dyn AuthService>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        pool_settings: PoolSettings,
        integrations: Integrations,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect_with(url, pool_settings)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_pool(pool, integrations))
    }

    #[must_use]
    pub fn from_pool(pool: PgPool, integrations: Integrations) -> Self {
        let db = Db::new(pool.clone());

        let solutions: Arc<dyn SolutionsService> = Arc::new(PgSolutionsService::new(db.clone()));
        let vouchers: Arc<dyn VouchersService> = Arc::new(PgVouchersService::new(db.clone()));
        let orders: Arc<dyn OrdersService> = Arc::new(PgOrdersService::new(db.clone()));
        let users: Arc<dyn UsersService> = Arc::new(PgUsersService::new(db.clone()));
        let notifications: Arc<dyn NotificationsService> =
            Arc::new(PgNotificationsService::new(db.clone()));
        let events: Arc<dyn EventsService> = Arc::new(PgEventsService::new(db.clone()));
        let ledger: Arc<dyn LedgerService> = Arc::new(PgLedgerService::new(db));

        let payments = PaymentWorkflow::new(
            PaymentDependencies {
                solutions: solutions.clone(),
                vouchers: vouchers.clone(),
                orders: orders.clone(),
                users: users.clone(),
                notifications: notifications.clone(),
                ledger: ledger.clone(),
                gateway: integrations.gateway,
                mailer: integrations.mailer.clone(),
            },
            integrations.payments,
        );

        Self {
            solutions,
            vouchers,
            orders,
            users,
            notifications,
            events,
            ledger,
            payments: Arc::new(payments),
            auth: Arc::new(PgAuthService::new(pool)),
            mailer: integrations.mailer,
        }
    }

    #[must_use]
    pub fn ledger_sweeper(&self, interval: Duration) -> LedgerSweeper {
        LedgerSweeper::new(self.ledger.clone(), interval)
    }

    /// Reminder scheduler backed by a process-local dedup store.
    #[must_use]
    pub fn reminder_scheduler(&self, settings: ReminderSettings) -> ReminderScheduler {
        ReminderScheduler::new(
            self.events.clone(),
            self.mailer.clone(),
            Arc::new(InMemoryReminderStore::new()),
            settings,
        )
    }
}
