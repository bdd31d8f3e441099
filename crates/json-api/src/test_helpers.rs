//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use agora_app::{
    auth::{MockAuthService, Principal},
    context::AppContext,
    domain::{
        events::MockEventsService, ledger::MockLedgerService,
        notifications::MockNotificationsService, orders::MockOrdersService,
        solutions::MockSolutionsService, users::{MockUsersService, records::UserUuid},
        vouchers::MockVouchersService,
    },
    mail::MockMailer,
    payments::MockPaymentsService,
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

/// One mock per service. A fresh mock panics on any call it was not told to expect.
#[derive(Default)]
pub(crate) struct Mocks {
    pub solutions: MockSolutionsService,
    pub vouchers: MockVouchersService,
    pub orders: MockOrdersService,
    pub users: MockUsersService,
    pub notifications: MockNotificationsService,
    pub events: MockEventsService,
    pub ledger: MockLedgerService,
    pub payments: MockPaymentsService,
    pub auth: MockAuthService,
    pub mailer: MockMailer,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            solutions: Arc::new(self.solutions),
            vouchers: Arc::new(self.vouchers),
            orders: Arc::new(self.orders),
            users: Arc::new(self.users),
            notifications: Arc::new(self.notifications),
            events: Arc::new(self.events),
            ledger: Arc::new(self.ledger),
            payments: Arc::new(self.payments),
            auth: Arc::new(self.auth),
            mailer: Arc::new(self.mailer),
        })
    }
}

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal::Admin);
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal::User(TEST_USER_UUID));
    ctrl.call_next(req, depot, res).await;
}

/// Route served without any principal, as for public endpoints.
pub(crate) fn public_service(mocks: Mocks, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(mocks.into_state())).push(route))
}

/// Route served as an authenticated admin.
pub(crate) fn admin_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_admin)
            .push(route),
    )
}

/// Route served as [`TEST_USER_UUID`].
pub(crate) fn user_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_user)
            .push(route),
    )
}
