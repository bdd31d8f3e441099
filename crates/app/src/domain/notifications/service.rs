//! Notifications service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::notifications::{
        data::NewNotification,
        errors::NotificationsServiceError,
        records::{NotificationRecord, NotificationUuid, Recipient},
        repository::PgNotificationsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgNotificationsService {
    db: Db,
    repository: PgNotificationsRepository,
}

impl PgNotificationsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgNotificationsRepository::new(),
        }
    }
}

#[async_trait]
impl NotificationsService for PgNotificationsService {
    #[tracing::instrument(
        name = "notifications.service.create_batch",
        skip(self, notifications),
        fields(count = notifications.len()),
        err
    )]
    async fn create_batch(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<NotificationRecord>, NotificationsServiceError> {
        if notifications
            .iter()
            .any(|notification| notification.recipients.is_empty())
        {
            return Err(NotificationsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;
        let mut created = Vec::with_capacity(notifications.len());

        for notification in notifications {
            created.push(
                self.repository
                    .create_notification(&mut tx, notification)
                    .await?,
            );
        }

        tx.commit().await?;

        info!(count = created.len(), "created notifications");

        Ok(created)
    }

    async fn list_for(
        &self,
        recipient: Recipient,
    ) -> Result<Vec<NotificationRecord>, NotificationsServiceError> {
        let mut tx = self.db.begin().await?;

        let notifications = self.repository.list_for(&mut tx, recipient).await?;

        tx.commit().await?;

        Ok(notifications)
    }

    async fn set_read(
        &self,
        notification: NotificationUuid,
        recipient: Recipient,
        is_read: bool,
    ) -> Result<NotificationRecord, NotificationsServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self
            .repository
            .set_read(&mut tx, notification, recipient, is_read)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn mark_all_read(&self, recipient: Recipient) -> Result<u64, NotificationsServiceError> {
        let mut tx = self.db.begin().await?;

        let updated = self.repository.mark_all_read(&mut tx, recipient).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_notification(
        &self,
        notification: NotificationUuid,
        recipient: Recipient,
    ) -> Result<(), NotificationsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self
            .repository
            .delete_notification(&mut tx, notification, recipient)
            .await?;

        if rows_affected == 0 {
            return Err(NotificationsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait NotificationsService: Send + Sync {
    /// Write several notifications in one transaction.
    async fn create_batch(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<NotificationRecord>, NotificationsServiceError>;

    /// Notifications addressed to `recipient`, newest first.
    async fn list_for(
        &self,
        recipient: Recipient,
    ) -> Result<Vec<NotificationRecord>, NotificationsServiceError>;

    /// Set the read flag of a notification the recipient can see.
    async fn set_read(
        &self,
        notification: NotificationUuid,
        recipient: Recipient,
        is_read: bool,
    ) -> Result<NotificationRecord, NotificationsServiceError>;

    /// Mark every unread notification of the recipient as read, returning how many changed.
    async fn mark_all_read(&self, recipient: Recipient) -> Result<u64, NotificationsServiceError>;

    async fn delete_notification(
        &self,
        notification: NotificationUuid,
        recipient: Recipient,
    ) -> Result<(), NotificationsServiceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{notifications::records::NotificationKind, users::records::UserUuid},
        test::TestContext,
    };

    use super::*;

    fn notification(recipients: Vec<Recipient>) -> NewNotification {
        NewNotification::new(
            recipients,
            NotificationKind::Success,
            "Payment received",
            "Your payment was successful",
            json!({ "reference": "ref_1" }),
        )
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn recipients_only_see_their_own_notifications() -> TestResult {
        let ctx = TestContext::new().await;
        let user = Recipient::User(UserUuid::new());
        let other = Recipient::User(UserUuid::new());

        ctx.notifications
            .create_batch(vec![
                notification(vec![user]),
                notification(vec![Recipient::Admin]),
            ])
            .await?;

        assert_eq!(ctx.notifications.list_for(user).await?.len(), 1);
        assert_eq!(ctx.notifications.list_for(Recipient::Admin).await?.len(), 1);
        assert!(ctx.notifications.list_for(other).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn read_state_changes_are_scoped_to_recipient() -> TestResult {
        let ctx = TestContext::new().await;
        let user = Recipient::User(UserUuid::new());
        let stranger = Recipient::User(UserUuid::new());

        let created = ctx
            .notifications
            .create_batch(vec![notification(vec![user]), notification(vec![user])])
            .await?;

        let first = created.first().ok_or("no notification created")?.uuid;

        let foreign = ctx.notifications.set_read(first, stranger, true).await;

        assert!(matches!(foreign, Err(NotificationsServiceError::NotFound)));

        let updated = ctx.notifications.set_read(first, user, true).await?;

        assert!(updated.is_read);
        assert_eq!(ctx.notifications.mark_all_read(user).await?, 1);

        ctx.notifications.delete_notification(first, user).await?;

        let deleted_again = ctx.notifications.delete_notification(first, user).await;

        assert!(matches!(deleted_again, Err(NotificationsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_batch_rejects_notifications_without_recipients() {
        let ctx = TestContext::new().await;

        let result = ctx.notifications.create_batch(vec![notification(Vec::new())]).await;

        assert!(matches!(
            result,
            Err(NotificationsServiceError::MissingRequiredData)
        ));
    }
}
