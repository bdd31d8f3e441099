//! Notifications Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::notifications::{
    data::NewNotification,
    records::{NotificationKind, NotificationRecord, NotificationUuid, Recipient},
};

const CREATE_NOTIFICATION_SQL: &str = include_str!("sql/create_notification.sql");
const LIST_NOTIFICATIONS_SQL: &str = include_str!("sql/list_notifications.sql");
const SET_READ_SQL: &str = include_str!("sql/set_read.sql");
const MARK_ALL_READ_SQL: &str = include_str!("sql/mark_all_read.sql");
const DELETE_NOTIFICATION_SQL: &str = include_str!("sql/delete_notification.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgNotificationsRepository;

impl PgNotificationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_notification(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        notification: NewNotification,
    ) -> Result<NotificationRecord, sqlx::Error> {
        let recipients: Vec<String> = notification
            .recipients
            .iter()
            .map(ToString::to_string)
            .collect();

        query_as::<Postgres, NotificationRecord>(CREATE_NOTIFICATION_SQL)
            .bind(notification.uuid.into_uuid())
            .bind(recipients)
            .bind(notification.title)
            .bind(notification.message)
            .bind(notification.kind.as_str())
            .bind(notification.related_data)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_for(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        recipient: Recipient,
    ) -> Result<Vec<NotificationRecord>, sqlx::Error> {
        query_as::<Postgres, NotificationRecord>(LIST_NOTIFICATIONS_SQL)
            .bind(recipient.to_string())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_read(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        notification: NotificationUuid,
        recipient: Recipient,
        is_read: bool,
    ) -> Result<NotificationRecord, sqlx::Error> {
        query_as::<Postgres, NotificationRecord>(SET_READ_SQL)
            .bind(notification.into_uuid())
            .bind(recipient.to_string())
            .bind(is_read)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn mark_all_read(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        recipient: Recipient,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_ALL_READ_SQL)
            .bind(recipient.to_string())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_notification(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        notification: NotificationUuid,
        recipient: Recipient,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_NOTIFICATION_SQL)
            .bind(notification.into_uuid())
            .bind(recipient.to_string())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for NotificationRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let recipients = row
            .try_get::<Vec<String>, _>("recipients")?
            .iter()
            .map(|recipient| recipient.parse::<Recipient>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| sqlx::Error::ColumnDecode {
                index: "recipients".to_string(),
                source: Box::new(error),
            })?;

        let kind = row
            .try_get::<String, _>("kind")?
            .parse::<NotificationKind>()
            .map_err(|error| sqlx::Error::ColumnDecode {
                index: "kind".to_string(),
                source: Box::new(error),
            })?;

        Ok(Self {
            uuid: NotificationUuid::from_uuid(row.try_get("uuid")?),
            recipients,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            kind,
            is_read: row.try_get("is_read")?,
            related_data: row.try_get("related_data")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
