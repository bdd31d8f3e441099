//! Events Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::events::{
    data::{NewAttendee, NewEvent},
    records::{AttendeeRecord, AttendeeUuid, EventRecord, EventUuid},
};

const CREATE_EVENT_SQL: &str = include_str!("sql/create_event.sql");
const LIST_UPCOMING_EVENTS_SQL: &str = include_str!("sql/list_upcoming_events.sql");
const CREATE_ATTENDEE_SQL: &str = include_str!("sql/create_attendee.sql");
const LIST_ATTENDEES_SQL: &str = include_str!("sql/list_attendees.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgEventsRepository;

impl PgEventsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: NewEvent,
    ) -> Result<EventRecord, sqlx::Error> {
        query_as::<Postgres, EventRecord>(CREATE_EVENT_SQL)
            .bind(event.uuid.into_uuid())
            .bind(event.title)
            .bind(event.location)
            .bind(SqlxTimestamp::from(event.starts_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Events starting after `after`, up to and including `until` when given.
    pub(crate) async fn list_upcoming(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        after: Timestamp,
        until: Option<Timestamp>,
    ) -> Result<Vec<EventRecord>, sqlx::Error> {
        query_as::<Postgres, EventRecord>(LIST_UPCOMING_EVENTS_SQL)
            .bind(SqlxTimestamp::from(after))
            .bind(until.map(SqlxTimestamp::from))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_attendee(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: EventUuid,
        attendee: NewAttendee,
    ) -> Result<AttendeeRecord, sqlx::Error> {
        query_as::<Postgres, AttendeeRecord>(CREATE_ATTENDEE_SQL)
            .bind(attendee.uuid.into_uuid())
            .bind(event.into_uuid())
            .bind(attendee.email)
            .bind(attendee.name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_attendees(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        events: &[EventUuid],
    ) -> Result<Vec<AttendeeRecord>, sqlx::Error> {
        let events: Vec<Uuid> = events.iter().copied().map(EventUuid::into_uuid).collect();

        query_as::<Postgres, AttendeeRecord>(LIST_ATTENDEES_SQL)
            .bind(events)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for EventRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: EventUuid::from_uuid(row.try_get("uuid")?),
            title: row.try_get("title")?,
            location: row.try_get("location")?,
            starts_at: row.try_get::<SqlxTimestamp, _>("starts_at")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AttendeeRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AttendeeUuid::from_uuid(row.try_get("uuid")?),
            event: EventUuid::from_uuid(row.try_get("event_uuid")?),
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
