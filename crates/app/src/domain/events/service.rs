//! Events service.

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        events::{
            data::{NewAttendee, NewEvent},
            errors::EventsServiceError,
            records::{AttendeeRecord, EventRecord, EventUuid, EventWithAttendees},
            repository::PgEventsRepository,
        },
        users::data::normalize_email,
    },
};

#[derive(Debug, Clone)]
pub struct PgEventsService {
    db: Db,
    repository: PgEventsRepository,
}

impl PgEventsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgEventsRepository::new(),
        }
    }
}

#[async_trait]
impl EventsService for PgEventsService {
    #[tracing::instrument(
        name = "events.service.create_event",
        skip(self, event),
        fields(event_uuid = %event.uuid),
        err
    )]
    async fn create_event(&self, event: NewEvent) -> Result<EventRecord, EventsServiceError> {
        let title = event.title.trim().to_string();

        if title.is_empty() {
            return Err(EventsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_event(&mut tx, NewEvent { title, ..event })
            .await?;

        tx.commit().await?;

        info!(event_uuid = %created.uuid, starts_at = %created.starts_at, "created event");

        Ok(created)
    }

    async fn list_upcoming(&self, now: Timestamp) -> Result<Vec<EventRecord>, EventsServiceError> {
        let mut tx = self.db.begin().await?;

        let events = self.repository.list_upcoming(&mut tx, now, None).await?;

        tx.commit().await?;

        Ok(events)
    }

    #[tracing::instrument(name = "events.service.register_attendee", skip(self, attendee), err)]
    async fn register_attendee(
        &self,
        event: EventUuid,
        attendee: NewAttendee,
    ) -> Result<AttendeeRecord, EventsServiceError> {
        let email = normalize_email(&attendee.email);
        let name = attendee.name.trim().to_string();

        if email.is_empty() || name.is_empty() {
            return Err(EventsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin().await?;

        let registered = self
            .repository
            .create_attendee(
                &mut tx,
                event,
                NewAttendee {
                    email,
                    name,
                    ..attendee
                },
            )
            .await?;

        tx.commit().await?;

        info!(%event, attendee_uuid = %registered.uuid, "registered attendee");

        Ok(registered)
    }

    async fn upcoming_with_attendees(
        &self,
        now: Timestamp,
        horizon: SignedDuration,
    ) -> Result<Vec<EventWithAttendees>, EventsServiceError> {
        let until = now.checked_add(horizon).unwrap_or(Timestamp::MAX);

        let mut tx = self.db.begin().await?;

        let events = self.repository.list_upcoming(&mut tx, now, Some(until)).await?;

        let uuids: Vec<EventUuid> = events.iter().map(|event| event.uuid).collect();

        let attendees = if uuids.is_empty() {
            Vec::new()
        } else {
            self.repository.list_attendees(&mut tx, &uuids).await?
        };

        tx.commit().await?;

        Ok(group_attendees(events, attendees))
    }
}

fn group_attendees(
    events: Vec<EventRecord>,
    attendees: Vec<AttendeeRecord>,
) -> Vec<EventWithAttendees> {
    let mut by_event: FxHashMap<EventUuid, Vec<AttendeeRecord>> = FxHashMap::default();

    for attendee in attendees {
        by_event.entry(attendee.event).or_default().push(attendee);
    }

    events
        .into_iter()
        .map(|event| EventWithAttendees {
            attendees: by_event.remove(&event.uuid).unwrap_or_default(),
            event,
        })
        .collect()
}

#[automock]
#[async_trait]
pub trait EventsService: Send + Sync {
    /// Creates a new event.
    async fn create_event(&self, event: NewEvent) -> Result<EventRecord, EventsServiceError>;

    /// Events that have not started yet, soonest first.
    async fn list_upcoming(&self, now: Timestamp) -> Result<Vec<EventRecord>, EventsServiceError>;

    /// Register someone for an event.
    ///
    /// The same email can only register once per event.
    async fn register_attendee(
        &self,
        event: EventUuid,
        attendee: NewAttendee,
    ) -> Result<AttendeeRecord, EventsServiceError>;

    /// Events starting within `horizon` of `now`, each with its attendees.
    async fn upcoming_with_attendees(
        &self,
        now: Timestamp,
        horizon: SignedDuration,
    ) -> Result<Vec<EventWithAttendees>, EventsServiceError>;
}
