//! Reminder deduplication store.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp, civil::Date, tz::TimeZone};
use mockall::automock;
use rustc_hash::FxHashMap;

use crate::{domain::events::records::EventUuid, reminders::ReminderWindow};

/// Identifies one reminder: who, for which event, which window, which UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub recipient: String,
    pub event: EventUuid,
    pub window: ReminderWindow,
    pub day: Date,
}

impl ReminderKey {
    #[must_use]
    pub fn new(
        recipient: impl Into<String>,
        event: EventUuid,
        window: ReminderWindow,
        now: Timestamp,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            event,
            window,
            day: utc_day(now),
        }
    }
}

/// Calendar day of `timestamp` in UTC.
#[must_use]
pub fn utc_day(timestamp: Timestamp) -> Date {
    timestamp.to_zoned(TimeZone::UTC).date()
}

#[automock]
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Record `key` as sent at `now`. Returns `false` when it was already recorded.
    async fn try_mark(&self, key: ReminderKey, now: Timestamp) -> bool;

    /// Forget `key` so a later scan may send it again.
    async fn release(&self, key: ReminderKey);

    /// Drop keys recorded more than `max_age` before `now`, returning how many were dropped.
    async fn prune(&self, now: Timestamp, max_age: SignedDuration) -> usize;
}

/// Process-local [`ReminderStore`].
#[derive(Debug, Default)]
pub struct InMemoryReminderStore {
    entries: Mutex<FxHashMap<ReminderKey, Timestamp>>,
}

impl InMemoryReminderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn try_mark(&self, key: ReminderKey, now: Timestamp) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries.contains_key(&key) {
            return false;
        }

        entries.insert(key, now);

        true
    }

    async fn release(&self, key: ReminderKey) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }

    async fn prune(&self, now: Timestamp, max_age: SignedDuration) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();

        entries.retain(|_, marked_at| now.duration_since(*marked_at) <= max_age);

        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = Timestamp::constant(1_767_247_200, 0);

    fn key(now: Timestamp) -> ReminderKey {
        ReminderKey::new(
            "ada@example.com",
            EventUuid::from_uuid(uuid::Uuid::nil()),
            ReminderWindow::DayBefore,
            now,
        )
    }

    #[tokio::test]
    async fn marks_each_key_once() {
        let store = InMemoryReminderStore::new();

        assert!(store.try_mark(key(NOW), NOW).await);
        assert!(!store.try_mark(key(NOW), NOW).await);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn new_utc_day_is_a_new_key() {
        let store = InMemoryReminderStore::new();
        let tomorrow = NOW + SignedDuration::from_hours(24);

        assert!(store.try_mark(key(NOW), NOW).await);
        assert!(store.try_mark(key(tomorrow), tomorrow).await);
    }

    #[tokio::test]
    async fn prune_drops_entries_older_than_max_age() {
        let store = InMemoryReminderStore::new();

        store.try_mark(key(NOW), NOW).await;

        let pruned = store
            .prune(NOW + SignedDuration::from_hours(1), SignedDuration::from_hours(24))
            .await;

        assert_eq!(pruned, 0);

        let pruned = store
            .prune(NOW + SignedDuration::from_hours(25), SignedDuration::from_hours(24))
            .await;

        assert_eq!(pruned, 1);
        assert!(store.is_empty());
        assert!(store.try_mark(key(NOW), NOW).await);
    }

    #[tokio::test]
    async fn release_allows_marking_again() {
        let store = InMemoryReminderStore::new();

        store.try_mark(key(NOW), NOW).await;
        store.release(key(NOW)).await;

        assert!(store.try_mark(key(NOW), NOW).await);
    }
}
