//! Periodic reminder scan.

use std::{sync::Arc, time::Duration};

use jiff::{SignedDuration, Timestamp};
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{error, info, warn};

use crate::{
    domain::events::{EventsService, EventsServiceError, records::EventWithAttendees},
    mail::{
        Mailer, RetryPolicy, send_with_retry,
        templates::{EventReminder, event_reminder},
    },
    reminders::{ReminderKey, ReminderStore, ReminderWindow},
};

/// Default time between scans.
pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default look-ahead for upcoming events.
pub const DEFAULT_REMINDER_HORIZON: SignedDuration = SignedDuration::from_hours(25);

/// How long sent-reminder keys are kept.
pub const REMINDER_RETENTION: SignedDuration = SignedDuration::from_hours(24);

#[derive(Debug, Clone, Copy)]
pub struct ReminderSettings {
    pub interval: Duration,
    pub horizon: SignedDuration,
    pub retry: RetryPolicy,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REMINDER_INTERVAL,
            horizon: DEFAULT_REMINDER_HORIZON,
            retry: RetryPolicy::default(),
        }
    }
}

/// Counts from a single scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub events: usize,
    pub sent: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub pruned: usize,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    events: Arc<dyn EventsService>,
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn ReminderStore>,
    settings: ReminderSettings,
}

impl ReminderScheduler {
    #[must_use]
    pub fn new(
        events: Arc<dyn EventsService>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn ReminderStore>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            events,
            mailer,
            store,
            settings,
        }
    }

    /// Run one scan at `now`.
    #[tracing::instrument(name = "reminders.scheduler.tick", skip(self), err)]
    pub async fn tick(&self, now: Timestamp) -> Result<TickReport, EventsServiceError> {
        let mut report = TickReport {
            pruned: self.store.prune(now, REMINDER_RETENTION).await,
            ..TickReport::default()
        };

        let upcoming = self
            .events
            .upcoming_with_attendees(now, self.settings.horizon)
            .await?;

        report.events = upcoming.len();

        for entry in &upcoming {
            let lead = entry.event.starts_at.duration_since(now);

            let Some(window) = ReminderWindow::for_lead(lead) else {
                continue;
            };

            self.remind_attendees(entry, window, now, &mut report).await;
        }

        if report.sent > 0 || report.failed > 0 {
            info!(
                sent = report.sent,
                failed = report.failed,
                duplicates = report.duplicates,
                "sent event reminders"
            );
        }

        Ok(report)
    }

    async fn remind_attendees(
        &self,
        entry: &EventWithAttendees,
        window: ReminderWindow,
        now: Timestamp,
        report: &mut TickReport,
    ) {
        for attendee in &entry.attendees {
            let key = ReminderKey::new(attendee.email.clone(), entry.event.uuid, window, now);

            if !self.store.try_mark(key.clone(), now).await {
                report.duplicates += 1;
                continue;
            }

            let message = event_reminder(
                &attendee.email,
                &EventReminder {
                    attendee_name: attendee.name.clone(),
                    event_title: entry.event.title.clone(),
                    location: entry.event.location.clone(),
                    starts_at: entry.event.starts_at,
                },
                window,
            );

            let delivery = send_with_retry(self.mailer.as_ref(), message, self.settings.retry).await;

            if delivery.is_delivered() {
                report.sent += 1;
            } else {
                warn!(
                    event_uuid = %entry.event.uuid,
                    window = window.label(),
                    "reminder not delivered, will retry on a later scan"
                );

                self.store.release(key).await;
                report.failed += 1;
            }
        }
    }

    /// Scan immediately, then on every interval until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.settings.interval.as_secs(),
            "reminder scheduler started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.tick(Timestamp::now()).await {
                        error!(%error, "reminder scan failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("reminder scheduler stopped");
    }
}
