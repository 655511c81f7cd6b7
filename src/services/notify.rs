use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{
        event::ItineraryEvent,
        member::TripMember,
        new_id,
        notification::{EventReminder, Notification},
        trip::Trip,
    },
    services::store::TripStore,
};

pub const TRIP_UPDATE_TITLE: &str = "Trip Update";

/// Minutes before an event at which a reminder fires, indexed by slot.
pub const REMINDER_OFFSETS_MINUTES: [i64; 3] = [60, 30, 15];

/// In-app notifications for trip members, plus event reminders.
#[derive(Clone)]
pub struct Notifier {
    store: TripStore,
}

impl Notifier {
    pub fn new(store: TripStore) -> Self {
        Self { store }
    }

    /// Tells every member except `actor` about a change. Members who turned
    /// notifications off are skipped.
    pub async fn notify_members(
        &self,
        trip: &Trip,
        actor: &str,
        message: &str,
    ) -> Result<usize, AppError> {
        let recipients: Vec<String> = trip
            .member_ids
            .iter()
            .filter(|id| id.as_str() != actor)
            .cloned()
            .collect();
        self.send(trip, &recipients, TRIP_UPDATE_TITLE, message)
            .await
    }

    async fn send(
        &self,
        trip: &Trip,
        recipients: &[String],
        title: &str,
        body: &str,
    ) -> Result<usize, AppError> {
        if recipients.is_empty() {
            return Ok(0);
        }
        let profiles = self.store.members(recipients).await?;
        let mut sent = 0;
        for user_id in recipients {
            if !wants_notifications(&profiles, user_id) {
                debug!(%user_id, "notifications disabled, skipping");
                continue;
            }
            let notification = Notification {
                id: new_id("notif"),
                user_id: user_id.clone(),
                trip_id: trip.id.clone(),
                title: title.to_string(),
                body: body.to_string(),
                created_at: Utc::now(),
                read: false,
            };
            self.store.insert_notification(&notification).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Replaces the event's reminders with the ones still in the future.
    pub async fn schedule_event_reminders(
        &self,
        event: &ItineraryEvent,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let times = reminder_times(event.starts_at(), now);
        self.store
            .replace_reminders(&event.id, &event.trip_id, &times)
            .await?;
        Ok(times.len())
    }

    pub async fn cancel_event_reminders(&self, event_id: &str) -> Result<(), AppError> {
        self.store.delete_reminders(event_id).await
    }

    /// Turns due reminders into notifications for every trip member. Each
    /// event gets at most one notification per pass, and reminders for
    /// events that already started are retired silently.
    pub async fn deliver_due(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut by_event: BTreeMap<String, Vec<EventReminder>> = BTreeMap::new();
        for reminder in self.store.due_reminders(now).await? {
            by_event
                .entry(reminder.event_id.clone())
                .or_default()
                .push(reminder);
        }

        let mut delivered = 0;
        for (event_id, reminders) in by_event {
            let event = self.store.event(&event_id).await?;
            let upcoming = event.filter(|event| event.starts_at() > now);
            match upcoming {
                Some(event) => {
                    if let Some(trip) = self.store.trip(&event.trip_id).await? {
                        let title = format!("Upcoming: {}", event.name);
                        let body = if event.location.is_empty() {
                            "Your event is starting soon".to_string()
                        } else {
                            format!("Your event at {} is starting soon", event.location)
                        };
                        delivered += self.send(&trip, &trip.member_ids, &title, &body).await?;
                    }
                }
                None => debug!(%event_id, "event already started, dropping reminders"),
            }
            for reminder in &reminders {
                self.store
                    .mark_reminder_delivered(&reminder.event_id, reminder.slot)
                    .await?;
            }
        }
        Ok(delivered)
    }

    pub fn spawn_reminder_loop(self, every: Duration) -> JoinHandle<()> {
        info!(interval_secs = every.as_secs(), "starting reminder loop");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match self.deliver_due(Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => debug!(count, "delivered event reminders"),
                    Err(err) => warn!("reminder delivery failed: {err}"),
                }
            }
        })
    }
}

fn wants_notifications(profiles: &[TripMember], user_id: &str) -> bool {
    profiles
        .iter()
        .find(|profile| profile.user_id == user_id)
        .map(|profile| profile.notifications_enabled)
        .unwrap_or(true)
}

/// Reminder slots and fire times for an event, dropping any already past.
pub fn reminder_times(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> Vec<(i64, DateTime<Utc>)> {
    REMINDER_OFFSETS_MINUTES
        .iter()
        .enumerate()
        .map(|(slot, minutes)| (slot as i64, starts_at - chrono::Duration::minutes(*minutes)))
        .filter(|(_, fire_at)| *fire_at > now)
        .collect()
}
