//! In-memory copy of what the service last read from or wrote to the store.
//!
//! Reads fall back to these values when the database is unavailable.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::{
    event::{sort_events, ItineraryEvent},
    iou::{sort_ious, IouEntry},
    member::TripMember,
    note::TripNote,
    ticket::{sort_tickets, TicketDocument},
    todo::TodoItem,
    trip::{sort_trips, Trip},
};

/// Everything cached for one trip.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TripBundle {
    pub events: Vec<ItineraryEvent>,
    pub todos: Vec<TodoItem>,
    pub note: Option<TripNote>,
    pub tickets: Vec<TicketDocument>,
    pub ious: Vec<IouEntry>,
}

#[derive(Default)]
struct CacheInner {
    trips: HashMap<String, Trip>,
    bundles: HashMap<String, TripBundle>,
    members: HashMap<String, TripMember>,
}

#[derive(Clone, Default)]
pub struct TripCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl TripCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn trip(&self, trip_id: &str) -> Option<Trip> {
        self.inner.read().await.trips.get(trip_id).cloned()
    }

    pub async fn trips_for_member(&self, user_id: &str) -> Vec<Trip> {
        let inner = self.inner.read().await;
        let mut trips: Vec<Trip> = inner
            .trips
            .values()
            .filter(|trip| trip.is_member(user_id))
            .cloned()
            .collect();
        sort_trips(&mut trips);
        trips
    }

    pub async fn put_trip(&self, trip: Trip) {
        self.inner.write().await.trips.insert(trip.id.clone(), trip);
    }

    pub async fn put_trips(&self, trips: &[Trip]) {
        let mut inner = self.inner.write().await;
        for trip in trips {
            inner.trips.insert(trip.id.clone(), trip.clone());
        }
    }

    /// Drops the trip and every cached child document.
    pub async fn evict_trip(&self, trip_id: &str) {
        let mut inner = self.inner.write().await;
        inner.trips.remove(trip_id);
        inner.bundles.remove(trip_id);
    }

    pub async fn bundle(&self, trip_id: &str) -> Option<TripBundle> {
        self.inner.read().await.bundles.get(trip_id).cloned()
    }

    pub async fn has_bundle(&self, trip_id: &str) -> bool {
        self.inner.read().await.bundles.contains_key(trip_id)
    }

    /// Replaces everything cached for the trip with a fresh read.
    pub async fn set_bundle(&self, trip_id: &str, bundle: TripBundle) {
        self.inner
            .write()
            .await
            .bundles
            .insert(trip_id.to_string(), bundle);
    }

    async fn with_bundle<R>(&self, trip_id: &str, f: impl FnOnce(&mut TripBundle) -> R) -> R {
        let mut inner = self.inner.write().await;
        f(inner.bundles.entry(trip_id.to_string()).or_default())
    }

    pub async fn events(&self, trip_id: &str) -> Vec<ItineraryEvent> {
        self.bundle(trip_id)
            .await
            .map(|bundle| bundle.events)
            .unwrap_or_default()
    }

    pub async fn set_events(&self, trip_id: &str, events: Vec<ItineraryEvent>) {
        self.with_bundle(trip_id, |bundle| bundle.events = events)
            .await;
    }

    pub async fn upsert_event(&self, event: ItineraryEvent) {
        self.with_bundle(&event.trip_id.clone(), |bundle| {
            upsert_by_id(&mut bundle.events, event, |e| &e.id);
            sort_events(&mut bundle.events);
        })
        .await;
    }

    pub async fn remove_event(&self, trip_id: &str, event_id: &str) {
        self.with_bundle(trip_id, |bundle| bundle.events.retain(|e| e.id != event_id))
            .await;
    }

    pub async fn todos(&self, trip_id: &str) -> Vec<TodoItem> {
        self.bundle(trip_id)
            .await
            .map(|bundle| bundle.todos)
            .unwrap_or_default()
    }

    pub async fn set_todos(&self, trip_id: &str, todos: Vec<TodoItem>) {
        self.with_bundle(trip_id, |bundle| bundle.todos = todos)
            .await;
    }

    pub async fn upsert_todo(&self, todo: TodoItem) {
        self.with_bundle(&todo.trip_id.clone(), |bundle| {
            upsert_by_id(&mut bundle.todos, todo, |t| &t.id)
        })
        .await;
    }

    pub async fn remove_todo(&self, trip_id: &str, todo_id: &str) {
        self.with_bundle(trip_id, |bundle| bundle.todos.retain(|t| t.id != todo_id))
            .await;
    }

    pub async fn note(&self, trip_id: &str) -> Option<TripNote> {
        self.bundle(trip_id).await.and_then(|bundle| bundle.note)
    }

    pub async fn set_note(&self, note: TripNote) {
        self.with_bundle(&note.trip_id.clone(), |bundle| bundle.note = Some(note))
            .await;
    }

    pub async fn tickets(&self, trip_id: &str) -> Vec<TicketDocument> {
        self.bundle(trip_id)
            .await
            .map(|bundle| bundle.tickets)
            .unwrap_or_default()
    }

    pub async fn set_tickets(&self, trip_id: &str, tickets: Vec<TicketDocument>) {
        self.with_bundle(trip_id, |bundle| bundle.tickets = tickets)
            .await;
    }

    pub async fn add_ticket(&self, ticket: TicketDocument) {
        self.with_bundle(&ticket.trip_id.clone(), |bundle| {
            upsert_by_id(&mut bundle.tickets, ticket, |t| &t.id);
            sort_tickets(&mut bundle.tickets);
        })
        .await;
    }

    pub async fn remove_ticket(&self, trip_id: &str, ticket_id: &str) {
        self.with_bundle(trip_id, |bundle| bundle.tickets.retain(|t| t.id != ticket_id))
            .await;
    }

    pub async fn ious(&self, trip_id: &str) -> Vec<IouEntry> {
        self.bundle(trip_id)
            .await
            .map(|bundle| bundle.ious)
            .unwrap_or_default()
    }

    pub async fn set_ious(&self, trip_id: &str, ious: Vec<IouEntry>) {
        self.with_bundle(trip_id, |bundle| bundle.ious = ious).await;
    }

    pub async fn upsert_iou(&self, entry: IouEntry) {
        self.with_bundle(&entry.trip_id.clone(), |bundle| {
            upsert_by_id(&mut bundle.ious, entry, |e| &e.id);
            sort_ious(&mut bundle.ious);
        })
        .await;
    }

    pub async fn remove_iou(&self, trip_id: &str, iou_id: &str) {
        self.with_bundle(trip_id, |bundle| bundle.ious.retain(|e| e.id != iou_id))
            .await;
    }

    /// Cached profiles for the given ids, `None` unless every id is present.
    pub async fn members(&self, user_ids: &[String]) -> Option<Vec<TripMember>> {
        let inner = self.inner.read().await;
        user_ids
            .iter()
            .map(|id| inner.members.get(id).cloned())
            .collect()
    }

    pub async fn members_partial(&self, user_ids: &[String]) -> Vec<TripMember> {
        let inner = self.inner.read().await;
        user_ids
            .iter()
            .filter_map(|id| inner.members.get(id).cloned())
            .collect()
    }

    pub async fn put_members(&self, members: &[TripMember]) {
        let mut inner = self.inner.write().await;
        for member in members {
            inner.members.insert(member.user_id.clone(), member.clone());
        }
    }
}

fn upsert_by_id<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::trip::TripDraft;

    fn trip(owner: &str) -> Trip {
        Trip::new(
            owner,
            TripDraft {
                name: "Trip".into(),
                location: String::new(),
                coordinate: None,
                start_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 5, 3).unwrap(),
            },
        )
    }

    #[tokio::test]
    async fn evicting_a_trip_drops_all_cached_children() {
        let cache = TripCache::new();
        let trip = trip("alice");
        cache.put_trip(trip.clone()).await;
        cache
            .upsert_todo(TodoItem::new(&trip.id, "alice", "Tickets").unwrap())
            .await;
        cache
            .set_note(TripNote::empty(&trip.id, "alice"))
            .await;
        assert!(cache.has_bundle(&trip.id).await);

        cache.evict_trip(&trip.id).await;

        assert!(cache.trip(&trip.id).await.is_none());
        assert!(!cache.has_bundle(&trip.id).await);
        assert!(cache.todos(&trip.id).await.is_empty());
        assert!(cache.note(&trip.id).await.is_none());
    }

    #[tokio::test]
    async fn replacing_a_bundle_drops_a_note_the_store_no_longer_has() {
        let cache = TripCache::new();
        let trip = trip("alice");
        cache.set_note(TripNote::empty(&trip.id, "alice")).await;

        cache.set_bundle(&trip.id, TripBundle::default()).await;

        assert!(cache.note(&trip.id).await.is_none());
        assert!(cache.has_bundle(&trip.id).await);
    }

    #[tokio::test]
    async fn member_lookup_requires_every_id() {
        let cache = TripCache::new();
        cache.put_members(&[TripMember::anonymous("alice")]).await;
        let ids = vec!["alice".to_string(), "bob".to_string()];
        assert!(cache.members(&ids).await.is_none());
        assert_eq!(cache.members_partial(&ids).await.len(), 1);
    }
}
