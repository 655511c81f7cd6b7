//! Trip operations as seen by one member.
//!
//! Every call goes to the store first. Successful reads and writes refresh the
//! cache; when a read fails the error is logged and the cached value is served
//! instead. Writes never pretend to succeed: their errors reach the caller.
//! Notifying the other members is best effort.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{
        event::{EventDraft, ItineraryEvent},
        invite,
        iou::{totals_by_owner, IouDraft, IouEntry},
        member::{ProfileDraft, TripMember},
        new_id,
        note::TripNote,
        notification::Notification,
        ticket::{FileKind, TicketDocument},
        todo::{TodoItem, TodoView},
        trip::{Trip, TripDraft},
    },
    services::{
        cache::{TripBundle, TripCache},
        debounce::Debouncer,
        files::{sanitize_file_name, FileStore},
        notify::Notifier,
        store::TripStore,
    },
};

const INVITE_CODE_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct TripManager {
    store: TripStore,
    cache: TripCache,
    files: FileStore,
    notifier: Notifier,
    note_saver: Debouncer,
    max_ticket_bytes: usize,
}

/// What a member owes in total, per creditor.
#[derive(Debug, Clone, Serialize)]
pub struct IouTotal {
    pub member_id: String,
    pub name: String,
    pub total_owed: f64,
}

/// Everything the trip detail page shows.
#[derive(Debug, Clone)]
pub struct TripOverview {
    pub trip: Trip,
    pub members: Vec<TripMember>,
    pub events: Vec<ItineraryEvent>,
    pub todos: Vec<TodoView>,
    pub note: TripNote,
    pub tickets: Vec<TicketDocument>,
    pub ious: Vec<IouEntry>,
    pub totals: Vec<IouTotal>,
}

impl TripManager {
    pub fn new(
        store: TripStore,
        cache: TripCache,
        files: FileStore,
        notifier: Notifier,
        note_saver: Debouncer,
        max_ticket_bytes: usize,
    ) -> Self {
        Self {
            store,
            cache,
            files,
            notifier,
            note_saver,
            max_ticket_bytes,
        }
    }

    pub fn cache(&self) -> &TripCache {
        &self.cache
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    async fn notify(&self, trip: &Trip, actor: &str, message: String) {
        if let Err(err) = self.notifier.notify_members(trip, actor, &message).await {
            warn!(trip_id = %trip.id, "notifying members failed: {err}");
        }
    }

    async fn load_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        match self.store.trip(trip_id).await {
            Ok(Some(trip)) => {
                self.cache.put_trip(trip.clone()).await;
                Ok(Some(trip))
            }
            Ok(None) => {
                self.cache.evict_trip(trip_id).await;
                Ok(None)
            }
            Err(err) => match self.cache.trip(trip_id).await {
                Some(trip) => {
                    warn!(%trip_id, "loading trip failed, serving cache: {err}");
                    Ok(Some(trip))
                }
                None => Err(err),
            },
        }
    }

    /// The trip, provided `user_id` belongs to it.
    async fn member_trip(&self, user_id: &str, trip_id: &str) -> Result<Trip, AppError> {
        let trip = self.load_trip(trip_id).await?.ok_or(AppError::NotFound)?;
        if !trip.is_member(user_id) {
            return Err(AppError::Forbidden);
        }
        Ok(trip)
    }

    async fn save_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.store.update_trip(trip).await?;
        self.cache.put_trip(trip.clone()).await;
        Ok(())
    }

    // trips

    pub async fn list_trips(&self, user_id: &str) -> Result<Vec<Trip>, AppError> {
        match self.store.trips_for_member(user_id).await {
            Ok(trips) => {
                self.cache.put_trips(&trips).await;
                Ok(trips)
            }
            Err(err) => {
                warn!(%user_id, "fetching trips failed, serving cache: {err}");
                Ok(self.cache.trips_for_member(user_id).await)
            }
        }
    }

    pub async fn get_trip(&self, user_id: &str, trip_id: &str) -> Result<Trip, AppError> {
        self.member_trip(user_id, trip_id).await
    }

    pub async fn create_trip(&self, user_id: &str, draft: TripDraft) -> Result<Trip, AppError> {
        draft.validate()?;
        let mut trip = Trip::new(user_id, draft);
        let mut attempts = 1;
        while self.store.invite_code_taken(&trip.invite_code).await? {
            if attempts >= INVITE_CODE_ATTEMPTS {
                return Err(AppError::Other(anyhow::anyhow!(
                    "could not find a free invite code"
                )));
            }
            trip.invite_code = invite::generate();
            attempts += 1;
        }
        self.store.insert_trip(&trip).await?;
        self.cache.put_trip(trip.clone()).await;
        info!(trip_id = %trip.id, owner = %user_id, "trip created");
        Ok(trip)
    }

    pub async fn update_trip(
        &self,
        user_id: &str,
        trip_id: &str,
        draft: TripDraft,
    ) -> Result<Trip, AppError> {
        draft.validate()?;
        let mut trip = self.member_trip(user_id, trip_id).await?;
        trip.apply(draft);
        self.save_trip(&trip).await?;
        self.notify(&trip, user_id, format!("Trip '{}' has been updated", trip.name))
            .await;
        Ok(trip)
    }

    /// Owner only. Removes the trip's rows, ticket files and cached data.
    pub async fn delete_trip(&self, user_id: &str, trip_id: &str) -> Result<(), AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        if !trip.is_owner(user_id) {
            return Err(AppError::Forbidden);
        }
        self.store.delete_trip(trip_id).await?;
        if let Err(err) = self.files.remove_trip(trip_id).await {
            warn!(%trip_id, "removing ticket files failed: {err}");
        }
        self.cache.evict_trip(trip_id).await;
        info!(%trip_id, "trip deleted");
        Ok(())
    }

    pub async fn find_by_invite_code(&self, code: &str) -> Result<Option<Trip>, AppError> {
        let code = invite::normalize(code);
        if !invite::is_valid(&code) {
            return Ok(None);
        }
        self.store.trip_by_invite_code(&code).await
    }

    pub async fn join_by_invite_code(&self, user_id: &str, code: &str) -> Result<Trip, AppError> {
        let Some(mut trip) = self.find_by_invite_code(code).await? else {
            return Err(AppError::bad_request(
                "Invalid invite code. Please check and try again.",
            ));
        };
        if !trip.add_member(user_id) {
            return Err(AppError::Conflict(
                "You're already a member of this trip!".into(),
            ));
        }
        self.save_trip(&trip).await?;
        info!(trip_id = %trip.id, %user_id, "member joined");
        self.notify(&trip, user_id, format!("A new member joined '{}'", trip.name))
            .await;
        Ok(trip)
    }

    pub async fn share_message(&self, user_id: &str, trip_id: &str) -> Result<String, AppError> {
        Ok(self.member_trip(user_id, trip_id).await?.share_message())
    }

    /// Re-reads every child collection of the trip into the cache.
    pub async fn refresh_trip(&self, user_id: &str, trip_id: &str) -> Result<TripBundle, AppError> {
        self.member_trip(user_id, trip_id).await?;
        let bundle = TripBundle {
            events: self.store.events(trip_id).await?,
            todos: self.store.todos(trip_id).await?,
            note: self.store.note(trip_id).await?,
            tickets: self.store.tickets(trip_id).await?,
            ious: self.store.ious(trip_id).await?,
        };
        self.cache.set_bundle(trip_id, bundle.clone()).await;
        debug!(%trip_id, "trip data refreshed");
        Ok(bundle)
    }

    pub async fn overview(&self, user_id: &str, trip_id: &str) -> Result<TripOverview, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let members = self.members(user_id, trip_id).await?;
        let totals = self.iou_totals(user_id, trip_id).await?;
        Ok(TripOverview {
            events: self.events(user_id, trip_id).await?,
            todos: self.todos(user_id, trip_id).await?,
            note: self.note(user_id, trip_id).await?,
            tickets: self.tickets(user_id, trip_id).await?,
            ious: self.ious(user_id, trip_id).await?,
            trip,
            members,
            totals,
        })
    }

    // members

    /// Profiles of the trip's members in member order. Members without a saved
    /// profile show up under their id.
    pub async fn members(&self, user_id: &str, trip_id: &str) -> Result<Vec<TripMember>, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        if let Some(cached) = self.cache.members(&trip.member_ids).await {
            return Ok(cached);
        }
        let found = match self.store.members(&trip.member_ids).await {
            Ok(found) => {
                self.cache.put_members(&found).await;
                found
            }
            Err(err) => {
                warn!(%trip_id, "fetching members failed, serving cache: {err}");
                self.cache.members_partial(&trip.member_ids).await
            }
        };
        Ok(trip
            .member_ids
            .iter()
            .map(|id| {
                found
                    .iter()
                    .find(|member| &member.user_id == id)
                    .cloned()
                    .unwrap_or_else(|| TripMember::anonymous(id))
            })
            .collect())
    }

    pub async fn profile(&self, user_id: &str) -> Result<TripMember, AppError> {
        let found = self.store.members(&[user_id.to_string()]).await?;
        Ok(found
            .into_iter()
            .next()
            .unwrap_or_else(|| TripMember::anonymous(user_id)))
    }

    pub async fn upsert_profile(
        &self,
        user_id: &str,
        draft: ProfileDraft,
    ) -> Result<TripMember, AppError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Name must not be empty"));
        }
        let member = TripMember {
            user_id: user_id.to_string(),
            name: name.to_string(),
            phone_number: draft.phone_number.trim().to_string(),
            notifications_enabled: draft.notifications_enabled,
        };
        self.store.save_member(&member).await?;
        self.cache.put_members(std::slice::from_ref(&member)).await;
        Ok(member)
    }

    /// The owner may remove anyone but themselves; other members may only leave.
    pub async fn remove_member(
        &self,
        user_id: &str,
        trip_id: &str,
        member_id: &str,
    ) -> Result<Trip, AppError> {
        let mut trip = self.member_trip(user_id, trip_id).await?;
        if member_id == trip.owner_id {
            return Err(AppError::bad_request(
                "The trip owner cannot leave; delete the trip instead",
            ));
        }
        if member_id != user_id && !trip.is_owner(user_id) {
            return Err(AppError::Forbidden);
        }
        if !trip.remove_member(member_id) {
            return Err(AppError::NotFound);
        }
        self.save_trip(&trip).await?;
        self.notify(
            &trip,
            user_id,
            format!("A member left '{}'", trip.name),
        )
        .await;
        Ok(trip)
    }

    // itinerary

    pub async fn events(
        &self,
        user_id: &str,
        trip_id: &str,
    ) -> Result<Vec<ItineraryEvent>, AppError> {
        self.member_trip(user_id, trip_id).await?;
        match self.store.events(trip_id).await {
            Ok(events) => {
                self.cache.set_events(trip_id, events.clone()).await;
                Ok(events)
            }
            Err(err) => {
                warn!(%trip_id, "fetching events failed, serving cache: {err}");
                Ok(self.cache.events(trip_id).await)
            }
        }
    }

    async fn trip_event(&self, trip_id: &str, event_id: &str) -> Result<ItineraryEvent, AppError> {
        self.store
            .event(event_id)
            .await?
            .filter(|event| event.trip_id == trip_id)
            .ok_or(AppError::NotFound)
    }

    pub async fn create_event(
        &self,
        user_id: &str,
        trip_id: &str,
        draft: EventDraft,
    ) -> Result<ItineraryEvent, AppError> {
        draft.validate()?;
        let trip = self.member_trip(user_id, trip_id).await?;
        let event = ItineraryEvent::new(trip_id, user_id, draft);
        self.store.save_event(&event).await?;
        self.cache.upsert_event(event.clone()).await;
        self.schedule_reminders(&event).await;
        self.notify(
            &trip,
            user_id,
            format!("New event '{}' added to itinerary", event.name),
        )
        .await;
        Ok(event)
    }

    pub async fn update_event(
        &self,
        user_id: &str,
        trip_id: &str,
        event_id: &str,
        draft: EventDraft,
    ) -> Result<ItineraryEvent, AppError> {
        draft.validate()?;
        let trip = self.member_trip(user_id, trip_id).await?;
        let mut event = self.trip_event(trip_id, event_id).await?;
        event.apply(draft);
        self.store.save_event(&event).await?;
        self.cache.upsert_event(event.clone()).await;
        self.schedule_reminders(&event).await;
        self.notify(
            &trip,
            user_id,
            format!("Event '{}' has been updated", event.name),
        )
        .await;
        Ok(event)
    }

    pub async fn delete_event(
        &self,
        user_id: &str,
        trip_id: &str,
        event_id: &str,
    ) -> Result<(), AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let event = self.trip_event(trip_id, event_id).await?;
        if let Err(err) = self.notifier.cancel_event_reminders(event_id).await {
            warn!(%event_id, "cancelling reminders failed: {err}");
        }
        self.store.delete_event(event_id).await?;
        self.cache.remove_event(trip_id, event_id).await;
        self.notify(
            &trip,
            user_id,
            format!("Event '{}' has been deleted", event.name),
        )
        .await;
        Ok(())
    }

    async fn schedule_reminders(&self, event: &ItineraryEvent) {
        match self
            .notifier
            .schedule_event_reminders(event, Utc::now())
            .await
        {
            Ok(count) => debug!(event_id = %event.id, count, "reminders scheduled"),
            Err(err) => warn!(event_id = %event.id, "scheduling reminders failed: {err}"),
        }
    }

    // to-dos

    pub async fn todos(&self, user_id: &str, trip_id: &str) -> Result<Vec<TodoView>, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let todos = match self.store.todos(trip_id).await {
            Ok(todos) => {
                self.cache.set_todos(trip_id, todos.clone()).await;
                todos
            }
            Err(err) => {
                warn!(%trip_id, "fetching todos failed, serving cache: {err}");
                self.cache.todos(trip_id).await
            }
        };
        Ok(todos
            .into_iter()
            .map(|todo| todo.view(&trip.member_ids))
            .collect())
    }

    async fn trip_todo(&self, trip_id: &str, todo_id: &str) -> Result<TodoItem, AppError> {
        self.store
            .todo(todo_id)
            .await?
            .filter(|todo| todo.trip_id == trip_id)
            .ok_or(AppError::NotFound)
    }

    pub async fn create_todo(
        &self,
        user_id: &str,
        trip_id: &str,
        title: &str,
    ) -> Result<TodoView, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let todo = TodoItem::new(trip_id, user_id, title)?;
        self.store.save_todo(&todo).await?;
        self.cache.upsert_todo(todo.clone()).await;
        self.notify(
            &trip,
            user_id,
            format!("New todo item added: '{}'", todo.title),
        )
        .await;
        Ok(todo.view(&trip.member_ids))
    }

    pub async fn update_todo(
        &self,
        user_id: &str,
        trip_id: &str,
        todo_id: &str,
        title: &str,
    ) -> Result<TodoView, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let mut todo = self.trip_todo(trip_id, todo_id).await?;
        todo.rename(title)?;
        self.store.save_todo(&todo).await?;
        self.cache.upsert_todo(todo.clone()).await;
        self.notify(&trip, user_id, format!("Todo item updated: '{}'", todo.title))
            .await;
        Ok(todo.view(&trip.member_ids))
    }

    /// Flips the caller's own completion flag.
    pub async fn toggle_todo(
        &self,
        user_id: &str,
        trip_id: &str,
        todo_id: &str,
    ) -> Result<TodoView, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let mut todo = self.trip_todo(trip_id, todo_id).await?;
        todo.toggle(user_id);
        self.store.save_todo(&todo).await?;
        self.cache.upsert_todo(todo.clone()).await;
        self.notify(&trip, user_id, format!("Todo item updated: '{}'", todo.title))
            .await;
        Ok(todo.view(&trip.member_ids))
    }

    pub async fn delete_todo(
        &self,
        user_id: &str,
        trip_id: &str,
        todo_id: &str,
    ) -> Result<(), AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let todo = self.trip_todo(trip_id, todo_id).await?;
        self.store.delete_todo(todo_id).await?;
        self.cache.remove_todo(trip_id, todo_id).await;
        self.notify(&trip, user_id, format!("Todo item deleted: '{}'", todo.title))
            .await;
        Ok(())
    }

    // notes

    /// The trip note, created empty on first access.
    pub async fn note(&self, user_id: &str, trip_id: &str) -> Result<TripNote, AppError> {
        self.member_trip(user_id, trip_id).await?;
        match self.store.note(trip_id).await {
            Ok(Some(note)) => {
                self.cache.set_note(note.clone()).await;
                Ok(note)
            }
            Ok(None) => {
                let note = TripNote::empty(trip_id, user_id);
                self.store.save_note(&note).await?;
                self.cache.set_note(note.clone()).await;
                Ok(note)
            }
            Err(err) => match self.cache.note(trip_id).await {
                Some(note) => {
                    warn!(%trip_id, "fetching note failed, serving cache: {err}");
                    Ok(note)
                }
                None => Err(err),
            },
        }
    }

    pub async fn save_note(
        &self,
        user_id: &str,
        trip_id: &str,
        content: String,
    ) -> Result<TripNote, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let note = TripNote::with_content(trip_id, user_id, content);
        self.store.save_note(&note).await?;
        self.cache.set_note(note.clone()).await;
        self.notify(&trip, user_id, "Notes have been updated".to_string())
            .await;
        Ok(note)
    }

    /// Saves the note once the trip has seen no newer draft for the debounce
    /// delay. Only the latest draft is written.
    pub async fn schedule_note_save(
        &self,
        user_id: &str,
        trip_id: &str,
        content: String,
    ) -> Result<(), AppError> {
        self.member_trip(user_id, trip_id).await?;
        let manager = self.clone();
        let user_id = user_id.to_string();
        let key = trip_id.to_string();
        let trip_id = trip_id.to_string();
        self.note_saver
            .schedule(&key, async move {
                if let Err(err) = manager.save_note(&user_id, &trip_id, content).await {
                    warn!(%trip_id, "debounced note save failed: {err}");
                }
            })
            .await;
        Ok(())
    }

    pub async fn note_save_pending(&self, trip_id: &str) -> bool {
        self.note_saver.is_pending(trip_id).await
    }

    // tickets

    pub async fn tickets(
        &self,
        user_id: &str,
        trip_id: &str,
    ) -> Result<Vec<TicketDocument>, AppError> {
        self.member_trip(user_id, trip_id).await?;
        match self.store.tickets(trip_id).await {
            Ok(tickets) => {
                self.cache.set_tickets(trip_id, tickets.clone()).await;
                Ok(tickets)
            }
            Err(err) => {
                warn!(%trip_id, "fetching tickets failed, serving cache: {err}");
                Ok(self.cache.tickets(trip_id).await)
            }
        }
    }

    async fn trip_ticket(&self, trip_id: &str, ticket_id: &str) -> Result<TicketDocument, AppError> {
        self.store
            .ticket(ticket_id)
            .await?
            .filter(|ticket| ticket.trip_id == trip_id)
            .ok_or(AppError::NotFound)
    }

    pub async fn upload_ticket(
        &self,
        user_id: &str,
        trip_id: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<TicketDocument, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        if data.is_empty() {
            return Err(AppError::bad_request("Ticket file is empty"));
        }
        if data.len() > self.max_ticket_bytes {
            return Err(AppError::bad_request(format!(
                "Ticket file is larger than {} bytes",
                self.max_ticket_bytes
            )));
        }
        let file_name = sanitize_file_name(file_name);
        let ticket_id = new_id("ticket");
        let key = self
            .files
            .write_ticket(trip_id, &ticket_id, &file_name, data)
            .await?;
        let ticket = TicketDocument {
            file_url: self.files.download_url(trip_id, &ticket_id)?,
            id: ticket_id,
            trip_id: trip_id.to_string(),
            file_kind: FileKind::from_content_type(content_type),
            content_type: content_type.to_string(),
            size_bytes: data.len() as i64,
            uploaded_by: user_id.to_string(),
            upload_date: Utc::now(),
            file_name,
        };
        if let Err(err) = self.store.insert_ticket(&ticket).await {
            if let Err(cleanup) = self.files.remove(&key).await {
                warn!(ticket_id = %ticket.id, "removing orphaned ticket file failed: {cleanup}");
            }
            return Err(err);
        }
        self.cache.add_ticket(ticket.clone()).await;
        info!(ticket_id = %ticket.id, %trip_id, size = data.len(), "ticket uploaded");
        self.notify(
            &trip,
            user_id,
            format!("New ticket uploaded: '{}'", ticket.file_name),
        )
        .await;
        Ok(ticket)
    }

    pub async fn ticket_file(
        &self,
        user_id: &str,
        trip_id: &str,
        ticket_id: &str,
    ) -> Result<(TicketDocument, Vec<u8>), AppError> {
        self.member_trip(user_id, trip_id).await?;
        let ticket = self.trip_ticket(trip_id, ticket_id).await?;
        let key = FileStore::ticket_key(trip_id, &ticket.id, &ticket.file_name);
        let data = self.files.read(&key).await?;
        Ok((ticket, data))
    }

    pub async fn delete_ticket(
        &self,
        user_id: &str,
        trip_id: &str,
        ticket_id: &str,
    ) -> Result<(), AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        let ticket = self.trip_ticket(trip_id, ticket_id).await?;
        let key = FileStore::ticket_key(trip_id, &ticket.id, &ticket.file_name);
        if let Err(err) = self.files.remove(&key).await {
            warn!(%ticket_id, "removing ticket file failed: {err}");
        }
        self.store.delete_ticket(ticket_id).await?;
        self.cache.remove_ticket(trip_id, ticket_id).await;
        self.notify(
            &trip,
            user_id,
            format!("Ticket deleted: '{}'", ticket.file_name),
        )
        .await;
        Ok(())
    }

    // IOUs

    pub async fn ious(&self, user_id: &str, trip_id: &str) -> Result<Vec<IouEntry>, AppError> {
        self.member_trip(user_id, trip_id).await?;
        match self.store.ious(trip_id).await {
            Ok(entries) => {
                self.cache.set_ious(trip_id, entries.clone()).await;
                Ok(entries)
            }
            Err(err) => {
                warn!(%trip_id, "fetching IOUs failed, serving cache: {err}");
                Ok(self.cache.ious(trip_id).await)
            }
        }
    }

    /// Creates an entry, or updates it when the draft carries an id.
    pub async fn save_iou(
        &self,
        user_id: &str,
        trip_id: &str,
        draft: IouDraft,
    ) -> Result<IouEntry, AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        draft.validate(&trip.member_ids)?;
        let (entry, message) = match draft.id.clone() {
            Some(iou_id) => {
                let mut entry = self
                    .store
                    .iou(&iou_id)
                    .await?
                    .filter(|entry| entry.trip_id == trip_id)
                    .ok_or(AppError::NotFound)?;
                entry.apply(draft);
                (entry, "An IOU has been updated")
            }
            None => (IouEntry::new(trip_id, draft), "A new IOU has been added"),
        };
        self.store.save_iou(&entry).await?;
        self.cache.upsert_iou(entry.clone()).await;
        self.notify(&trip, user_id, message.to_string()).await;
        Ok(entry)
    }

    pub async fn delete_iou(
        &self,
        user_id: &str,
        trip_id: &str,
        iou_id: &str,
    ) -> Result<(), AppError> {
        let trip = self.member_trip(user_id, trip_id).await?;
        self.store
            .iou(iou_id)
            .await?
            .filter(|entry| entry.trip_id == trip_id)
            .ok_or(AppError::NotFound)?;
        self.store.delete_iou(iou_id).await?;
        self.cache.remove_iou(trip_id, iou_id).await;
        self.notify(&trip, user_id, "An IOU has been deleted".to_string())
            .await;
        Ok(())
    }

    /// Total owed to each member, in member order, zero for members nobody owes.
    pub async fn iou_totals(&self, user_id: &str, trip_id: &str) -> Result<Vec<IouTotal>, AppError> {
        let members = self.members(user_id, trip_id).await?;
        let entries = self.ious(user_id, trip_id).await?;
        let totals: BTreeMap<String, f64> = totals_by_owner(&entries);
        Ok(members
            .into_iter()
            .map(|member| IouTotal {
                total_owed: totals.get(&member.user_id).copied().unwrap_or(0.0),
                member_id: member.user_id,
                name: member.name,
            })
            .collect())
    }

    // notifications

    pub async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        self.store.notifications_for(user_id).await
    }

    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<(), AppError> {
        self.store
            .mark_notification_read(user_id, notification_id)
            .await
    }
}
