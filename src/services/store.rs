//! SQLite persistence for trips and everything hanging off them.
//!
//! Child tables reference `trips(id)` with `ON DELETE CASCADE`, so removing a
//! trip row removes its events, to-dos, note, tickets and IOUs as well.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        event::{sort_events, ItineraryEvent},
        iou::{sort_ious, IouEntry},
        member::TripMember,
        note::TripNote,
        notification::{EventReminder, Notification},
        ticket::{sort_tickets, FileKind, TicketDocument},
        todo::TodoItem,
        trip::{sort_trips, Trip},
        Coordinate,
    },
};

const TRIP_COLUMNS: &str = "id, name, location, latitude, longitude, start_date, end_date, \
     owner_id, member_ids, invite_code, created_at";
const EVENT_COLUMNS: &str =
    "id, trip_id, name, date, time, location, latitude, longitude, notes, created_by";
const TICKET_COLUMNS: &str = "id, trip_id, file_name, content_type, file_kind, size_bytes, \
     uploaded_by, upload_date, file_url";
const IOU_COLUMNS: &str =
    "id, trip_id, owner_id, debtor_id, amount, note, created_date, last_modified_date";

#[derive(Clone)]
pub struct TripStore {
    db: DbPool,
}

impl TripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // trips

    pub async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO trips (id, name, location, latitude, longitude, start_date, end_date,
                   owner_id, member_ids, invite_code, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
        )
        .bind(&trip.id)
        .bind(&trip.name)
        .bind(&trip.location)
        .bind(trip.coordinate.map(|c| c.latitude))
        .bind(trip.coordinate.map(|c| c.longitude))
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(&trip.owner_id)
        .bind(serde_json::to_string(&trip.member_ids)?)
        .bind(&trip.invite_code)
        .bind(trip.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE trips SET name = ?2, location = ?3, latitude = ?4, longitude = ?5,
                   start_date = ?6, end_date = ?7, owner_id = ?8, member_ids = ?9
               WHERE id = ?1"#,
        )
        .bind(&trip.id)
        .bind(&trip.name)
        .bind(&trip.location)
        .bind(trip.coordinate.map(|c| c.latitude))
        .bind(trip.coordinate.map(|c| c.longitude))
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(&trip.owner_id)
        .bind(serde_json::to_string(&trip.member_ids)?)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_trip(&self, trip_id: &str) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notifications WHERE trip_id = ?1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        let row = sqlx::query(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"))
            .bind(trip_id)
            .fetch_optional(&self.db)
            .await?;
        row.map(|row| trip_from_row(&row)).transpose()
    }

    pub async fn trips_for_member(&self, user_id: &str) -> Result<Vec<Trip>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips \
             WHERE EXISTS (SELECT 1 FROM json_each(trips.member_ids) WHERE json_each.value = ?1)"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        let mut trips = rows
            .iter()
            .map(trip_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        sort_trips(&mut trips);
        Ok(trips)
    }

    pub async fn trip_by_invite_code(&self, code: &str) -> Result<Option<Trip>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE invite_code = ?1 LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        row.map(|row| trip_from_row(&row)).transpose()
    }

    pub async fn invite_code_taken(&self, code: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE invite_code = ?1")
            .bind(code)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    // itinerary

    pub async fn events(&self, trip_id: &str) -> Result<Vec<ItineraryEvent>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM itinerary_events WHERE trip_id = ?1"
        ))
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        let mut events = rows
            .iter()
            .map(event_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        sort_events(&mut events);
        Ok(events)
    }

    pub async fn event(&self, event_id: &str) -> Result<Option<ItineraryEvent>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM itinerary_events WHERE id = ?1"
        ))
        .bind(event_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(|row| event_from_row(&row)).transpose()
    }

    pub async fn save_event(&self, event: &ItineraryEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO itinerary_events
                   (id, trip_id, name, date, time, location, latitude, longitude, notes, created_by)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name, date = excluded.date, time = excluded.time,
                   location = excluded.location, latitude = excluded.latitude,
                   longitude = excluded.longitude, notes = excluded.notes"#,
        )
        .bind(&event.id)
        .bind(&event.trip_id)
        .bind(&event.name)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(event.coordinate.map(|c| c.latitude))
        .bind(event.coordinate.map(|c| c.longitude))
        .bind(&event.notes)
        .bind(&event.created_by)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM itinerary_events WHERE id = ?1")
            .bind(event_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    // to-dos

    pub async fn todos(&self, trip_id: &str) -> Result<Vec<TodoItem>, AppError> {
        let rows = sqlx::query(
            "SELECT id, trip_id, title, completed_by, created_by FROM todo_items \
             WHERE trip_id = ?1 ORDER BY created_at ASC",
        )
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        rows.iter().map(todo_from_row).collect()
    }

    pub async fn todo(&self, todo_id: &str) -> Result<Option<TodoItem>, AppError> {
        let row = sqlx::query(
            "SELECT id, trip_id, title, completed_by, created_by FROM todo_items WHERE id = ?1",
        )
        .bind(todo_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(|row| todo_from_row(&row)).transpose()
    }

    pub async fn save_todo(&self, todo: &TodoItem) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO todo_items (id, trip_id, title, completed_by, created_by, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET
                   title = excluded.title, completed_by = excluded.completed_by"#,
        )
        .bind(&todo.id)
        .bind(&todo.trip_id)
        .bind(&todo.title)
        .bind(serde_json::to_string(&todo.completed_by)?)
        .bind(&todo.created_by)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn delete_todo(&self, todo_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM todo_items WHERE id = ?1")
            .bind(todo_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    // notes

    pub async fn note(&self, trip_id: &str) -> Result<Option<TripNote>, AppError> {
        let row = sqlx::query(
            "SELECT id, trip_id, content, last_modified_by, last_modified_date \
             FROM trip_notes WHERE trip_id = ?1",
        )
        .bind(trip_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|row| TripNote {
            id: row.get("id"),
            trip_id: row.get("trip_id"),
            content: row.get("content"),
            last_modified_by: row.get("last_modified_by"),
            last_modified_date: row.get("last_modified_date"),
        }))
    }

    pub async fn save_note(&self, note: &TripNote) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO trip_notes (id, trip_id, content, last_modified_by, last_modified_date)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(trip_id) DO UPDATE SET
                   content = excluded.content,
                   last_modified_by = excluded.last_modified_by,
                   last_modified_date = excluded.last_modified_date"#,
        )
        .bind(&note.id)
        .bind(&note.trip_id)
        .bind(&note.content)
        .bind(&note.last_modified_by)
        .bind(note.last_modified_date)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    // tickets

    pub async fn tickets(&self, trip_id: &str) -> Result<Vec<TicketDocument>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM ticket_documents WHERE trip_id = ?1"
        ))
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        let mut tickets: Vec<_> = rows.iter().map(ticket_from_row).collect();
        sort_tickets(&mut tickets);
        Ok(tickets)
    }

    pub async fn ticket(&self, ticket_id: &str) -> Result<Option<TicketDocument>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM ticket_documents WHERE id = ?1"
        ))
        .bind(ticket_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.as_ref().map(ticket_from_row))
    }

    pub async fn insert_ticket(&self, ticket: &TicketDocument) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO ticket_documents (id, trip_id, file_name, content_type, file_kind,
                   size_bytes, uploaded_by, upload_date, file_url)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
        )
        .bind(&ticket.id)
        .bind(&ticket.trip_id)
        .bind(&ticket.file_name)
        .bind(&ticket.content_type)
        .bind(ticket.file_kind.as_str())
        .bind(ticket.size_bytes)
        .bind(&ticket.uploaded_by)
        .bind(ticket.upload_date)
        .bind(&ticket.file_url)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn delete_ticket(&self, ticket_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM ticket_documents WHERE id = ?1")
            .bind(ticket_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    // IOUs

    pub async fn ious(&self, trip_id: &str) -> Result<Vec<IouEntry>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {IOU_COLUMNS} FROM iou_entries WHERE trip_id = ?1"
        ))
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        let mut entries: Vec<_> = rows.iter().map(iou_from_row).collect();
        sort_ious(&mut entries);
        Ok(entries)
    }

    pub async fn iou(&self, iou_id: &str) -> Result<Option<IouEntry>, AppError> {
        let row = sqlx::query(&format!("SELECT {IOU_COLUMNS} FROM iou_entries WHERE id = ?1"))
            .bind(iou_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.as_ref().map(iou_from_row))
    }

    pub async fn save_iou(&self, entry: &IouEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO iou_entries (id, trip_id, owner_id, debtor_id, amount, note,
                   created_date, last_modified_date)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(id) DO UPDATE SET
                   owner_id = excluded.owner_id, debtor_id = excluded.debtor_id,
                   amount = excluded.amount, note = excluded.note,
                   last_modified_date = excluded.last_modified_date"#,
        )
        .bind(&entry.id)
        .bind(&entry.trip_id)
        .bind(&entry.owner_id)
        .bind(&entry.debtor_id)
        .bind(entry.amount)
        .bind(&entry.note)
        .bind(entry.created_date)
        .bind(entry.last_modified_date)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn delete_iou(&self, iou_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM iou_entries WHERE id = ?1")
            .bind(iou_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    // member profiles

    pub async fn members(&self, user_ids: &[String]) -> Result<Vec<TripMember>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT user_id, name, phone_number, notifications_enabled FROM members WHERE user_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in user_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");
        let members = query
            .build_query_as::<TripMember>()
            .fetch_all(&self.db)
            .await?;
        Ok(members)
    }

    pub async fn save_member(&self, member: &TripMember) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO members (user_id, name, phone_number, notifications_enabled)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(user_id) DO UPDATE SET
                   name = excluded.name, phone_number = excluded.phone_number,
                   notifications_enabled = excluded.notifications_enabled"#,
        )
        .bind(&member.user_id)
        .bind(&member.name)
        .bind(&member.phone_number)
        .bind(member.notifications_enabled)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    // notifications

    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO notifications (id, user_id, trip_id, title, body, created_at, read)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.trip_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.created_at)
        .bind(notification.read)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        let items = sqlx::query_as::<_, Notification>(
            "SELECT id, user_id, trip_id, title, body, created_at, read FROM notifications \
             WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // event reminders

    pub async fn replace_reminders(
        &self,
        event_id: &str,
        trip_id: &str,
        fire_times: &[(i64, DateTime<Utc>)],
    ) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM event_reminders WHERE event_id = ?1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        for (slot, fire_at) in fire_times {
            sqlx::query(
                "INSERT INTO event_reminders (event_id, trip_id, slot, fire_at, delivered) \
                 VALUES (?1, ?2, ?3, ?4, 0)",
            )
            .bind(event_id)
            .bind(trip_id)
            .bind(*slot)
            .bind(*fire_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn reminders_for(&self, event_id: &str) -> Result<Vec<EventReminder>, AppError> {
        let items = sqlx::query_as::<_, EventReminder>(
            "SELECT event_id, trip_id, slot, fire_at, delivered FROM event_reminders \
             WHERE event_id = ?1 ORDER BY slot",
        )
        .bind(event_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn delete_reminders(&self, event_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM event_reminders WHERE event_id = ?1")
            .bind(event_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<EventReminder>, AppError> {
        let items = sqlx::query_as::<_, EventReminder>(
            "SELECT event_id, trip_id, slot, fire_at, delivered FROM event_reminders \
             WHERE delivered = 0 AND fire_at <= ?1 ORDER BY fire_at",
        )
        .bind(now)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn mark_reminder_delivered(&self, event_id: &str, slot: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE event_reminders SET delivered = 1 WHERE event_id = ?1 AND slot = ?2")
            .bind(event_id)
            .bind(slot)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn coordinate_from_row(row: &SqliteRow) -> Option<Coordinate> {
    Coordinate::from_parts(row.get("latitude"), row.get("longitude"))
}

fn trip_from_row(row: &SqliteRow) -> Result<Trip, AppError> {
    let member_ids: String = row.get("member_ids");
    Ok(Trip {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
        coordinate: coordinate_from_row(row),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        owner_id: row.get("owner_id"),
        member_ids: serde_json::from_str(&member_ids)?,
        invite_code: row.get("invite_code"),
        created_at: row.get("created_at"),
    })
}

fn event_from_row(row: &SqliteRow) -> Result<ItineraryEvent, AppError> {
    Ok(ItineraryEvent {
        id: row.get("id"),
        trip_id: row.get("trip_id"),
        name: row.get("name"),
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        location: row.get("location"),
        coordinate: coordinate_from_row(row),
        notes: row.get("notes"),
        created_by: row.get("created_by"),
    })
}

fn todo_from_row(row: &SqliteRow) -> Result<TodoItem, AppError> {
    let completed_by: String = row.get("completed_by");
    Ok(TodoItem {
        id: row.get("id"),
        trip_id: row.get("trip_id"),
        title: row.get("title"),
        completed_by: serde_json::from_str(&completed_by)?,
        created_by: row.get("created_by"),
    })
}

fn ticket_from_row(row: &SqliteRow) -> TicketDocument {
    TicketDocument {
        id: row.get("id"),
        trip_id: row.get("trip_id"),
        file_name: row.get("file_name"),
        content_type: row.get("content_type"),
        file_kind: FileKind::parse(row.get("file_kind")),
        size_bytes: row.get("size_bytes"),
        uploaded_by: row.get("uploaded_by"),
        upload_date: row.get("upload_date"),
        file_url: row.get("file_url"),
    }
}

fn iou_from_row(row: &SqliteRow) -> IouEntry {
    IouEntry {
        id: row.get("id"),
        trip_id: row.get("trip_id"),
        owner_id: row.get("owner_id"),
        debtor_id: row.get("debtor_id"),
        amount: row.get("amount"),
        note: row.get("note"),
        created_date: row.get("created_date"),
        last_modified_date: row.get("last_modified_date"),
    }
}
