use std::{fmt, net::SocketAddr, time::Duration};

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use tripboard::{
    config::AppConfig,
    db::{init_pool, run_migrations},
    error::AppError,
    models::{
        event::EventDraft,
        invite,
        iou::IouDraft,
        member::ProfileDraft,
        note::TripNote,
        trip::{Trip, TripDraft},
    },
    services::{manager::TripManager, store::TripStore},
    state::AppState,
};
use url::Url;

const MAX_TICKET_BYTES: usize = 1024;
const NOTE_SAVE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, cucumber::World, Default)]
struct TripWorld {
    state: Option<TestState>,
    trip_id: Option<String>,
    todo_id: Option<String>,
    event_id: Option<String>,
    ticket_id: Option<String>,
    last_error: Option<String>,
}

impl TripWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn trips(&self) -> &TripManager {
        &self.app_state().trips
    }

    fn store(&self) -> TripStore {
        TripStore::new(self.app_state().db.clone())
    }

    fn trip_id(&self) -> String {
        self.trip_id.clone().expect("a trip must exist first")
    }

    async fn trip(&self) -> Trip {
        let trip_id = self.trip_id();
        self.store()
            .trip(&trip_id)
            .await
            .expect("load trip")
            .expect("trip exists")
    }

    fn record<T>(&mut self, result: Result<T, AppError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                None
            }
        }
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let files_root = root.path().join("files");
        let db_path = root.path().join("bdd.sqlite");

        let config = AppConfig {
            database_url: format!("sqlite://{}", db_path.to_string_lossy()),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            files_root,
            public_base_url: Url::parse("http://127.0.0.1:3000/")?,
            cookie_secret: "bdd-cookie-secret".into(),
            note_save_debounce: NOTE_SAVE_DELAY,
            reminder_poll_interval: Duration::from_secs(60),
            max_ticket_bytes: MAX_TICKET_BYTES,
        };

        let db = init_pool(&config.database_url).await?;
        run_migrations(&db).await?;

        let app = AppState::new(config, db);
        app.files.ensure_structure().await?;
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

fn date(raw: &str) -> NaiveDate {
    raw.parse().expect("date in YYYY-MM-DD form")
}

#[given("a fresh trip board")]
async fn given_fresh_board(world: &mut TripWorld) {
    *world = TripWorld {
        state: Some(TestState::new().await.expect("state")),
        ..TripWorld::default()
    };
}

// trips

#[given(regex = r#"^"([^"]+)" created a trip "([^"]+)" from "([^"]+)" to "([^"]+)"$"#)]
async fn given_trip(world: &mut TripWorld, owner: String, name: String, start: String, end: String) {
    let draft = TripDraft {
        name,
        location: "Somewhere".into(),
        coordinate: None,
        start_date: date(&start),
        end_date: date(&end),
    };
    let trip = world
        .trips()
        .create_trip(&owner, draft)
        .await
        .expect("create trip");
    world.trip_id = Some(trip.id);
}

#[given(regex = r#"^"([^"]+)" joins with the invite code$"#)]
async fn given_joined(world: &mut TripWorld, user: String) {
    join_with_code(world, user).await;
}

#[when(regex = r#"^"([^"]+)" joins with the invite code$"#)]
async fn join_with_code(world: &mut TripWorld, user: String) {
    let code = world.trip().await.invite_code;
    let result = world.trips().join_by_invite_code(&user, &code).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" joins with invite code "([^"]+)"$"#)]
async fn join_with_given_code(world: &mut TripWorld, user: String, code: String) {
    let result = world.trips().join_by_invite_code(&user, &code).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" deletes the trip$"#)]
async fn delete_trip(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    let result = world.trips().delete_trip(&user, &trip_id).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" leaves the trip$"#)]
async fn leave_trip(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    let result = world.trips().remove_member(&user, &trip_id, &user).await;
    world.record(result);
}

#[given(regex = r#"^"([^"]+)" refreshes the trip$"#)]
async fn refresh_trip(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    world
        .trips()
        .refresh_trip(&user, &trip_id)
        .await
        .expect("refresh trip");
}

#[then(regex = r"^the trip has (\d+) members$")]
async fn trip_member_count(world: &mut TripWorld, expected: usize) {
    assert_eq!(world.trip().await.member_ids.len(), expected);
}

#[then(regex = r#"^"([^"]+)" has (\d+) trips$"#)]
async fn user_trip_count(world: &mut TripWorld, user: String, expected: usize) {
    let trips = world.trips().list_trips(&user).await.expect("list trips");
    assert_eq!(trips.len(), expected);
}

#[then("the invite code is 6 characters from the invite alphabet")]
async fn invite_code_format(world: &mut TripWorld) {
    let code = world.trip().await.invite_code;
    assert_eq!(code.len(), invite::CODE_LEN);
    assert!(code.bytes().all(|b| invite::ALPHABET.contains(&b)));
    assert!(invite::is_valid(&code));
}

#[then("looking up the invite code in lowercase finds the trip")]
async fn invite_code_round_trip(world: &mut TripWorld) {
    let trip = world.trip().await;
    let found = world
        .trips()
        .find_by_invite_code(&format!("  {} ", trip.invite_code.to_lowercase()))
        .await
        .expect("lookup")
        .expect("trip found by code");
    assert_eq!(found.id, trip.id);
}

#[then("the share message mentions the invite code")]
async fn share_message(world: &mut TripWorld) {
    let trip = world.trip().await;
    let message = world
        .trips()
        .share_message(&trip.owner_id, &trip.id)
        .await
        .expect("share message");
    assert!(message.contains(&format!("Use invite code: {}", trip.invite_code)));
    assert!(message.contains(&trip.name));
}

#[then(regex = r#"^"([^"]+)" cannot read the trip$"#)]
async fn cannot_read(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    let result = world.trips().get_trip(&user, &trip_id).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[then(regex = r#"^the last action failed with "([^"]+)"$"#)]
async fn last_action_failed(world: &mut TripWorld, message: String) {
    assert_eq!(world.last_error.as_deref(), Some(message.as_str()));
}

#[then("the last action failed")]
async fn last_action_failed_somehow(world: &mut TripWorld) {
    assert!(world.last_error.is_some(), "expected the last action to fail");
}

#[given("the database refuses to delete notifications")]
async fn block_notification_deletes(world: &mut TripWorld) {
    sqlx::query(
        "CREATE TRIGGER keep_notifications BEFORE DELETE ON notifications \
         BEGIN SELECT RAISE(ABORT, 'notifications are locked'); END",
    )
    .execute(&world.app_state().db)
    .await
    .expect("create trigger");
}

#[then("the trip is still stored")]
async fn trip_still_stored(world: &mut TripWorld) {
    let trip_id = world.trip_id();
    assert!(world.store().trip(&trip_id).await.expect("trip").is_some());
}

#[given(regex = r#"^a stale note "([^"]*)" is cached for the trip$"#)]
async fn cache_stale_note(world: &mut TripWorld, content: String) {
    let trip_id = world.trip_id();
    world
        .trips()
        .cache()
        .set_note(TripNote::with_content(&trip_id, "alice", content))
        .await;
}

#[then("the cached note is gone")]
async fn cached_note_gone(world: &mut TripWorld) {
    let trip_id = world.trip_id();
    assert!(world.trips().cache().note(&trip_id).await.is_none());
}

// offline reads

#[when("the database goes offline")]
async fn database_offline(world: &mut TripWorld) {
    world.app_state().db.close().await;
}

#[then(regex = r#"^"([^"]+)" still sees (\d+) events, (\d+) todos, (\d+) tickets and (\d+) IOUs from the cache$"#)]
async fn reads_from_cache(
    world: &mut TripWorld,
    user: String,
    events: usize,
    todos: usize,
    tickets: usize,
    ious: usize,
) {
    let trip_id = world.trip_id();
    let trips = world.trips();
    let trip = trips.get_trip(&user, &trip_id).await.expect("cached trip");
    assert_eq!(trip.id, trip_id);
    let listed = trips.events(&user, &trip_id).await.expect("cached events");
    assert_eq!(listed.len(), events);
    let listed = trips.todos(&user, &trip_id).await.expect("cached todos");
    assert_eq!(listed.len(), todos);
    let listed = trips.tickets(&user, &trip_id).await.expect("cached tickets");
    assert_eq!(listed.len(), tickets);
    let listed = trips.ious(&user, &trip_id).await.expect("cached ious");
    assert_eq!(listed.len(), ious);
    let members = trips.members(&user, &trip_id).await.expect("cached members");
    assert_eq!(members.len(), trip.member_ids.len());
}

#[when(regex = r#"^"([^"]+)" tries to add a todo "([^"]+)"$"#)]
async fn try_add_todo(world: &mut TripWorld, user: String, title: String) {
    let trip_id = world.trip_id();
    let result = world.trips().create_todo(&user, &trip_id, &title).await;
    world.record(result);
}

#[then("the cache holds nothing for the trip")]
async fn cache_is_empty(world: &mut TripWorld) {
    let trip_id = world.trip_id();
    let cache = world.trips().cache();
    assert!(cache.trip(&trip_id).await.is_none());
    assert!(!cache.has_bundle(&trip_id).await);
    assert!(cache.events(&trip_id).await.is_empty());
    assert!(cache.todos(&trip_id).await.is_empty());
    assert!(cache.note(&trip_id).await.is_none());
    assert!(cache.tickets(&trip_id).await.is_empty());
    assert!(cache.ious(&trip_id).await.is_empty());
}

#[then("the database holds nothing for the trip")]
async fn database_is_empty(world: &mut TripWorld) {
    let trip_id = world.trip_id();
    let store = world.store();
    assert!(store.trip(&trip_id).await.expect("trip").is_none());
    assert!(store.events(&trip_id).await.expect("events").is_empty());
    assert!(store.todos(&trip_id).await.expect("todos").is_empty());
    assert!(store.note(&trip_id).await.expect("note").is_none());
    assert!(store.tickets(&trip_id).await.expect("tickets").is_empty());
    assert!(store.ious(&trip_id).await.expect("ious").is_empty());
    let ticket_dir = world
        .app_state()
        .files
        .root()
        .join("tickets")
        .join(&trip_id);
    assert!(!ticket_dir.exists());
}

// to-dos

#[given(regex = r#"^"([^"]+)" added a todo "([^"]+)"$"#)]
async fn add_todo(world: &mut TripWorld, user: String, title: String) {
    let trip_id = world.trip_id();
    let todo = world
        .trips()
        .create_todo(&user, &trip_id, &title)
        .await
        .expect("create todo");
    world.todo_id = Some(todo.todo.id);
}

#[given(regex = r#"^"([^"]+)" toggles the todo$"#)]
async fn given_toggled(world: &mut TripWorld, user: String) {
    toggle_todo(world, user).await;
}

#[when(regex = r#"^"([^"]+)" toggles the todo$"#)]
async fn toggle_todo(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    let todo_id = world.todo_id.clone().expect("a todo must exist first");
    world
        .trips()
        .toggle_todo(&user, &trip_id, &todo_id)
        .await
        .expect("toggle todo");
}

async fn current_todo(world: &TripWorld) -> tripboard::models::todo::TodoView {
    let trip = world.trip().await;
    let todo_id = world.todo_id.clone().expect("a todo must exist first");
    world
        .trips()
        .todos(&trip.owner_id, &trip.id)
        .await
        .expect("list todos")
        .into_iter()
        .find(|view| view.todo.id == todo_id)
        .expect("todo listed")
}

#[then("the todo is fully completed")]
async fn todo_complete(world: &mut TripWorld) {
    let view = current_todo(world).await;
    assert!(view.fully_completed);
    assert!(view.pending_members.is_empty());
}

#[then("the todo is not fully completed")]
async fn todo_incomplete(world: &mut TripWorld) {
    assert!(!current_todo(world).await.fully_completed);
}

#[then(regex = r#"^the todo is pending for "([^"]+)"$"#)]
async fn todo_pending_for(world: &mut TripWorld, user: String) {
    let view = current_todo(world).await;
    assert!(view.pending_members.contains(&user));
}

// itinerary

#[when(regex = r#"^"([^"]+)" added an event "([^"]+)" on "([^"]+)" at "([^"]+)"$"#)]
async fn when_add_event(world: &mut TripWorld, user: String, name: String, on: String, at: String) {
    add_event(world, user, name, on, at).await;
}

#[given(regex = r#"^"([^"]+)" added an event "([^"]+)" on "([^"]+)" at "([^"]+)"$"#)]
async fn add_event(world: &mut TripWorld, user: String, name: String, on: String, at: String) {
    let trip_id = world.trip_id();
    let draft = EventDraft {
        name,
        date: date(&on),
        time: NaiveTime::parse_from_str(&at, "%H:%M").expect("time in HH:MM form"),
        location: "Centro".into(),
        coordinate: None,
        notes: String::new(),
    };
    let event = world
        .trips()
        .create_event(&user, &trip_id, draft)
        .await
        .expect("create event");
    world.event_id = Some(event.id);
}

#[when(regex = r#"^"([^"]+)" deletes the event$"#)]
async fn delete_event(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    let event_id = world.event_id.clone().expect("an event must exist first");
    world
        .trips()
        .delete_event(&user, &trip_id, &event_id)
        .await
        .expect("delete event");
}

#[then(regex = r#"^the itinerary is "([^"]+)"$"#)]
async fn itinerary_order(world: &mut TripWorld, expected: String) {
    let trip = world.trip().await;
    let events = world
        .trips()
        .events(&trip.owner_id, &trip.id)
        .await
        .expect("list events");
    let names: Vec<_> = events.iter().map(|event| event.name.as_str()).collect();
    assert_eq!(names.join(", "), expected);
}

#[then(regex = r"^the event has (\d+) scheduled reminders$")]
async fn reminder_count(world: &mut TripWorld, expected: usize) {
    let event_id = world.event_id.clone().expect("an event must exist first");
    let reminders = world
        .store()
        .reminders_for(&event_id)
        .await
        .expect("list reminders");
    assert_eq!(reminders.len(), expected);
}

#[then(regex = r"^the event has (\d+) undelivered reminders$")]
async fn undelivered_count(world: &mut TripWorld, expected: usize) {
    let event_id = world.event_id.clone().expect("an event must exist first");
    let reminders = world
        .store()
        .reminders_for(&event_id)
        .await
        .expect("list reminders");
    let pending = reminders.iter().filter(|r| !r.delivered).count();
    assert_eq!(pending, expected);
}

async fn deliver_reminders_at(world: &TripWorld, offset: chrono::Duration) {
    let event_id = world.event_id.clone().expect("an event must exist first");
    let event = world
        .store()
        .event(&event_id)
        .await
        .expect("load event")
        .expect("event exists");
    world
        .trips()
        .notifier()
        .deliver_due(event.starts_at() + offset)
        .await
        .expect("deliver reminders");
}

#[when(regex = r"^reminders are delivered (\d+) minutes before the event$")]
async fn deliver_before(world: &mut TripWorld, minutes: i64) {
    deliver_reminders_at(world, -chrono::Duration::minutes(minutes)).await;
}

#[when(regex = r"^reminders are delivered (\d+) minutes after the event starts$")]
async fn deliver_after(world: &mut TripWorld, minutes: i64) {
    deliver_reminders_at(world, chrono::Duration::minutes(minutes)).await;
}

#[then(regex = r#"^"([^"]+)" has (\d+) reminders? for "([^"]+)"$"#)]
async fn reminder_notifications(world: &mut TripWorld, user: String, expected: usize, name: String) {
    let title = format!("Upcoming: {name}");
    let notifications = world
        .trips()
        .notifications_for(&user)
        .await
        .expect("list notifications");
    let found = notifications.iter().filter(|n| n.title == title).count();
    assert_eq!(found, expected, "reminders in {notifications:?}");
}

// notifications

#[given(regex = r#"^"([^"]+)" turned notifications off$"#)]
async fn mute(world: &mut TripWorld, user: String) {
    let draft = ProfileDraft {
        name: user.clone(),
        phone_number: String::new(),
        notifications_enabled: false,
    };
    world
        .trips()
        .upsert_profile(&user, draft)
        .await
        .expect("save profile");
}

#[then(regex = r#"^"([^"]+)" has a notification "([^"]+)"$"#)]
async fn has_notification(world: &mut TripWorld, user: String, body: String) {
    let notifications = world
        .trips()
        .notifications_for(&user)
        .await
        .expect("list notifications");
    assert!(
        notifications
            .iter()
            .any(|n| n.body == body && n.title == "Trip Update"),
        "no notification {body:?} in {notifications:?}"
    );
}

#[then(regex = r#"^"([^"]+)" has no notification "([^"]+)"$"#)]
async fn lacks_notification(world: &mut TripWorld, user: String, body: String) {
    let notifications = world
        .trips()
        .notifications_for(&user)
        .await
        .expect("list notifications");
    assert!(notifications.iter().all(|n| n.body != body));
}

#[then(regex = r#"^"([^"]+)" has (\d+) notifications$"#)]
async fn notification_count(world: &mut TripWorld, user: String, expected: usize) {
    let notifications = world
        .trips()
        .notifications_for(&user)
        .await
        .expect("list notifications");
    assert_eq!(notifications.len(), expected);
}

// IOUs

#[given(regex = r#"^"([^"]+)" records owing "([^"]+)" (-?[\d.]+)$"#)]
async fn given_iou(world: &mut TripWorld, debtor: String, owner: String, amount: f64) {
    record_iou(world, debtor, owner, amount).await;
}

#[when(regex = r#"^"([^"]+)" records owing "([^"]+)" (-?[\d.]+)$"#)]
async fn record_iou(world: &mut TripWorld, debtor: String, owner: String, amount: f64) {
    let trip_id = world.trip_id();
    let draft = IouDraft {
        id: None,
        owner_id: owner,
        debtor_id: debtor.clone(),
        amount,
        note: None,
    };
    let result = world.trips().save_iou(&debtor, &trip_id, draft).await;
    world.record(result);
}

#[then(regex = r#"^the IOU totals are "([^"]+)"$"#)]
async fn iou_totals(world: &mut TripWorld, expected: String) {
    let trip = world.trip().await;
    let totals = world
        .trips()
        .iou_totals(&trip.owner_id, &trip.id)
        .await
        .expect("iou totals");
    let rendered: Vec<_> = totals
        .iter()
        .map(|total| format!("{}={:.2}", total.member_id, total.total_owed))
        .collect();
    assert_eq!(rendered.join(", "), expected);
}

// notes

async fn assert_note(world: &TripWorld, user: &str, expected: &str) {
    let trip_id = world.trip_id();
    let note = world.trips().note(user, &trip_id).await.expect("read note");
    assert_eq!(note.content, expected);
}

#[then(regex = r#"^"([^"]+)" reads the note "([^"]*)"$"#)]
async fn reads_note(world: &mut TripWorld, user: String, expected: String) {
    assert_note(world, &user, &expected).await;
}

#[when(regex = r#"^"([^"]+)" types the note drafts (.+)$"#)]
async fn type_drafts(world: &mut TripWorld, user: String, drafts: String) {
    let trip_id = world.trip_id();
    for draft in drafts.split(", ") {
        world
            .trips()
            .schedule_note_save(&user, &trip_id, draft.trim_matches('"').to_string())
            .await
            .expect("schedule note save");
    }
    assert!(world.trips().note_save_pending(&trip_id).await);
}

#[then(regex = r#"^after the save delay "([^"]+)" reads the note "([^"]*)"$"#)]
async fn reads_note_after_delay(world: &mut TripWorld, user: String, expected: String) {
    tokio::time::sleep(NOTE_SAVE_DELAY * 6).await;
    assert_note(world, &user, &expected).await;
}

// tickets

#[given(regex = r#"^"([^"]+)" uploads a ticket "([^"]+)" of type "([^"]+)" with (\d+) bytes$"#)]
async fn given_ticket(
    world: &mut TripWorld,
    user: String,
    file_name: String,
    content_type: String,
    size: usize,
) {
    upload_ticket(world, user, file_name, content_type, size).await;
}

#[when(regex = r#"^"([^"]+)" uploads a ticket "([^"]+)" of type "([^"]+)" with (\d+) bytes$"#)]
async fn upload_ticket(
    world: &mut TripWorld,
    user: String,
    file_name: String,
    content_type: String,
    size: usize,
) {
    let trip_id = world.trip_id();
    let data = vec![7u8; size];
    let result = world
        .trips()
        .upload_ticket(&user, &trip_id, &file_name, &content_type, &data)
        .await;
    if let Some(ticket) = world.record(result) {
        world.ticket_id = Some(ticket.id);
    }
}

#[when(regex = r#"^"([^"]+)" uploads a ticket named with (\d+) "([^"]+)" characters and extension "([^"]+)"$"#)]
async fn upload_long_named_ticket(
    world: &mut TripWorld,
    user: String,
    repeat: usize,
    ch: String,
    ext: String,
) {
    let file_name = format!("{}.{ext}", ch.repeat(repeat));
    upload_ticket(world, user, file_name, "application/pdf".into(), 64).await;
}

#[then(regex = r#"^the ticket name is at most (\d+) bytes and ends with "([^"]+)"$"#)]
async fn ticket_name_shape(world: &mut TripWorld, max: usize, suffix: String) {
    let trip = world.trip().await;
    let ticket_id = world.ticket_id.clone().expect("a ticket must exist first");
    let tickets = world
        .trips()
        .tickets(&trip.owner_id, &trip.id)
        .await
        .expect("list tickets");
    let ticket = tickets
        .iter()
        .find(|ticket| ticket.id == ticket_id)
        .expect("ticket listed");
    assert!(ticket.file_name.len() <= max, "{}", ticket.file_name);
    assert!(ticket.file_name.ends_with(&suffix));
}

#[when(regex = r#"^"([^"]+)" deletes the ticket$"#)]
async fn delete_ticket(world: &mut TripWorld, user: String) {
    let trip_id = world.trip_id();
    let ticket_id = world.ticket_id.clone().expect("a ticket must exist first");
    world
        .trips()
        .delete_ticket(&user, &trip_id, &ticket_id)
        .await
        .expect("delete ticket");
}

#[then(regex = r"^the trip has (\d+) tickets$")]
async fn ticket_count(world: &mut TripWorld, expected: usize) {
    let trip = world.trip().await;
    let tickets = world
        .trips()
        .tickets(&trip.owner_id, &trip.id)
        .await
        .expect("list tickets");
    assert_eq!(tickets.len(), expected);
}

#[then(regex = r#"^"([^"]+)" can download the ticket with (\d+) bytes$"#)]
async fn download_ticket(world: &mut TripWorld, user: String, expected: usize) {
    let trip_id = world.trip_id();
    let ticket_id = world.ticket_id.clone().expect("a ticket must exist first");
    let (ticket, data) = world
        .trips()
        .ticket_file(&user, &trip_id, &ticket_id)
        .await
        .expect("download ticket");
    assert_eq!(data.len(), expected);
    assert_eq!(ticket.size_bytes as usize, expected);
    assert!(ticket.file_url.ends_with(&format!(
        "/api/trips/{trip_id}/tickets/{ticket_id}/file"
    )));
}

#[tokio::main]
async fn main() {
    TripWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
