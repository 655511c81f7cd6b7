use std::collections::HashMap;

use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::PrivateCookieJar;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    models::{
        calculator::format_number,
        event::EventDraft,
        iou::IouDraft,
        member::ProfileDraft,
        trip::{Trip, TripDraft},
        Coordinate,
    },
    routes::api::read_ticket_upload,
    state::AppState,
};

pub fn router(max_ticket_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/profile", post(profile_submit))
        .route("/join", post(join_submit))
        .route("/trips", post(trip_create))
        .route("/trips/:id", get(trip_page))
        .route("/trips/:id/edit", post(trip_edit))
        .route("/trips/:id/delete", post(trip_delete))
        .route("/trips/:id/leave", post(trip_leave))
        .route("/trips/:id/events", post(event_create))
        .route("/trips/:id/events/:event_id/delete", post(event_delete))
        .route("/trips/:id/todos", post(todo_create))
        .route("/trips/:id/todos/:todo_id/toggle", post(todo_toggle))
        .route("/trips/:id/todos/:todo_id/delete", post(todo_delete))
        .route("/trips/:id/note", post(note_submit))
        .route(
            "/trips/:id/tickets",
            post(ticket_upload).layer(DefaultBodyLimit::max(max_ticket_bytes + 64 * 1024)),
        )
        .route("/trips/:id/tickets/:ticket_id/delete", post(ticket_delete))
        .route("/trips/:id/ious", post(iou_create))
        .route("/trips/:id/ious/:iou_id/delete", post(iou_delete))
        .route("/notifications/:id/read", post(notification_read))
}

fn trip_url(trip_id: &str) -> Redirect {
    Redirect::to(&format!("/trips/{trip_id}"))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn format_amount(amount: f64) -> String {
    format!("${amount:.2}")
}

// home

struct TripSummary {
    id: String,
    name: String,
    location: String,
    dates: String,
    member_count: usize,
}

struct NotificationRow {
    id: String,
    title: String,
    body: String,
    when: String,
    read: bool,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    user_id: String,
    profile_name: String,
    phone_number: String,
    notifications_enabled: bool,
    trips: Vec<TripSummary>,
    notifications: Vec<NotificationRow>,
    show_error: bool,
    error_message: String,
    invite_code: String,
}

async fn home(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    let (jar, user_id) = auth::ensure_identity(&current, jar);
    let page = render_home(&state, &user_id, None, String::new()).await?;
    Ok((jar, page).into_response())
}

async fn render_home(
    state: &AppState,
    user_id: &str,
    error: Option<String>,
    invite_code: String,
) -> Result<Response, AppError> {
    let profile = state.trips.profile(user_id).await?;
    let trips = state
        .trips
        .list_trips(user_id)
        .await?
        .into_iter()
        .map(|trip| TripSummary {
            dates: format!(
                "{} - {}",
                format_date(trip.start_date),
                format_date(trip.end_date)
            ),
            member_count: trip.member_ids.len(),
            id: trip.id,
            name: trip.name,
            location: trip.location,
        })
        .collect();
    let notifications = state
        .trips
        .notifications_for(user_id)
        .await?
        .into_iter()
        .map(|notification| NotificationRow {
            id: notification.id,
            title: notification.title,
            body: notification.body,
            when: notification.created_at.format("%b %-d, %H:%M").to_string(),
            read: notification.read,
        })
        .collect();

    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    let template = HomeTemplate {
        user_id: user_id.to_string(),
        profile_name: profile.name,
        phone_number: profile.phone_number,
        notifications_enabled: profile.notifications_enabled,
        trips,
        notifications,
        show_error: error.is_some(),
        error_message: error.unwrap_or_default(),
        invite_code,
    };
    Ok((status, AskamaTemplateResponse::into_response(template)).into_response())
}

#[derive(Deserialize)]
struct ProfileForm {
    name: String,
    #[serde(default)]
    phone_number: String,
    notifications_enabled: Option<String>,
}

async fn profile_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let user_id = current.require_user()?;
    let draft = ProfileDraft {
        name: form.name,
        phone_number: form.phone_number,
        notifications_enabled: form.notifications_enabled.is_some(),
    };
    match state.trips.upsert_profile(user_id, draft).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(AppError::BadRequest(msg)) => render_home(&state, user_id, Some(msg), String::new()).await,
        Err(err) => Err(err),
    }
}

#[derive(Deserialize)]
struct JoinForm {
    invite_code: String,
}

async fn join_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<JoinForm>,
) -> Result<Response, AppError> {
    let user_id = current.require_user()?;
    match state.trips.join_by_invite_code(user_id, &form.invite_code).await {
        Ok(trip) => Ok(trip_url(&trip.id).into_response()),
        Err(AppError::BadRequest(msg)) | Err(AppError::Conflict(msg)) => {
            render_home(&state, user_id, Some(msg), form.invite_code).await
        }
        Err(err) => Err(err),
    }
}

#[serde_as]
#[derive(Deserialize)]
struct TripForm {
    name: String,
    #[serde(default)]
    location: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    latitude: Option<f64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    longitude: Option<f64>,
}

impl From<TripForm> for TripDraft {
    fn from(form: TripForm) -> Self {
        TripDraft {
            name: form.name,
            location: form.location,
            coordinate: Coordinate::from_parts(form.latitude, form.longitude),
            start_date: form.start_date,
            end_date: form.end_date,
        }
    }
}

async fn trip_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let user_id = current.require_user()?;
    match state.trips.create_trip(user_id, form.into()).await {
        Ok(trip) => Ok(trip_url(&trip.id).into_response()),
        Err(AppError::BadRequest(msg)) => render_home(&state, user_id, Some(msg), String::new()).await,
        Err(err) => Err(err),
    }
}

// trip page

struct MemberRow {
    user_id: String,
    name: String,
    is_owner: bool,
    is_me: bool,
}

struct EventRow {
    id: String,
    name: String,
    when: String,
    location: String,
    notes: String,
}

struct TodoRow {
    id: String,
    title: String,
    done_by_me: bool,
    fully_completed: bool,
    pending: String,
}

struct TicketRow {
    id: String,
    file_name: String,
    kind: String,
    url: String,
    size: String,
}

struct IouRow {
    id: String,
    summary: String,
    note: String,
}

struct TotalRow {
    name: String,
    amount: String,
}

#[derive(Template)]
#[template(path = "trip.html")]
struct TripTemplate {
    trip_id: String,
    name: String,
    location: String,
    start_value: String,
    end_value: String,
    dates: String,
    invite_code: String,
    share_message: String,
    is_owner: bool,
    members: Vec<MemberRow>,
    events: Vec<EventRow>,
    todos: Vec<TodoRow>,
    note: String,
    note_updated: String,
    tickets: Vec<TicketRow>,
    ious: Vec<IouRow>,
    totals: Vec<TotalRow>,
}

async fn trip_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = current.require_user()?;
    let overview = state.trips.overview(user_id, &id).await?;
    let trip: Trip = overview.trip;

    let names: HashMap<&str, &str> = overview
        .members
        .iter()
        .map(|member| (member.user_id.as_str(), member.name.as_str()))
        .collect();
    let name_of = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    let todos = overview
        .todos
        .iter()
        .map(|view| TodoRow {
            id: view.todo.id.clone(),
            title: view.todo.title.clone(),
            done_by_me: view.todo.is_completed_by(user_id),
            fully_completed: view.fully_completed,
            pending: view
                .pending_members
                .iter()
                .map(|id| name_of(id))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    let ious = overview
        .ious
        .iter()
        .map(|entry| IouRow {
            id: entry.id.clone(),
            summary: format!(
                "{} owes {} {}",
                name_of(&entry.debtor_id),
                name_of(&entry.owner_id),
                format_amount(entry.amount)
            ),
            note: entry.note.clone().unwrap_or_default(),
        })
        .collect();
    let totals = overview
        .totals
        .iter()
        .map(|total| TotalRow {
            name: total.name.clone(),
            amount: format_amount(total.total_owed),
        })
        .collect();
    let members = overview
        .members
        .iter()
        .map(|member| MemberRow {
            is_owner: trip.is_owner(&member.user_id),
            is_me: member.user_id == user_id,
            user_id: member.user_id.clone(),
            name: member.name.clone(),
        })
        .collect();
    let events = overview
        .events
        .into_iter()
        .map(|event| EventRow {
            when: format!(
                "{} {}",
                format_date(event.date),
                event.time.format("%H:%M")
            ),
            id: event.id,
            name: event.name,
            location: event.location,
            notes: event.notes,
        })
        .collect();
    let tickets = overview
        .tickets
        .into_iter()
        .map(|ticket| TicketRow {
            size: format!("{} KB", format_number(ticket.size_bytes as f64 / 1024.0)),
            kind: ticket.file_kind.to_string(),
            id: ticket.id,
            file_name: ticket.file_name,
            url: ticket.file_url,
        })
        .collect();

    Ok(AskamaTemplateResponse::into_response(TripTemplate {
        trip_id: trip.id.clone(),
        share_message: trip.share_message(),
        is_owner: trip.is_owner(user_id),
        start_value: trip.start_date.to_string(),
        end_value: trip.end_date.to_string(),
        dates: format!(
            "{} - {}",
            format_date(trip.start_date),
            format_date(trip.end_date)
        ),
        name: trip.name,
        location: trip.location,
        invite_code: trip.invite_code,
        members,
        events,
        todos,
        note: overview.note.content,
        note_updated: overview
            .note
            .last_modified_date
            .format("%b %-d, %H:%M")
            .to_string(),
        tickets,
        ious,
        totals,
    }))
}

async fn trip_edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<TripForm>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.update_trip(user_id, &id, form.into()).await?;
    Ok(trip_url(&id))
}

async fn trip_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_trip(user_id, &id).await?;
    Ok(Redirect::to("/"))
}

async fn trip_leave(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.remove_member(user_id, &id, user_id).await?;
    Ok(Redirect::to("/"))
}

// itinerary

#[serde_as]
#[derive(Deserialize)]
struct EventForm {
    name: String,
    date: NaiveDate,
    time: NaiveTime,
    #[serde(default)]
    location: String,
    #[serde(default)]
    notes: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    latitude: Option<f64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    longitude: Option<f64>,
}

async fn event_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<EventForm>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    let draft = EventDraft {
        name: form.name,
        date: form.date,
        time: form.time,
        location: form.location,
        coordinate: Coordinate::from_parts(form.latitude, form.longitude),
        notes: form.notes,
    };
    state.trips.create_event(user_id, &id, draft).await?;
    Ok(trip_url(&id))
}

async fn event_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, event_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_event(user_id, &id, &event_id).await?;
    Ok(trip_url(&id))
}

// to-dos

#[derive(Deserialize)]
struct TodoForm {
    title: String,
}

async fn todo_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.create_todo(user_id, &id, &form.title).await?;
    Ok(trip_url(&id))
}

async fn todo_toggle(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, todo_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.toggle_todo(user_id, &id, &todo_id).await?;
    Ok(trip_url(&id))
}

async fn todo_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, todo_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_todo(user_id, &id, &todo_id).await?;
    Ok(trip_url(&id))
}

// notes

#[derive(Deserialize)]
struct NoteForm {
    #[serde(default)]
    content: String,
}

async fn note_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.save_note(user_id, &id, form.content).await?;
    Ok(trip_url(&id))
}

// tickets

async fn ticket_upload(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    let upload = read_ticket_upload(multipart).await?;
    state
        .trips
        .upload_ticket(
            user_id,
            &id,
            &upload.file_name,
            &upload.content_type,
            &upload.data,
        )
        .await?;
    Ok(trip_url(&id))
}

async fn ticket_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, ticket_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_ticket(user_id, &id, &ticket_id).await?;
    Ok(trip_url(&id))
}

// IOUs

#[derive(Deserialize)]
struct IouForm {
    owner_id: String,
    debtor_id: String,
    amount: f64,
    #[serde(default)]
    note: String,
}

async fn iou_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<IouForm>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    let draft = IouDraft {
        id: None,
        owner_id: form.owner_id,
        debtor_id: form.debtor_id,
        amount: form.amount,
        note: Some(form.note),
    };
    state.trips.save_iou(user_id, &id, draft).await?;
    Ok(trip_url(&id))
}

async fn iou_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, iou_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_iou(user_id, &id, &iou_id).await?;
    Ok(trip_url(&id))
}

async fn notification_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let user_id = current.require_user()?;
    state.trips.mark_notification_read(user_id, &id).await?;
    Ok(Redirect::to("/"))
}
