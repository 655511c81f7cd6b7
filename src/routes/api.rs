//! JSON API used by the mobile clients. Callers identify themselves with the
//! `X-Trip-User` header or the browser cookie.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        calculator::{Calculator, Key},
        event::{EventDraft, ItineraryEvent},
        iou::{IouDraft, IouEntry},
        member::{ProfileDraft, TripMember},
        note::TripNote,
        notification::Notification,
        ticket::TicketDocument,
        todo::TodoView,
        trip::{Trip, TripDraft},
    },
    services::{cache::TripBundle, manager::IouTotal},
    state::AppState,
};

/// Room for multipart framing on top of the ticket itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_ticket_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/me", get(me).put(update_me))
        .route("/notifications", get(notifications))
        .route("/notifications/:id/read", post(mark_read))
        .route("/calculator", post(calculate))
        .route("/join", post(join))
        .route("/invites/:code", get(invite_preview))
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/trips/:id/refresh", post(refresh_trip))
        .route("/trips/:id/share", get(share_trip))
        .route("/trips/:id/members", get(members))
        .route(
            "/trips/:id/members/:member_id",
            axum::routing::delete(remove_member),
        )
        .route("/trips/:id/events", get(list_events).post(create_event))
        .route(
            "/trips/:id/events/:event_id",
            put(update_event).delete(delete_event),
        )
        .route("/trips/:id/todos", get(list_todos).post(create_todo))
        .route(
            "/trips/:id/todos/:todo_id",
            put(update_todo).delete(delete_todo),
        )
        .route("/trips/:id/todos/:todo_id/toggle", post(toggle_todo))
        .route("/trips/:id/note", get(get_note).put(save_note))
        .route("/trips/:id/note/draft", post(note_draft))
        .route(
            "/trips/:id/tickets",
            get(list_tickets).post(upload_ticket).layer(DefaultBodyLimit::max(
                max_ticket_bytes + MULTIPART_OVERHEAD,
            )),
        )
        .route(
            "/trips/:id/tickets/:ticket_id",
            axum::routing::delete(delete_ticket),
        )
        .route("/trips/:id/tickets/:ticket_id/file", get(ticket_file))
        .route("/trips/:id/ious", get(list_ious).post(create_iou))
        .route("/trips/:id/iou-totals", get(iou_totals))
        .route(
            "/trips/:id/ious/:iou_id",
            put(update_iou).delete(delete_iou),
        )
}

// profile and notifications

#[derive(Serialize)]
struct MeResponse {
    user_id: String,
    profile: TripMember,
}

async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    let user_id = current.require_user()?;
    let profile = state.trips.profile(user_id).await?;
    Ok(Json(MeResponse {
        user_id: user_id.to_string(),
        profile,
    }))
}

async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(draft): Json<ProfileDraft>,
) -> Result<Json<TripMember>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.upsert_profile(user_id, draft).await?))
}

async fn notifications(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.notifications_for(user_id).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state.trips.mark_notification_read(user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct CalculatorInput {
    keys: Vec<Key>,
}

#[derive(Serialize)]
struct CalculatorOutput {
    display: String,
}

async fn calculate(Json(input): Json<CalculatorInput>) -> Json<CalculatorOutput> {
    let mut calculator = Calculator::new();
    let display = calculator.press_all(input.keys).to_string();
    Json(CalculatorOutput { display })
}

// trips

#[derive(Deserialize)]
struct JoinRequest {
    invite_code: String,
}

async fn join(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<JoinRequest>,
) -> Result<Json<Trip>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(
        state
            .trips
            .join_by_invite_code(user_id, &request.invite_code)
            .await?,
    ))
}

#[derive(Serialize)]
struct InvitePreview {
    trip_id: String,
    name: String,
    location: String,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    member_count: usize,
}

async fn invite_preview(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(code): Path<String>,
) -> Result<Json<InvitePreview>, AppError> {
    current.require_user()?;
    let trip = state
        .trips
        .find_by_invite_code(&code)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(InvitePreview {
        member_count: trip.member_ids.len(),
        trip_id: trip.id,
        name: trip.name,
        location: trip.location,
        start_date: trip.start_date,
        end_date: trip.end_date,
    }))
}

async fn list_trips(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Trip>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.list_trips(user_id).await?))
}

async fn create_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(draft): Json<TripDraft>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let user_id = current.require_user()?;
    let trip = state.trips.create_trip(user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Trip>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.get_trip(user_id, &id).await?))
}

async fn update_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(draft): Json<TripDraft>,
) -> Result<Json<Trip>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.update_trip(user_id, &id, draft).await?))
}

async fn delete_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_trip(user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Re-reads the trip's itinerary, to-dos, note, tickets and IOUs.
async fn refresh_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TripBundle>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.refresh_trip(user_id, &id).await?))
}

#[derive(Serialize)]
struct ShareResponse {
    message: String,
}

async fn share_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ShareResponse>, AppError> {
    let user_id = current.require_user()?;
    let message = state.trips.share_message(user_id, &id).await?;
    Ok(Json(ShareResponse { message }))
}

async fn members(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TripMember>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.members(user_id, &id).await?))
}

async fn remove_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, member_id)): Path<(String, String)>,
) -> Result<Json<Trip>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(
        state.trips.remove_member(user_id, &id, &member_id).await?,
    ))
}

// itinerary

async fn list_events(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<ItineraryEvent>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.events(user_id, &id).await?))
}

async fn create_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<ItineraryEvent>), AppError> {
    let user_id = current.require_user()?;
    let event = state.trips.create_event(user_id, &id, draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, event_id)): Path<(String, String)>,
    Json(draft): Json<EventDraft>,
) -> Result<Json<ItineraryEvent>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(
        state
            .trips
            .update_event(user_id, &id, &event_id, draft)
            .await?,
    ))
}

async fn delete_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, event_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_event(user_id, &id, &event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// to-dos

#[derive(Deserialize)]
struct TodoInput {
    title: String,
}

async fn list_todos(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TodoView>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.todos(user_id, &id).await?))
}

async fn create_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<TodoInput>,
) -> Result<(StatusCode, Json<TodoView>), AppError> {
    let user_id = current.require_user()?;
    let todo = state.trips.create_todo(user_id, &id, &input.title).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, todo_id)): Path<(String, String)>,
    Json(input): Json<TodoInput>,
) -> Result<Json<TodoView>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(
        state
            .trips
            .update_todo(user_id, &id, &todo_id, &input.title)
            .await?,
    ))
}

async fn toggle_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, todo_id)): Path<(String, String)>,
) -> Result<Json<TodoView>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.toggle_todo(user_id, &id, &todo_id).await?))
}

async fn delete_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, todo_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_todo(user_id, &id, &todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// notes

#[derive(Deserialize)]
struct NoteInput {
    content: String,
}

async fn get_note(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TripNote>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.note(user_id, &id).await?))
}

async fn save_note(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<NoteInput>,
) -> Result<Json<TripNote>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(
        state.trips.save_note(user_id, &id, input.content).await?,
    ))
}

/// Accepts a draft while the user is typing; it is saved once typing pauses.
async fn note_draft(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<NoteInput>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state
        .trips
        .schedule_note_save(user_id, &id, input.content)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

// tickets

pub(crate) struct TicketUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Reads the `file` part of a multipart ticket upload.
pub(crate) async fn read_ticket_upload(mut multipart: Multipart) -> Result<TicketUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("ticket").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        return Ok(TicketUpload {
            file_name,
            content_type,
            data,
        });
    }
    Err(AppError::bad_request("Missing ticket file"))
}

async fn list_tickets(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TicketDocument>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.tickets(user_id, &id).await?))
}

async fn upload_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<TicketDocument>), AppError> {
    let user_id = current.require_user()?;
    let upload = read_ticket_upload(multipart).await?;
    let ticket = state
        .trips
        .upload_ticket(
            user_id,
            &id,
            &upload.file_name,
            &upload.content_type,
            &upload.data,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn delete_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, ticket_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_ticket(user_id, &id, &ticket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ticket_file(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, ticket_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = current.require_user()?;
    let (ticket, data) = state.trips.ticket_file(user_id, &id, &ticket_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, ticket.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", ticket.file_name),
            ),
        ],
        data,
    ))
}

// IOUs

async fn list_ious(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<IouEntry>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.ious(user_id, &id).await?))
}

async fn create_iou(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(mut draft): Json<IouDraft>,
) -> Result<(StatusCode, Json<IouEntry>), AppError> {
    let user_id = current.require_user()?;
    draft.id = None;
    let entry = state.trips.save_iou(user_id, &id, draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_iou(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, iou_id)): Path<(String, String)>,
    Json(mut draft): Json<IouDraft>,
) -> Result<Json<IouEntry>, AppError> {
    let user_id = current.require_user()?;
    draft.id = Some(iou_id);
    Ok(Json(state.trips.save_iou(user_id, &id, draft).await?))
}

async fn delete_iou(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, iou_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user_id = current.require_user()?;
    state.trips.delete_iou(user_id, &id, &iou_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn iou_totals(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<IouTotal>>, AppError> {
    let user_id = current.require_user()?;
    Ok(Json(state.trips.iou_totals(user_id, &id).await?))
}
