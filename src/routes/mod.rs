pub mod api;
pub mod public;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let max_ticket_bytes = state.config.max_ticket_bytes;
    Router::new()
        .merge(public::router(max_ticket_bytes))
        .nest("/api", api::router(max_ticket_bytes))
        .nest_service("/static", ServeDir::new("static"))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
