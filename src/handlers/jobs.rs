use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use super::AppState;
use crate::models::HEALTH_REPLY;

/// Accepts one opaque job payload and answers with its correlated reply.
pub async fn submit_job(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let reply = state.dispatcher.handle(&body).await;
    let content_type = if reply == HEALTH_REPLY {
        "text/plain; charset=utf-8"
    } else {
        "application/json"
    };
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], reply)
}
