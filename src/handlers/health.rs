use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let depths = state.dispatcher.depths();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "accepting": state.dispatcher.is_accepting(),
            "queues": {
                "discovery": depths.discovery,
                "polling": depths.polling,
            },
            "inFlight": depths.in_flight,
            "UTC_time": chrono::Utc::now().to_rfc2822(),
        })),
    )
}
