// GET /health — liveness probe for load balancers.
//
// Also reports how many users the rate limiter is tracking, which is the
// one piece of state that grows with traffic.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "tracked_users": state.engine.limiter().tracked_users(),
        })),
    )
}
