// POST /validate — run one request through the decision pipeline.
//
// Always 200 with a decision body, blocked or not. Only malformed JSON
// (missing or mistyped fields) is rejected before reaching the engine,
// by axum's Json extractor.
//
// If the caller disconnects mid-request, hyper drops this future and the
// in-flight classifier call goes with it.

use axum::extract::State;
use axum::Json;

use crate::pipeline::{ValidationDecision, ValidationRequest};
use crate::web::AppState;

pub async fn validate_content(
    State(state): State<AppState>,
    Json(request): Json<ValidationRequest>,
) -> Json<ValidationDecision> {
    Json(state.engine.decide(&request).await)
}
