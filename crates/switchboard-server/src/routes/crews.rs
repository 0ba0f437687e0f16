use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use switchboard::crew::{CrewOutput, CrewSpec};

#[derive(Debug, Default, Deserialize)]
struct KickoffRequest {
    #[serde(default)]
    inputs: HashMap<String, String>,
}

async fn list() -> Json<Vec<&'static str>> {
    Json(CrewSpec::bundled_names())
}

async fn kickoff(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<KickoffRequest>,
) -> Result<Json<CrewOutput>, StatusCode> {
    let spec = CrewSpec::bundled(&name).map_err(|_| StatusCode::NOT_FOUND)?;
    let output = state
        .services
        .crew_runner()
        .kickoff(&spec, &request.inputs)
        .await
        .map_err(|e| {
            tracing::error!("Crew {} failed: {:#}", name, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(output))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/crews", get(list))
        .route("/crews/:name", post(kickoff))
        .with_state(state)
}
