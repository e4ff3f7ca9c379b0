//! Training API handlers (admin only)

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::session::AdminUser;
use super::{ApiMessage, AppState};
use crate::training::TrainingStatus;

#[derive(Deserialize)]
pub(crate) struct StartRequest {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    epochs: Option<u32>,
}

pub(crate) async fn start(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<StartRequest>,
) -> Json<ApiMessage> {
    match state.training.start(req.kind.as_deref(), req.epochs).await {
        Ok(()) => Json(ApiMessage::ok("Training started")),
        Err(e) => Json(ApiMessage::err(e.to_string())),
    }
}

pub(crate) async fn status(State(state): State<AppState>, _admin: AdminUser) -> Json<TrainingStatus> {
    Json(state.training.status())
}

pub(crate) async fn stop(State(state): State<AppState>, _admin: AdminUser) -> Json<ApiMessage> {
    state.training.stop().await;
    Json(ApiMessage::ok("Training stopped"))
}
