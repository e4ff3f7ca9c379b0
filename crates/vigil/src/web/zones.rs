//! Zone API handlers

use axum::extract::State;
use axum::Json;
use tracing::error;

use super::session::AuthUser;
use super::{ApiMessage, AppState};
use crate::zones::ZoneSet;

pub(crate) async fn save(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(set): Json<ZoneSet>,
) -> Json<ApiMessage> {
    match state.zones.save(&set).await {
        Ok(()) => Json(ApiMessage::ok("Zones saved")),
        Err(e) => {
            error!(error = %e, "zone save failed");
            Json(ApiMessage::err("Failed to save zones"))
        }
    }
}

pub(crate) async fn load(State(state): State<AppState>, _user: AuthUser) -> Json<ZoneSet> {
    Json(state.zones.load().await)
}
