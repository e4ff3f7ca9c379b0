//! Camera API handlers

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};

use super::session::AuthUser;
use super::{ApiMessage, AppState};

#[derive(Deserialize)]
pub(crate) struct ConnectRequest {
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    camera_id: u32,
    #[serde(default)]
    url: Option<String>,
}

fn default_kind() -> String {
    "usb".into()
}

pub(crate) async fn connect(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<ConnectRequest>,
) -> Json<ApiMessage> {
    let result = match req.kind.as_str() {
        "ip" => {
            let Some(url) = req.url.filter(|u| !u.is_empty()) else {
                return Json(ApiMessage::err("Missing stream URL"));
            };
            state
                .camera
                .connect_remote(url)
                .await
                .map(|()| "IP camera connected")
        }
        _ => state
            .camera
            .connect_local(req.camera_id)
            .await
            .map(|()| "Camera connected"),
    };

    Json(match result {
        Ok(message) => ApiMessage::ok(message),
        Err(e) => ApiMessage::err(e.to_string()),
    })
}

pub(crate) async fn disconnect(State(state): State<AppState>, _user: AuthUser) -> Json<ApiMessage> {
    state.camera.disconnect().await;
    Json(ApiMessage::ok("Camera disconnected"))
}

pub(crate) async fn frame(State(state): State<AppState>, _user: AuthUser) -> Json<Value> {
    match state.camera.current_frame_jpeg() {
        Some(jpeg) => Json(json!({ "success": true, "frame": BASE64.encode(&jpeg) })),
        None => Json(json!({ "success": false, "message": "No frame available" })),
    }
}

pub(crate) async fn status(State(state): State<AppState>, _user: AuthUser) -> Json<Value> {
    let status = state.camera.status().await;
    Json(json!({ "connected": status.connected, "camera_id": status.source }))
}
