//! Session cookie plumbing: login/logout handlers and auth extractors

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::info;

use super::{ApiMessage, AppState};
use crate::auth::SessionUser;

pub(crate) const SESSION_COOKIE: &str = "vigil_session";

/// Extractor granting access to any authenticated session. Rejects with
/// 401 before the handler body runs.
pub struct AuthUser(pub SessionUser);

/// Extractor for admin-only routes. Rejects non-admin sessions with 403.
pub struct AdminUser(pub SessionUser);

pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(ApiMessage::err(self.message))).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            if let Some(user) = state.sessions.get(cookie.value()).await {
                return Ok(AuthUser(user));
            }
        }
        Err(AuthRejection {
            status: StatusCode::UNAUTHORIZED,
            message: "Authentication required",
        })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(AdminUser(user))
        } else {
            Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Admin access required",
            })
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Response {
    match state.credentials.authenticate(&req.username, &req.password) {
        Some(user) => {
            info!(user = %user.username, "login");
            let message = format!("Welcome, {}!", user.username);
            let token = state.sessions.create(user).await;
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .build();
            (jar.add(cookie), Json(ApiMessage::ok(message))).into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::err("Invalid credentials")),
        )
            .into_response(),
    }
}

pub(crate) async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Json(ApiMessage::ok("Logged out"))).into_response()
}
