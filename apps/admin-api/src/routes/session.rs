//! Sign-up, sign-in and sign-out.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use facturo_core::Customer;

use crate::auth::{expired_session_cookie, session_cookie};
use crate::error::ApiResult;
use crate::identity::{SignInRequest, SignupRequest};
use crate::routes::me::MeResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: MeResponse,
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.identity.sign_up(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Sets the HttpOnly `session` cookie and also returns the token for
/// clients that prefer a bearer header.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.identity.sign_in(req).await?;
    let lifetime = state.identity.session_lifetime_secs();
    let cookie = session_cookie(&session.token, lifetime, state.secure_cookies);

    let body = SessionResponse {
        token: session.token,
        expires_in: lifetime,
        user: MeResponse::new(session.customer, &session.principal),
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

/// Tokens are stateless; signing out only expires the cookie.
pub async fn sign_out(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, expired_session_cookie(state.secure_cookies))],
    )
}
