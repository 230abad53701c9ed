//! Request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use facturo_core::{Customer, Principal};

use crate::auth::{extract_bearer_token, session_from_cookie_header, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

/// The signed-in caller. Rejects with 401 when there is no valid session.
///
/// The token comes from `Authorization: Bearer` first, then the `session`
/// cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub principal: Principal,
    pub customer: Customer,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AuthError::MissingSession)?;
        let (principal, customer) = state.identity.authenticate(&token).await?;
        Ok(CurrentUser {
            principal,
            customer,
        })
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token);

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_from_cookie_header)
        .map(str::to_string)
}
