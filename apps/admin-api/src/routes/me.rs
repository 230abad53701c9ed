use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use facturo_core::validation::validate_profile;
use facturo_core::{Customer, Principal, ProfileUpdate, Role};

use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::state::AppState;

/// The stored profile plus the role the session actually acts with, which
/// differs from `profile.role` for the configured admin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub profile: Customer,
    pub role: Role,
    pub is_admin: bool,
}

impl MeResponse {
    pub fn new(profile: Customer, principal: &Principal) -> Self {
        MeResponse {
            profile,
            role: principal.role,
            is_admin: principal.is_admin(),
        }
    }
}

pub async fn get_me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse::new(user.customer, &user.principal))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<MeResponse>> {
    validate_profile(&update)?;
    let profile = state
        .db
        .customers()
        .update_profile(&user.principal.uid, update)
        .await?;
    Ok(Json(MeResponse::new(profile, &user.principal)))
}
