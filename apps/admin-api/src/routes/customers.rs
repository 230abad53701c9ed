//! Customer management.
//!
//! Listing, role changes and deletes are admin-only. A customer may view
//! and edit their own record; admins may view and edit any.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use facturo_core::validation::validate_profile;
use facturo_core::{CoreError, Customer, ProfileUpdate, Role};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Customer>>> {
    state.policy.require_admin(&user.principal, "list customers")?;
    Ok(Json(state.db.customers().list().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    ensure_can_view(&state, &user, &id)?;
    Ok(Json(load(&state, &id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Customer>> {
    ensure_can_view(&state, &user, &id)?;
    validate_profile(&update)?;

    let customer = state.db.customers().update_profile(&id, update).await?;
    Ok(Json(customer))
}

pub async fn set_role(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<RoleUpdate>,
) -> ApiResult<Json<Customer>> {
    state
        .policy
        .require_admin(&user.principal, "change customer roles")?;
    let target = load(&state, &id).await?;
    state
        .policy
        .authorize_role_change(&user.principal, &target, update.role)?;

    let customer = state.db.customers().set_role(&id, update.role).await?;
    info!(
        id = %id,
        role = update.role.as_str(),
        by = %user.principal.uid,
        "Customer role changed"
    );
    Ok(Json(customer))
}

/// Removes the record together with its credentials and saved cart.
/// Invoices stay and show a placeholder customer.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.policy.require_admin(&user.principal, "delete customers")?;
    let target = load(&state, &id).await?;
    state
        .policy
        .authorize_customer_delete(&user.principal, &target)?;

    state.db.customers().delete(&id).await?;
    info!(id = %id, by = %user.principal.uid, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_can_view(state: &AppState, user: &CurrentUser, id: &str) -> ApiResult<()> {
    if state.policy.can_view_customer(&user.principal, id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            action: "view other customers".to_string(),
        }
        .into())
    }
}

async fn load(state: &AppState, id: &str) -> ApiResult<Customer> {
    state
        .db
        .customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}
