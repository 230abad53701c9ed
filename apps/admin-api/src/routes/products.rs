//! Catalog. Anyone may read; writes need an admin session.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use facturo_core::validation::validate_product;
use facturo_core::{Product, ProductInput};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    category: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db.products().list(query.category.as_deref()).await?;
    Ok(Json(products))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    state.policy.require_admin(&user.principal, "manage products")?;
    validate_product(&input)?;

    let product = state.db.products().create(input).await?;
    info!(id = %product.id, by = %user.principal.uid, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    state.policy.require_admin(&user.principal, "manage products")?;
    validate_product(&input)?;

    let product = state.db.products().update(&id, input).await?;
    info!(id = %product.id, by = %user.principal.uid, "Product updated");
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.policy.require_admin(&user.principal, "manage products")?;

    state.db.products().delete(&id).await?;
    info!(id = %id, by = %user.principal.uid, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
