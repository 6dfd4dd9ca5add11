//! Listing page models for `/catalog`, `/catalog/{brand}` and
//! `/catalog/{brand}/{model}`.
//!
//! Query parameters are taken as raw strings; malformed `page` or `perPage`
//! values fall back to defaults inside the engine instead of rejecting the
//! request.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use autocat_engine::{BrandPage, CatalogPage, ModelPage, PageParams};

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState};

pub(super) async fn catalog_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<CatalogPage>>, ApiError> {
    let data = state
        .engine
        .catalog_page(&params)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn brand_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<BrandPage>>, ApiError> {
    let data = state
        .engine
        .brand_page(&brand, &params)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn model_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((brand, model)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<ModelPage>>, ApiError> {
    let data = state
        .engine
        .model_page(&brand, &model, &params)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
