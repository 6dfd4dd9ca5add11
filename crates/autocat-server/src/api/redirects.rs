//! Permanent redirects for retired storefront URLs.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use autocat_engine::{category_redirect, RedirectOutcome};

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, AppState};

/// Bytes that cannot appear verbatim in a `Location` header value.
const LOCATION: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>');

fn moved_permanently(target: &str) -> Response {
    let encoded = utf8_percent_encode(target, LOCATION).to_string();
    match HeaderValue::from_str(&encoded) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response(),
        Err(e) => {
            tracing::error!(location = %target, error = %e, "unusable redirect target");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The `article` segment exactly as sent, still percent-encoded. Both
/// redirect routes put it second (`/product/{article}`, `/p/{article}/..`);
/// the engine decodes it once.
fn raw_article(uri: &Uri) -> &str {
    uri.path().split('/').nth(2).unwrap_or_default()
}

fn into_response(req_id: RequestId, outcome: RedirectOutcome) -> Response {
    match outcome {
        RedirectOutcome::Permanent(path) => moved_permanently(&path),
        RedirectOutcome::NotFound => {
            ApiError::not_found(req_id.0, "product not found").into_response()
        }
    }
}

/// `GET /product/{article}`, where `article` may be a `"{text}--{code}"` slug.
pub(super) async fn product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let raw = raw_article(&uri);
    let outcome = state
        .engine
        .resolve_composite(raw)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    Ok(into_response(req_id, outcome))
}

/// `GET /p/{article}/{slug}`; the trailing slug is decorative.
pub(super) async fn product_by_identifier(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    uri: Uri,
) -> Result<Response, ApiError> {
    let raw = raw_article(&uri);
    let outcome = state
        .engine
        .resolve_by_identifier(raw)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    Ok(into_response(req_id, outcome))
}

/// `GET /category/{slug}` → `/catalog?pcat={slug}`.
pub(super) async fn category(Path(slug): Path<String>) -> Response {
    moved_permanently(&category_redirect(&slug))
}
