use std::sync::Arc;

use async_trait::async_trait;
use autocat_core::{ListingQuery, ListingResult, Product, ProductCategory, TaxonomyNode};
use autocat_engine::{CatalogEngine, EngineConfig};
use autocat_source::{Freshness, ModelKey, ProductIndex, SourceError, TaxonomySource};
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use super::*;

#[derive(Default)]
struct StubCatalog {
    down: bool,
}

fn outage() -> SourceError {
    SourceError::UnexpectedStatus {
        status: 503,
        url: "http://upstream.test".to_string(),
    }
}

fn stub_product(article: &str, path: &str) -> Product {
    Product {
        article: article.to_string(),
        brand: "BMW".to_string(),
        model: "X5".to_string(),
        category: vec!["Spoilers".to_string()],
        path: path.to_string(),
        ..Product::default()
    }
}

#[async_trait]
impl TaxonomySource for StubCatalog {
    async fn car_categories(&self, _f: Freshness) -> Result<Vec<TaxonomyNode>, SourceError> {
        if self.down {
            return Err(outage());
        }
        Ok(vec![TaxonomyNode {
            name: "BMW".into(),
            indexable: true,
            children: vec![TaxonomyNode {
                name: "X5".into(),
                ..TaxonomyNode::default()
            }],
            ..TaxonomyNode::default()
        }])
    }

    async fn product_categories(&self, _f: Freshness) -> Result<Vec<ProductCategory>, SourceError> {
        Ok(vec![ProductCategory {
            name: "Spoilers".to_string(),
            ..ProductCategory::default()
        }])
    }

    async fn model_categories(
        &self,
        _key: &ModelKey,
        _f: Freshness,
    ) -> Result<Vec<String>, SourceError> {
        Err(outage())
    }
}

#[async_trait]
impl ProductIndex for StubCatalog {
    async fn products_with_meta(
        &self,
        _query: &ListingQuery,
        _f: Freshness,
    ) -> Result<ListingResult, SourceError> {
        Ok(ListingResult {
            items: vec![stub_product("ART1", "/item/art1")],
            total: 1,
        })
    }

    async fn product(&self, identifier: &str, _f: Freshness) -> Result<Option<Product>, SourceError> {
        if self.down {
            return Err(outage());
        }
        Ok(match identifier {
            "ART1" => Some(stub_product("ART1", "/item/art1")),
            "ART 2" => Some(stub_product("ART 2", "/item/art-2")),
            "OLD" => Some(stub_product("OLD", "/legacy/old")),
            "ART%202" => Some(stub_product("ART%202", "/item/literal-percent")),
            "OFFSITE" => Some(stub_product("OFFSITE", "//evil.example/phish")),
            _ => None,
        })
    }
}

fn app(down: bool) -> Router {
    let stub = Arc::new(StubCatalog { down });
    build_app(AppState {
        engine: CatalogEngine::new(stub.clone(), stub, EngineConfig::default()),
    })
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[test]
fn api_error_not_found_maps_to_404() {
    let response = ApiError::new("req-1", "not_found", "missing").into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn api_error_unknown_code_maps_to_500() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_sets_generated_request_id() {
    let response = get(app(false), "/api/v1/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("x-request-id header");
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"].as_str(), Some(header_id.as_str()));
}

#[tokio::test]
async fn supplied_request_id_is_echoed() {
    let response = app(false)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
}

#[tokio::test]
async fn catalog_page_tolerates_malformed_pagination() {
    let response = get(app(false), "/catalog?page=abc&perPage=999").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let listing = &json["data"]["listing"];
    assert_eq!(listing["page"], 1);
    assert_eq!(listing["per_page"], 24);
    assert_eq!(listing["total"], 1);
    assert!(listing["next_href"].is_null());
    assert_eq!(json["data"]["brands"][0]["label"], "BMW");
}

#[tokio::test]
async fn model_page_lowercases_path_and_survives_hint_failure() {
    let response = get(app(false), "/catalog/BMW/X5?pcat=Spoilers").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let data = &json["data"];
    assert_eq!(data["brand"]["slug"], "bmw");
    assert_eq!(data["model"]["slug"], "x5");
    assert_eq!(data["active_category"], "Spoilers");
    assert_eq!(data["category_hints"].as_array().map(Vec::len), Some(0));
    assert_eq!(data["meta"]["robots"]["index"], false);
    assert_eq!(data["meta"]["robots"]["follow"], true);
}

#[tokio::test]
async fn upstream_outage_is_internal_error() {
    let response = get(app(true), "/catalog/bmw").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "internal_error");
}

#[tokio::test]
async fn composite_product_link_redirects_permanently() {
    let response = get(app(false), "/product/blue-spoiler--ART1").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("/item/art1"));
}

#[tokio::test]
async fn composite_product_outside_detail_prefix_is_404() {
    let response = get(app(false), "/product/OLD").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn identifier_link_is_decoded_once() {
    let response = get(app(false), "/p/ART%202/some-slug").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("/item/art-2"));

    let legacy = get(app(false), "/p/OLD/x").await;
    assert_eq!(location(&legacy), Some("/legacy/old"));
}

#[tokio::test]
async fn escaped_percent_is_not_decoded_twice() {
    let response = get(app(false), "/p/ART%25202/x").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("/item/literal-percent"));
}

#[tokio::test]
async fn protocol_relative_product_path_is_not_followed() {
    let response = get(app(false), "/p/OFFSITE/x").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(location(&response).is_none());
}

#[tokio::test]
async fn lookup_failure_is_500_not_404() {
    let response = get(app(true), "/p/ART1/x").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn category_pages_redirect_to_catalog_filter() {
    let response = get(app(false), "/category/Body%20Kits").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("/catalog?pcat=body%20kits"));
}
