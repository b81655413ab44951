//! End-to-end tests of the `/api` routes against the in-memory store

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use collage_studio::config::{StoreBackend, StoreConfig};
use collage_studio::layout::LayoutRegistry;
use collage_studio::server::{router, AppState};
use collage_studio::store::{MemoryStore, StoreCall, StoreOperation};

const BOUNDARY: &str = "collage-test-boundary";

enum Part<'a> {
    Text(&'a str, String),
    File(&'a str, &'a str, Vec<u8>),
}

fn multipart(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: image/jpeg\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn side_by_side_parts() -> Vec<Part<'static>> {
    vec![
        Part::Text("layout", json!({"width": 800, "height": 400}).to_string()),
        Part::Text("layout-2-image-0", json!({"width": 400, "height": 400, "x": 0, "y": 0}).to_string()),
        Part::File("layout-2-image-0", "left.jpg", vec![0xAA; 32]),
        Part::Text("layout-2-image-1", json!({"width": 400, "height": 400, "x": 400, "y": 0}).to_string()),
        Part::File("layout-2-image-1", "right.jpg", vec![0xBB; 32]),
    ]
}

fn app(store: &Arc<MemoryStore>) -> Router {
    let config = StoreConfig {
        backend: StoreBackend::Memory,
        ..StoreConfig::default()
    };
    let state = AppState::new(Arc::new(LayoutRegistry::builtin()), store.clone(), &config);
    router(Arc::new(state), 1024 * 1024)
}

fn post_images(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/images")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn post_side_by_side_collage() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(app(&store), post_images(multipart(&side_by_side_parts()))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Success");
    assert_eq!(body["result"]["width"], 800);
    assert_eq!(body["result"]["height"], 400);
    assert_eq!(body["result"]["folder"], "photo-collages");

    let calls = store.calls();
    assert_eq!(calls.len(), 4);
    let mut uploaded = Vec::new();
    for call in &calls[..2] {
        match call {
            StoreCall::Upload { id: Some(id), overlays, .. } if overlays.is_empty() => uploaded.push(id.clone()),
            other => panic!("expected a section upload, got {other:?}"),
        }
    }
    match &calls[2] {
        StoreCall::Upload { overlays, folder, .. } => {
            assert_eq!(overlays.len(), 2);
            assert_eq!(folder.as_deref(), Some("photo-collages"));
        }
        other => panic!("expected the compose upload, got {other:?}"),
    }
    assert_eq!(calls[3], StoreCall::Delete { ids: uploaded });
}

#[tokio::test]
async fn post_structured_manifest() {
    let store = Arc::new(MemoryStore::new());
    let manifest = json!({
        "layout": {"id": 2, "width": 800, "height": 400},
        "sections": [
            {"section_index": 0, "section": {"width": 400, "height": 400, "x": 0, "y": 0}, "file_ref": "left"},
            {"section_index": 1, "section": {"width": 400, "height": 400, "x": 400, "y": 0}, "file_ref": "right"}
        ]
    });
    let parts = vec![
        Part::Text("manifest", manifest.to_string()),
        Part::File("right", "right.jpg", vec![2; 16]),
        Part::File("left", "left.jpg", vec![1; 16]),
    ];

    let (status, _) = send(app(&store), post_images(multipart(&parts))).await;
    assert_eq!(status, StatusCode::CREATED);

    // Manifest order decides upload order, not part order
    let uploads = store.uploads();
    assert_eq!(uploads[0].file_name, "left.jpg");
    assert_eq!(uploads[1].file_name, "right.jpg");
}

#[tokio::test]
async fn second_upload_failure_returns_400_without_compose() {
    let store = Arc::new(MemoryStore::new());
    store.fail_on(StoreOperation::Upload, 2);

    let (status, body) = send(app(&store), post_images(multipart(&side_by_side_parts()))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error");
    assert_eq!(body["error"]["kind"], "store");
    assert!(body["error"]["details"].is_object());

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| matches!(call, StoreCall::Upload { overlays, .. } if overlays.is_empty())));

    // Known gap: the first upload is not cleaned up
    assert_eq!(store.asset_ids(), vec!["asset-1".to_string()]);
}

#[tokio::test]
async fn malformed_layout_is_a_400() {
    let store = Arc::new(MemoryStore::new());
    let mut parts = side_by_side_parts();
    parts[0] = Part::Text("layout", "{\"width\": 800".to_string());

    let (status, body) = send(app(&store), post_images(multipart(&parts))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_request");
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn non_multipart_post_is_a_400() {
    let store = Arc::new(MemoryStore::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/images")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(app(&store), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error");
}

#[tokio::test]
async fn empty_gallery() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(app(&store), request("GET", "/api/images")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Success", "result": []}));
}

#[tokio::test]
async fn gallery_lists_new_collage_only() {
    let store = Arc::new(MemoryStore::new());
    let (_, created) = send(app(&store), post_images(multipart(&side_by_side_parts()))).await;
    let (status, body) = send(app(&store), request("GET", "/api/images")).await;

    assert_eq!(status, StatusCode::OK);
    let result = body["result"].as_array().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0]["public_id"], created["result"]["public_id"]);
}

#[tokio::test]
async fn gallery_store_failure_is_a_400() {
    let store = Arc::new(MemoryStore::new());
    store.fail_on(StoreOperation::List, 1);

    let (status, body) = send(app(&store), request("GET", "/api/images")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "store");
}

#[tokio::test]
async fn unsupported_methods_are_405() {
    for method in ["PUT", "DELETE", "PATCH"] {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(app(&store), request(method, "/api/images")).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(body, json!({"message": "Method not allowed"}));
    }
}

#[tokio::test]
async fn layouts_catalog() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(app(&store), request("GET", "/api/layouts")).await;

    assert_eq!(status, StatusCode::OK);
    let layouts = body["result"].as_array().unwrap();
    assert_eq!(layouts.len(), 6);
    assert_eq!(layouts[1]["id"], 2);
    assert_eq!(layouts[1]["sections"][1], json!({"width": 400, "height": 400, "x": 400, "y": 0}));
}
