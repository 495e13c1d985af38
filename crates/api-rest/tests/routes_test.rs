use api_rest::{router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rfiv_core::{CoreConfig, PatientService, PatientStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

fn test_app_with(require_tag_id: bool) -> Router {
    let cfg = CoreConfig::new(None, Duration::from_secs(5), require_tag_id, 120_000)
        .expect("CoreConfig::new should succeed");
    let service = PatientService::new(Arc::new(cfg), PatientStore::in_memory());
    router(AppState::new(service))
}

fn test_app() -> Router {
    test_app_with(true)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn create(app: &Router, name: &str, id: &str, tag_id: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/v1/patient",
        Some(json!({"name": name, "id": id, "tagId": tag_id})),
    )
    .await
}

#[tokio::test]
async fn test_create_then_fetch_round_trip() {
    let app = test_app();

    let (status, body) = create(&app, "Ann Lee", "p-1", "t-1").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"patient": {"name": "Ann Lee", "id": "p-1", "tagId": "t-1", "locations": []}})
    );
}

#[tokio::test]
async fn test_create_strips_markup() {
    let app = test_app();
    create(&app, "<script>x</script>Ann", "p-1", "t-1").await;

    let (_, body) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(body["patient"]["name"], "xAnn");
}

#[tokio::test]
async fn test_create_validation_names_the_field() {
    let app = test_app();

    let (status, body) = send(&app, "POST", "/v1/patient", Some(json!({"id": "p-1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "\"name\" is required"}));

    let (status, body) = send(
        &app,
        "POST",
        "/v1/patient",
        Some(json!({"name": "Ann", "id": "p-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "\"tagId\" is required"}));
}

#[tokio::test]
async fn test_create_without_tag_when_optional() {
    let app = test_app_with(false);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/patient",
        Some(json!({"name": "Ann", "id": "p-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(body["patient"]["tagId"], Value::Null);
}

#[tokio::test]
async fn test_create_malformed_json_is_bad_request() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/patient")
                .header("Content-Type", "application/json")
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_id_and_tag_are_reported_distinctly() {
    let app = test_app();
    create(&app, "Ann", "p-1", "t-1").await;

    let (status, id_conflict) = create(&app, "Bob", "p-1", "t-2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, tag_conflict) = create(&app, "Bob", "p-2", "t-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id_message = id_conflict["error"].as_str().unwrap();
    let tag_message = tag_conflict["error"].as_str().unwrap();
    assert!(id_message.starts_with("duplicate id"));
    assert!(tag_message.starts_with("duplicate tagId"));
}

#[tokio::test]
async fn test_search_matches_substring_and_echoes_query() {
    let app = test_app();
    create(&app, "Ann Lee", "p-1", "t-1").await;
    create(&app, "Joanna", "p-2", "t-2").await;
    create(&app, "Bob", "p-3", "t-3").await;

    let (status, body) = send(&app, "GET", "/v1/patients?name=ann&id=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], json!({"name": "ann"}));

    let ids: Vec<&str> = body["patients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p-1", "p-2"]);
}

#[tokio::test]
async fn test_search_by_tag_substring() {
    let app = test_app();
    create(&app, "Ann Lee", "p-1", "TAG-001").await;

    let (status, body) = send(&app, "GET", "/v1/patients?tagId=tag-0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patients"][0]["id"], "p-1");
}

#[tokio::test]
async fn test_search_empty_query_is_rejected() {
    let app = test_app();
    create(&app, "Ann Lee", "p-1", "t-1").await;

    let (status, body) = send(&app, "GET", "/v1/patients", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/v1/patients?name=&tagId=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_miss_echoes_query() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/v1/patients?name=zed", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["query"], json!({"name": "zed"}));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_get_unknown_patient() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/v1/patient/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "unknown patient: ghost"}));
}

#[tokio::test]
async fn test_update_patient() {
    let app = test_app();
    create(&app, "Ann", "p-1", "t-1").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/patient/p-1",
        Some(json!({"name": "Ann Lee"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(body["patient"]["name"], "Ann Lee");
    assert_eq!(body["patient"]["tagId"], "t-1");
}

#[tokio::test]
async fn test_update_rejects_empty_patch_and_unknown_id() {
    let app = test_app();
    create(&app, "Ann", "p-1", "t-1").await;

    let (status, _) = send(&app, "PUT", "/v1/patient/p-1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/patient/ghost",
        Some(json!({"name": "Nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_to_taken_tag_leaves_records_unchanged() {
    let app = test_app();
    create(&app, "Ann", "p-1", "t-1").await;
    create(&app, "Bob", "p-2", "t-2").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/patient/p-2",
        Some(json!({"name": "Robert", "tagId": "t-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("duplicate tagId"));

    let (_, bob) = send(&app, "GET", "/v1/patient/p-2", None).await;
    assert_eq!(bob["patient"]["name"], "Bob");
    assert_eq!(bob["patient"]["tagId"], "t-2");
    let (_, ann) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(ann["patient"]["tagId"], "t-1");
}

#[tokio::test]
async fn test_location_admission_over_http() {
    let app = test_app();
    create(&app, "Ann", "p-1", "t-1").await;
    let ping = |timestamp: i64, location: &str| json!({"timestamp": timestamp, "location": location});

    let (status, _) = send(&app, "POST", "/v1/patient/t-1/location", Some(ping(1000, "roomA"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) =
        send(&app, "POST", "/v1/patient/t-1/location", Some(ping(1050, "roomA"))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "POST", "/v1/patient/t-1/location", Some(ping(1010, "roomB"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        send(&app, "POST", "/v1/patient/t-1/location", Some(ping(200_000, "roomB"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(
        body["patient"]["locations"],
        json!([[1000, "roomA"], [1010, "roomB"], [200_000, "roomB"]])
    );
}

#[tokio::test]
async fn test_location_unknown_tag_and_validation() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/patient/ghost/location",
        Some(json!({"timestamp": 1, "location": "roomA"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "unknown tag: ghost"}));

    let (status, body) = send(
        &app,
        "POST",
        "/v1/patient/ghost/location",
        Some(json!({"location": "roomA"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "\"timestamp\" is required"}));

    let (status, _) = send(
        &app,
        "POST",
        "/v1/patient/ghost/location",
        Some(json!({"timestamp": "soon", "location": "roomA"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_overview() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = send(&app, "GET", "/anything/else", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Welcome to the RFIV API page.".into()));
}

#[tokio::test]
async fn test_unsupported_method_answers_with_json_error() {
    let app = test_app();
    create(&app, "Ann", "p-1", "t-1").await;

    let (_, too_soon) = {
        let ping = json!({"timestamp": 1000, "location": "roomA"});
        send(&app, "POST", "/v1/patient/t-1/location", Some(ping.clone())).await;
        send(&app, "POST", "/v1/patient/t-1/location", Some(ping)).await
    };
    let too_soon_message = too_soon["error"].as_str().unwrap().to_string();

    for (method, uri) in [
        ("DELETE", "/v1/patient/p-1"),
        ("GET", "/v1/patient/t-1/location"),
        ("POST", "/v1/patients"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        let message = body["error"].as_str().expect("error message");
        assert!(message.starts_with("Unsupported method"));
        assert_ne!(message, too_soon_message);
    }

    let (_, body) = send(&app, "GET", "/v1/patient/p-1", None).await;
    assert_eq!(body["patient"]["id"], "p-1");
}

#[tokio::test]
async fn test_invalid_path_segment_is_json_bad_request() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/v1/patient/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/v1/patient/%FF/location",
        Some(json!({"timestamp": 1, "location": "roomA"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
