mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use ritten::{config::AppConfig, routes::create_router, state::AppState};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "ritten-test-boundary";

fn app() -> Router {
    create_router(AppState::new(AppConfig::default()))
}

fn upload_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/xml\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Uploads the standard 45-trip fixture and returns its session id.
async fn upload_fixture(app: &Router) -> String {
    let document = common::trip_log(45, 3, "Amsterdam");
    let response = send(app, upload_request("file", "ritten.xml", document.as_bytes())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "ritten.xml");
    assert_eq!(body["totalRecords"], 45);
    assert!(body["uploadedAt"].is_string());
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn upload_then_page_through() {
    let app = app();
    let id = upload_fixture(&app).await;

    let body = json_body(send(&app, get(&format!("/api/data/{id}?page=1&perPage=20"))).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 20);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["perPage"], 20);
    assert_eq!(body["pagination"]["total"], 45);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["sessionInfo"]["filename"], "ritten.xml");
    assert_eq!(body["sessionInfo"]["totalRecords"], 45);

    let first = &body["data"][0];
    assert_eq!(first["id"], "1");
    assert_eq!(first["type"], "Prive");
    assert!(first["price"].is_null());
    assert!(first["startLocation"].is_null());

    let body = json_body(send(&app, get(&format!("/api/data/{id}?page=3"))).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][4]["id"], "45");

    let body = json_body(send(&app, get(&format!("/api/data/{id}?page=4"))).await).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn search_filters_before_paginating() {
    let app = app();
    let id = upload_fixture(&app).await;

    let body = json_body(send(&app, get(&format!("/api/data/{id}?search=AMSTERDAM"))).await).await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let body = json_body(send(&app, get(&format!("/api/data/{id}?search=&per_page=50"))).await).await;
    assert_eq!(body["pagination"]["total"], 45);
    assert_eq!(body["pagination"]["perPage"], 50);
    assert_eq!(body["data"].as_array().unwrap().len(), 45);
}

#[tokio::test]
async fn rejects_invalid_paging() {
    let app = app();
    let id = upload_fixture(&app).await;

    let response = send(&app, get(&format!("/api/data/{id}?page=0"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = send(&app, get(&format!("/api/data/{id}?perPage=0"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_strings_get_a_json_error() {
    let app = app();
    let id = upload_fixture(&app).await;

    for query in ["page=abc", "perPage=-3"] {
        let response = send(&app, get(&format!("/api/data/{id}?{query}"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Ongeldige zoekparameters"), "{error}");
    }

    let response = send(
        &app,
        get("/api/data/9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d?page=abc"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Sessie niet gevonden");
}

#[tokio::test]
async fn upload_without_multipart_body_gets_a_json_error() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, "application/xml")
        .body(Body::from(common::trip_log(2, 0, "x")))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Ongeldige upload"), "{error}");
}

#[tokio::test]
async fn download_exports_whole_session() {
    let app = app();
    let id = upload_fixture(&app).await;
    send(&app, get(&format!("/api/data/{id}?search=amsterdam&page=1"))).await;

    let response = send(&app, get(&format!("/api/download/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"ritten_output.xlsx\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(common::xlsx_data_rows(&bytes), 45);
    let strings = common::xlsx_shared_strings(&bytes);
    assert!(strings.contains("Rit ID"));
    assert!(strings.contains("Longitude Eind"));
    assert!(!strings.contains("null"));
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let app = app();
    for uri in [
        "/api/data/9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
        "/api/download/9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
        "/api/data/not-a-session",
    ] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json_body(response).await["error"], "Sessie niet gevonden");
    }
}

#[tokio::test]
async fn upload_validation_failures() {
    let app = app();

    let response = send(&app, upload_request("file", "ritten.csv", b"a,b,c")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Alleen XML bestanden zijn toegestaan"
    );

    let response = send(&app, upload_request("document", "ritten.xml", b"<x/>")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Geen bestand gevonden");

    let response = send(&app, upload_request("file", "", b"<x/>")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Geen bestand geselecteerd");

    let response = send(&app, upload_request("file", "kapot.xml", b"<Ritten><Rit>")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("XML parsing error"), "{error}");

    let body = json_body(send(&app, get("/api/sessions")).await).await;
    assert!(body["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_and_delete_sessions() {
    let app = app();
    let id = upload_fixture(&app).await;

    let body = json_body(send(&app, get("/api/sessions")).await).await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["sessionId"], id.as_str());
    assert_eq!(sessions[0]["totalRecords"], 45);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/sessions/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, delete).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "Sessie verwijderd");

    let response = send(&app, get(&format!("/api/data/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, get(&format!("/api/download/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
