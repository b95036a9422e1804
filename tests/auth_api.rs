mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, SELLER};

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new();

    let (status, registered) = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({ "username": "jordan", "password": "senha-forte", "first_name": "Jordan" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(registered["token"].is_string());

    let (status, logged) = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "username": "jordan", "password": "senha-forte" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = logged["token"].as_str().unwrap().to_string();

    let (status, me) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "jordan");
    assert_eq!(me["roles"], json!([]));
}

#[tokio::test]
async fn duplicated_username_conflicts() {
    let app = TestApp::new();
    let payload = json!({ "username": "jordan", "password": "senha-forte" });

    app.post("/api/v1/auth/register", None, payload.clone()).await;
    let (status, _) = app.post("/api/v1/auth/register", None, payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/v1/auth/register", None, json!({ "username": "jordan", "password": "123" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["password"].is_array());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.post(
        "/api/v1/auth/register",
        None,
        json!({ "username": "jordan", "password": "senha-forte" }),
    )
    .await;

    let (status, _) = app
        .post("/api/v1/auth/login", None, json!({ "username": "jordan", "password": "errada" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_lists_roles_from_groups() {
    let app = TestApp::new();
    let (_, token) = app.user("vendedor", &[SELLER]).await;

    let (_, me) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(me["roles"], json!(["Seller"]));
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, doc) = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/v1/customers/"].is_object());
}
