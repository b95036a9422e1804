mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{TestApp, CHILD};

async fn create_movie(app: &TestApp, token: &str, body: Value) -> Value {
    let (status, movie) = app.post("/api/v1/movies/", Some(token), body).await;
    assert_eq!(status, StatusCode::CREATED);
    movie
}

#[tokio::test]
async fn movie_is_created_with_nested_category() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    let movie = create_movie(
        &app,
        &token,
        json!({
            "title": "O Lobo de Wall Street",
            "rating": 5,
            "censure": 18,
            "like": true,
            "category": { "title": "Drama" }
        }),
    )
    .await;

    assert_eq!(movie["category"]["title"], "Drama");

    let (_, categories) = app.get("/api/v1/categories/", Some(&token)).await;
    assert_eq!(categories.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn lorem_title_is_a_non_field_error() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    let (status, body) = app
        .post(
            "/api/v1/movies/",
            Some(&token),
            json!({ "title": "Lorem", "rating": 1, "like": false }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["non_field_errors"][0], "Lorem não pode.");
}

#[tokio::test]
async fn missing_required_fields_are_reported_per_field() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    let (status, body) = app
        .post("/api/v1/movies/", Some(&token), json!({ "title": "Matrix", "like": true }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["rating"][0], "Este campo é obrigatório.");
}

#[tokio::test]
async fn child_is_blocked_on_detail_but_not_on_list() {
    let app = TestApp::new();
    let (_, adult) = app.user("adulto", &[]).await;
    let (_, child) = app.user("crianca", &[CHILD]).await;

    let censured = create_movie(
        &app,
        &adult,
        json!({ "title": "Coringa", "rating": 4, "censure": 14, "like": true }),
    )
    .await;
    let free = create_movie(
        &app,
        &adult,
        json!({ "title": "Toy Story", "rating": 5, "censure": 0, "like": true }),
    )
    .await;

    let (_, listed) = app.get("/api/v1/movies/", Some(&child)).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let uri = format!("/api/v1/movies/{}/", censured["id"]);
    let (status, body) = app.get(&uri, Some(&child)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Este filme não é permitido para este perfil.");

    let (status, body) = app.patch(&uri, Some(&child), json!({ "rating": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Você não tem permissão para Editar.");
    assert_eq!(body["detail"], "Este filme não é permitido para este perfil.");

    let uri = format!("/api/v1/movies/{}/", free["id"]);
    let (status, _) = app.get(&uri, Some(&child)).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/movies/{}/", censured["id"]);
    let (status, _) = app.get(&uri, Some(&adult)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn good_movies_are_rated_four_or_more() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    for (title, rating) in [("Ótimo", 5), ("Bom", 4), ("Fraco", 3)] {
        create_movie(&app, &token, json!({ "title": title, "rating": rating, "like": true })).await;
    }

    let (status, good) = app.get("/api/v1/movies/get_good_movies/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = good
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Ótimo", "Bom"]);
}

#[tokio::test]
async fn update_creates_category_when_movie_had_none() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    let movie = create_movie(&app, &token, json!({ "title": "Matrix", "rating": 5, "like": true })).await;
    assert_eq!(movie["category"], Value::Null);

    let uri = format!("/api/v1/movies/{}/", movie["id"]);
    let (status, updated) = app
        .patch(&uri, Some(&token), json!({ "category": { "title": "Ficção" }, "like": false }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["category"]["title"], "Ficção");
    assert_eq!(updated["like"], false);
    assert_eq!(updated["title"], "Matrix");
}

#[tokio::test]
async fn movies_cannot_be_deleted_even_if_missing() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    let (status, body) = app.delete("/api/v1/movies/999/", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Você não tem permissão para Deletar.");
    assert_eq!(body["detail"], "Nenhum registro pode ser deletado.");
}

#[tokio::test]
async fn category_crud() {
    let app = TestApp::new();
    let (_, token) = app.user("jordan", &[]).await;

    let (status, category) = app
        .post("/api/v1/categories/", Some(&token), json!({ "title": "Terror" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/categories/{}/", category["id"]);
    let (_, renamed) = app.put(&uri, Some(&token), json!({ "title": "Suspense" })).await;
    assert_eq!(renamed["title"], "Suspense");

    let (status, _) = app.delete(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
