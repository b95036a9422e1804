#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use scoped_backend::{
    config::AppState,
    db::{MemoryStore, UserRepository},
    models::auth::NewUser,
    routes::build_router,
    services::auth::AuthService,
};

pub const SELLER: &str = "Vendedor";
pub const CHILD: &str = "Infantil";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub auth: AuthService,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), "segredo-de-teste".into()).with_hash_cost(4);
        let state = AppState::with_auth(
            auth.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        Self {
            store,
            auth,
            router: build_router(state),
        }
    }

    /// Cria um usuário nos grupos informados e devolve (id, token).
    pub async fn user(&self, username: &str, groups: &[&str]) -> (i64, String) {
        let user = self
            .store
            .create_user(NewUser {
                username: username.into(),
                first_name: username.into(),
                ..NewUser::default()
            })
            .await
            .unwrap();
        for group in groups {
            self.store.add_user_to_group(user.id, group).await;
        }
        let token = self.auth.create_token(user.id).unwrap();
        (user.id, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }
}
