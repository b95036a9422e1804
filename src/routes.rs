// src/routes.rs

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, forbidden::forbidden_by_method},
};

/// Monta o roteador completo da API.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas (sem token)
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/classrooms/",
            get(handlers::school::list_classrooms).post(handlers::school::create_classroom),
        )
        .route(
            "/classrooms/{id}/",
            get(handlers::school::get_classroom)
                .put(handlers::school::update_classroom)
                .patch(handlers::school::update_classroom)
                .delete(handlers::school::delete_classroom),
        )
        .route("/grades/", get(handlers::school::list_grades))
        .route("/grades/{id}/", get(handlers::school::get_grade));

    // Rotas protegidas pelo middleware
    let protected_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        // --- CRM ---
        .route(
            "/customers/",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route(
            "/customers/{id}/",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .patch(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        .route(
            "/comissions/",
            get(handlers::crm::list_commissions).post(handlers::crm::create_commission),
        )
        .route(
            "/comissions/{id}/",
            get(handlers::crm::get_commission)
                .put(handlers::crm::update_commission)
                .patch(handlers::crm::update_commission)
                .delete(handlers::crm::delete_commission),
        )
        // --- Filmes ---
        .route(
            "/categories/",
            get(handlers::movies::list_categories).post(handlers::movies::create_category),
        )
        .route(
            "/categories/{id}/",
            get(handlers::movies::get_category)
                .put(handlers::movies::update_category)
                .patch(handlers::movies::update_category)
                .delete(handlers::movies::delete_category),
        )
        .route(
            "/movies/",
            get(handlers::movies::list_movies).post(handlers::movies::create_movie),
        )
        .route("/movies/get_good_movies/", get(handlers::movies::get_good_movies))
        .route(
            "/movies/{id}/",
            get(handlers::movies::get_movie)
                .put(handlers::movies::update_movie)
                .patch(handlers::movies::update_movie)
                .delete(handlers::movies::delete_movie),
        )
        // --- Escola ---
        .route(
            "/students/",
            get(handlers::school::list_students).post(handlers::school::create_student),
        )
        .route("/students/all_students/", get(handlers::school::all_students))
        .route(
            "/students/{id}/",
            get(handlers::school::get_student)
                .put(handlers::school::update_student)
                .patch(handlers::school::update_student)
                .delete(handlers::school::delete_student),
        )
        .route(
            "/classes/",
            get(handlers::school::list_classes).post(handlers::school::create_class),
        )
        .route(
            "/classes/{id}/",
            get(handlers::school::get_class)
                .put(handlers::school::update_class)
                .patch(handlers::school::update_class)
                .delete(handlers::school::delete_class),
        )
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    let api_v1 = Router::new().merge(public_routes).merge(protected_routes);

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(from_fn(forbidden_by_method))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
