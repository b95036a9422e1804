// src/handlers/movies.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{error::AppError, payload::JsonPayload},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::movie::{Category, CategoryPayload, MovieCreatePayload, MovieUpdatePayload, MovieView},
};

// =============================================================================
//  ÁREA 1: FILMES
// =============================================================================

// GET /api/v1/movies/
#[utoipa::path(
    get,
    path = "/api/v1/movies/",
    tag = "Movies",
    responses(
        (status = 200, description = "Todos os filmes", body = Vec<MovieView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movies(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let movies = app_state.movie_service.list_movies().await?;
    Ok((StatusCode::OK, Json(movies)))
}

// GET /api/v1/movies/get_good_movies/
#[utoipa::path(
    get,
    path = "/api/v1/movies/get_good_movies/",
    tag = "Movies",
    responses(
        (status = 200, description = "Filmes com nota 4 ou mais", body = Vec<MovieView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_good_movies(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let movies = app_state.movie_service.good_movies().await?;
    Ok((StatusCode::OK, Json(movies)))
}

// GET /api/v1/movies/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/movies/{id}/",
    tag = "Movies",
    params(("id" = i64, Path, description = "ID do filme")),
    responses(
        (status = 200, description = "Filme", body = MovieView),
        (status = 403, description = "Filme não permitido para o perfil Infantil"),
        (status = 404, description = "Filme não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_movie(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let movie = app_state.movie_service.get_movie(&principal, id).await?;
    Ok((StatusCode::OK, Json(movie)))
}

// POST /api/v1/movies/
#[utoipa::path(
    post,
    path = "/api/v1/movies/",
    tag = "Movies",
    request_body = MovieCreatePayload,
    responses(
        (status = 201, description = "Filme criado", body = MovieView),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_movie(
    State(app_state): State<AppState>,
    JsonPayload(payload): JsonPayload<MovieCreatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let movie = app_state.movie_service.create_movie(payload).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

// PUT/PATCH /api/v1/movies/{id}/
#[utoipa::path(
    patch,
    path = "/api/v1/movies/{id}/",
    tag = "Movies",
    params(("id" = i64, Path, description = "ID do filme")),
    request_body = MovieUpdatePayload,
    responses(
        (status = 200, description = "Filme atualizado", body = MovieView),
        (status = 403, description = "Filme não permitido para o perfil Infantil"),
        (status = 404, description = "Filme não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_movie(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<MovieUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let movie = app_state
        .movie_service
        .update_movie(&principal, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(movie)))
}

// DELETE /api/v1/movies/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/movies/{id}/",
    tag = "Movies",
    params(("id" = i64, Path, description = "ID do filme")),
    responses(
        (status = 403, description = "Nenhum filme pode ser removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_movie(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.movie_service.delete_movie(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: CATEGORIAS
// =============================================================================

// GET /api/v1/categories/
#[utoipa::path(
    get,
    path = "/api/v1/categories/",
    tag = "Movies",
    responses(
        (status = 200, description = "Categorias", body = Vec<Category>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.movie_service.list_categories().await?;
    Ok((StatusCode::OK, Json(categories)))
}

// GET /api/v1/categories/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}/",
    tag = "Movies",
    params(("id" = i64, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria", body = Category),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = app_state.movie_service.get_category(id).await?;
    Ok((StatusCode::OK, Json(category)))
}

// POST /api/v1/categories/
#[utoipa::path(
    post,
    path = "/api/v1/categories/",
    tag = "Movies",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    JsonPayload(payload): JsonPayload<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state.movie_service.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// PUT/PATCH /api/v1/categories/{id}/
#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}/",
    tag = "Movies",
    params(("id" = i64, Path, description = "ID da categoria")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = Category),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state.movie_service.update_category(id, payload).await?;
    Ok((StatusCode::OK, Json(category)))
}

// DELETE /api/v1/categories/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}/",
    tag = "Movies",
    params(("id" = i64, Path, description = "ID da categoria")),
    responses(
        (status = 204, description = "Categoria removida"),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.movie_service.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
