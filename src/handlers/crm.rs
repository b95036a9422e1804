// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{error::AppError, payload::JsonPayload},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    services::crm_service::CrmService,
    models::crm::{
        Commission, CommissionPatch, CommissionPayload, CustomerCreatePayload, CustomerFilter,
        CustomerUpdatePayload, CustomerView,
    },
};

// =============================================================================
//  ÁREA 1: CLIENTES
// =============================================================================

// GET /api/v1/customers/
#[utoipa::path(
    get,
    path = "/api/v1/customers/",
    tag = "CRM",
    params(CustomerFilter),
    responses(
        (status = 200, description = "Clientes visíveis ao usuário", body = Vec<CustomerView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.crm_service.list_customers(&principal, filter).await?;
    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/v1/customers/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/",
    tag = "CRM",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = CustomerView),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.crm_service.get_customer(&principal, id).await?;
    Ok((StatusCode::OK, Json(customer)))
}

// POST /api/v1/customers/
#[utoipa::path(
    post,
    path = "/api/v1/customers/",
    tag = "CRM",
    request_body = CustomerCreatePayload,
    responses(
        (status = 201, description = "Cliente criado", body = CustomerView),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    JsonPayload(payload): JsonPayload<CustomerCreatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state.crm_service.create_customer(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT/PATCH /api/v1/customers/{id}/ (ambos parciais)
#[utoipa::path(
    patch,
    path = "/api/v1/customers/{id}/",
    tag = "CRM",
    params(("id" = i64, Path, description = "ID do cliente")),
    request_body = CustomerUpdatePayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = CustomerView),
        (status = 403, description = "Cliente de outro vendedor"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<CustomerUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    // A validação acontece no serviço, depois da checagem de dono
    let customer = app_state
        .crm_service
        .update_customer(&principal, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(customer)))
}

// DELETE /api/v1/customers/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}/",
    tag = "CRM",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 403, description = "Cliente de outro vendedor"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.crm_service.delete_customer(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: COMISSÕES
// =============================================================================

// GET /api/v1/comissions/
#[utoipa::path(
    get,
    path = "/api/v1/comissions/",
    tag = "CRM",
    responses(
        (status = 200, description = "Comissões", body = Vec<Commission>),
        (status = 403, description = "Vendedores não acessam comissões")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_commissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let commissions = app_state.crm_service.list_commissions(&principal).await?;
    Ok((StatusCode::OK, Json(commissions)))
}

// GET /api/v1/comissions/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/comissions/{id}/",
    tag = "CRM",
    params(("id" = i64, Path, description = "ID da comissão")),
    responses(
        (status = 200, description = "Comissão", body = Commission),
        (status = 403, description = "Vendedores não acessam comissões"),
        (status = 404, description = "Comissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_commission(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let commission = app_state.crm_service.get_commission(&principal, id).await?;
    Ok((StatusCode::OK, Json(commission)))
}

// POST /api/v1/comissions/
#[utoipa::path(
    post,
    path = "/api/v1/comissions/",
    tag = "CRM",
    request_body = CommissionPayload,
    responses(
        (status = 201, description = "Comissão criada", body = Commission),
        (status = 400, description = "Grupo inexistente ou percentual fora do limite"),
        (status = 403, description = "Vendedores não acessam comissões")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_commission(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    payload: Result<JsonPayload<CommissionPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    // Vendedor é barrado antes mesmo de o corpo ser lido
    CrmService::ensure_not_seller(&principal)?;
    let JsonPayload(payload) = payload?;

    let commission = app_state
        .crm_service
        .create_commission(&principal, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(commission)))
}

// PUT/PATCH /api/v1/comissions/{id}/
#[utoipa::path(
    patch,
    path = "/api/v1/comissions/{id}/",
    tag = "CRM",
    params(("id" = i64, Path, description = "ID da comissão")),
    request_body = CommissionPatch,
    responses(
        (status = 200, description = "Comissão atualizada", body = Commission),
        (status = 403, description = "Vendedores não acessam comissões"),
        (status = 404, description = "Comissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_commission(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
    payload: Result<JsonPayload<CommissionPatch>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    CrmService::ensure_not_seller(&principal)?;
    let JsonPayload(payload) = payload?;

    let commission = app_state
        .crm_service
        .update_commission(&principal, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(commission)))
}

// DELETE /api/v1/comissions/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/comissions/{id}/",
    tag = "CRM",
    params(("id" = i64, Path, description = "ID da comissão")),
    responses(
        (status = 204, description = "Comissão removida"),
        (status = 403, description = "Vendedores não acessam comissões"),
        (status = 404, description = "Comissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_commission(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.crm_service.delete_commission(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
