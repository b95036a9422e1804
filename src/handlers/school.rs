// src/handlers/school.rs

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
    models::school::{
        Class, ClassAddPayload, ClassUpdatePayload, ClassroomPatch, ClassroomPayload, ClassroomView,
        Grade, Student, StudentPayload, StudentRegistration, StudentUpdatePayload,
    },
};

// =============================================================================
//  ÁREA 1: ALUNOS
// =============================================================================

// GET /api/v1/students/
#[utoipa::path(
    get,
    path = "/api/v1/students/",
    tag = "School",
    responses((status = 200, description = "Alunos", body = Vec<Student>)),
    security(("api_jwt" = []))
)]
pub async fn list_students(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = app_state.school_service.list_students().await?;
    Ok((StatusCode::OK, Json(students)))
}

// GET /api/v1/students/all_students/
#[utoipa::path(
    get,
    path = "/api/v1/students/all_students/",
    tag = "School",
    responses(
        (status = 200, description = "Matrículas com 7 dígitos e nome completo", body = Vec<StudentRegistration>)
    ),
    security(("api_jwt" = []))
)]
pub async fn all_students(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = app_state.school_service.all_students().await?;
    Ok((StatusCode::OK, Json(students)))
}

// GET /api/v1/students/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID do aluno")),
    responses(
        (status = 200, description = "Aluno", body = Student),
        (status = 404, description = "Aluno não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_student(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = app_state.school_service.get_student(id).await?;
    Ok((StatusCode::OK, Json(student)))
}

// POST /api/v1/students/
#[utoipa::path(
    post,
    path = "/api/v1/students/",
    tag = "School",
    request_body = StudentPayload,
    responses(
        (status = 201, description = "Aluno criado", body = Student),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_student(
    State(app_state): State<AppState>,
    JsonPayload(payload): JsonPayload<StudentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = app_state.school_service.create_student(payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

// PUT/PATCH /api/v1/students/{id}/ (só o nome muda)
#[utoipa::path(
    patch,
    path = "/api/v1/students/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID do aluno")),
    request_body = StudentUpdatePayload,
    responses(
        (status = 200, description = "Aluno atualizado", body = Student),
        (status = 404, description = "Aluno não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_student(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<StudentUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = app_state.school_service.update_student(id, payload).await?;
    Ok((StatusCode::OK, Json(student)))
}

// DELETE /api/v1/students/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID do aluno")),
    responses(
        (status = 204, description = "Aluno removido"),
        (status = 404, description = "Aluno não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_student(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.school_service.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: SALAS (acesso anônimo)
// =============================================================================

// GET /api/v1/classrooms/
#[utoipa::path(
    get,
    path = "/api/v1/classrooms/",
    tag = "School",
    responses((status = 200, description = "Salas com seus alunos", body = Vec<ClassroomView>))
)]
pub async fn list_classrooms(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let classrooms = app_state.school_service.list_classrooms().await?;
    Ok((StatusCode::OK, Json(classrooms)))
}

// GET /api/v1/classrooms/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/classrooms/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala", body = ClassroomView),
        (status = 404, description = "Sala não encontrada")
    )
)]
pub async fn get_classroom(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let classroom = app_state.school_service.get_classroom(id).await?;
    Ok((StatusCode::OK, Json(classroom)))
}

// POST /api/v1/classrooms/
#[utoipa::path(
    post,
    path = "/api/v1/classrooms/",
    tag = "School",
    request_body = ClassroomPayload,
    responses(
        (status = 201, description = "Sala criada", body = ClassroomView),
        (status = 400, description = "Dados inválidos ou aluno inexistente")
    )
)]
pub async fn create_classroom(
    State(app_state): State<AppState>,
    JsonPayload(payload): JsonPayload<ClassroomPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let classroom = app_state.school_service.create_classroom(payload).await?;
    Ok((StatusCode::CREATED, Json(classroom)))
}

// PUT/PATCH /api/v1/classrooms/{id}/
#[utoipa::path(
    patch,
    path = "/api/v1/classrooms/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da sala")),
    request_body = ClassroomPatch,
    responses(
        (status = 200, description = "Sala atualizada", body = ClassroomView),
        (status = 404, description = "Sala não encontrada")
    )
)]
pub async fn update_classroom(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<ClassroomPatch>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let classroom = app_state.school_service.update_classroom(id, payload).await?;
    Ok((StatusCode::OK, Json(classroom)))
}

// DELETE /api/v1/classrooms/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/classrooms/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da sala")),
    responses(
        (status = 204, description = "Sala removida"),
        (status = 404, description = "Sala não encontrada")
    )
)]
pub async fn delete_classroom(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.school_service.delete_classroom(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 3: NOTAS (somente leitura, acesso anônimo)
// =============================================================================

// GET /api/v1/grades/
#[utoipa::path(
    get,
    path = "/api/v1/grades/",
    tag = "School",
    responses((status = 200, description = "Notas", body = Vec<Grade>))
)]
pub async fn list_grades(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let grades = app_state.school_service.list_grades().await?;
    Ok((StatusCode::OK, Json(grades)))
}

// GET /api/v1/grades/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/grades/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "Nota", body = Grade),
        (status = 404, description = "Nota não encontrada")
    )
)]
pub async fn get_grade(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let grade = app_state.school_service.get_grade(id).await?;
    Ok((StatusCode::OK, Json(grade)))
}

// =============================================================================
//  ÁREA 4: AULAS (escopo do professor)
// =============================================================================

// GET /api/v1/classes/
#[utoipa::path(
    get,
    path = "/api/v1/classes/",
    tag = "School",
    responses((status = 200, description = "Aulas do professor logado", body = Vec<Class>)),
    security(("api_jwt" = []))
)]
pub async fn list_classes(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let classes = app_state.school_service.list_classes(&principal).await?;
    Ok((StatusCode::OK, Json(classes)))
}

// GET /api/v1/classes/{id}/
#[utoipa::path(
    get,
    path = "/api/v1/classes/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da aula")),
    responses(
        (status = 200, description = "Aula", body = Class),
        (status = 404, description = "Aula não encontrada ou de outro professor")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_class(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let class = app_state.school_service.get_class(&principal, id).await?;
    Ok((StatusCode::OK, Json(class)))
}

// POST /api/v1/classes/
#[utoipa::path(
    post,
    path = "/api/v1/classes/",
    tag = "School",
    request_body = ClassAddPayload,
    responses(
        (status = 201, description = "Aula criada para o professor logado", body = Class),
        (status = 400, description = "Sala inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_class(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    JsonPayload(payload): JsonPayload<ClassAddPayload>,
) -> Result<impl IntoResponse, AppError> {
    let class = app_state.school_service.create_class(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

// PUT/PATCH /api/v1/classes/{id}/
#[utoipa::path(
    patch,
    path = "/api/v1/classes/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da aula")),
    request_body = ClassUpdatePayload,
    responses(
        (status = 200, description = "Aula atualizada", body = Class),
        (status = 400, description = "Professor inexistente"),
        (status = 403, description = "Professor diferente do usuário logado"),
        (status = 404, description = "Aula não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_class(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
    JsonPayload(payload): JsonPayload<ClassUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let class = app_state
        .school_service
        .update_class(&principal, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(class)))
}

// DELETE /api/v1/classes/{id}/
#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}/",
    tag = "School",
    params(("id" = i64, Path, description = "ID da aula")),
    responses(
        (status = 403, description = "Nenhuma aula pode ser removida"),
        (status = 404, description = "Aula não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_class(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.school_service.delete_class(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
