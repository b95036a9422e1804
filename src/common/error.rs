// src/common/error.rs

use std::collections::BTreeMap;

use std::error::Error as _;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Motivo de uma recusa 403, anexado às extensões da resposta para que o
/// middleware `forbidden_by_method` possa reescrever a mensagem pelo verbo.
#[derive(Debug, Clone)]
pub struct Forbidden(pub String);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // Erros de validação montados à mão (campos aninhados, regras de negócio)
    #[error("Erro de validação: {0:?}")]
    FieldErrors(BTreeMap<String, Vec<String>>),

    // Corpo que nem chega a virar o payload (JSON inválido, campo ausente, tipo errado)
    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Permissão negada: {0}")]
    PermissionDenied(String),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação de um único campo.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        AppError::FieldErrors(errors)
    }

    pub fn permission_denied(reason: &str) -> Self {
        AppError::PermissionDenied(reason.to_string())
    }
}

// Achata os erros do validator (inclusive structs aninhadas) em "campo" -> mensagens.
// Campos aninhados viram "user.email".
fn flatten_validation_errors(
    prefix: Option<&str>,
    errors: &ValidationErrors,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let key = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                });
                out.entry(key).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(Some(&key), nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let item_key = format!("{}[{}]", key, index);
                    flatten_validation_errors(Some(&item_key), nested, out);
                }
            }
        }
    }
}

const REQUIRED: &str = "Este campo é obrigatório.";

// "user: missing field `username` at line 1 column 30" -> ("user.username", REQUIRED)
// "percentage: invalid type: string \"x\"..."          -> ("percentage", mensagem)
fn rejection_detail(message: &str) -> (String, String) {
    let (path, inner) = match message.split_once(": ") {
        Some((path, rest)) if !path.is_empty() && !path.contains(' ') => (Some(path), rest),
        _ => (None, message),
    };

    let missing = inner
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());

    match (path, missing) {
        (Some(path), Some(field)) => (format!("{}.{}", path, field), REQUIRED.to_string()),
        (None, Some(field)) => (field.to_string(), REQUIRED.to_string()),
        (Some(path), None) => (path.to_string(), inner.to_string()),
        (None, None) => ("non_field_errors".to_string(), inner.to_string()),
    }
}

fn rejection_details(rejection: &JsonRejection) -> BTreeMap<String, Vec<String>> {
    let message = match rejection {
        JsonRejection::JsonDataError(e) => e
            .source()
            .map(ToString::to_string)
            .unwrap_or_else(|| e.body_text()),
        other => other.body_text(),
    };
    // body_text() vem prefixado com "Failed to deserialize ... target type: "
    let message = message
        .split_once("target type: ")
        .map_or(message.as_str(), |(_, rest)| rest);
    let (field, message) = rejection_detail(message);

    let mut details = BTreeMap::new();
    details.insert(field, vec![message]);
    details
}

fn validation_response(details: BTreeMap<String, Vec<String>>) -> Response {
    let body = Json(json!({
        "error": "Um ou mais campos são inválidos.",
        "details": details,
    }));
    (StatusCode::BAD_REQUEST, body).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = BTreeMap::new();
                flatten_validation_errors(None, &errors, &mut details);
                return validation_response(details);
            }
            AppError::FieldErrors(details) => return validation_response(details),
            AppError::InvalidBody(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "Corpo rejeitado");
                return validation_response(rejection_details(&rejection));
            }
            AppError::PermissionDenied(reason) => {
                let mut response =
                    (StatusCode::FORBIDDEN, Json(json!({ "message": reason }))).into_response();
                response.extensions_mut().insert(Forbidden(reason));
                return response;
            }
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} não encontrado.", what)),
            AppError::UsernameAlreadyExists => (
                StatusCode::CONFLICT,
                "Este nome de usuário já está em uso.".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Usuário ou senha inválidos.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Todos os outros erros viram 500; o detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Inner {
        #[validate(email(message = "E-mail inválido."))]
        email: String,
    }

    #[derive(Debug, Validate)]
    struct Outer {
        #[validate(length(min = 1, message = "Obrigatório."))]
        name: String,
        #[validate(nested)]
        user: Inner,
    }

    #[test]
    fn nested_validation_errors_are_prefixed() {
        let payload = Outer {
            name: String::new(),
            user: Inner { email: "nope".into() },
        };
        let errors = payload.validate().unwrap_err();

        let mut details = BTreeMap::new();
        flatten_validation_errors(None, &errors, &mut details);

        assert_eq!(details["name"], vec!["Obrigatório.".to_string()]);
        assert_eq!(details["user.email"], vec!["E-mail inválido.".to_string()]);
    }

    #[test]
    fn rejection_messages_are_keyed_by_field() {
        assert_eq!(
            rejection_detail("missing field `group` at line 1 column 2"),
            ("group".to_string(), REQUIRED.to_string())
        );
        assert_eq!(
            rejection_detail("category: missing field `title` at line 1 column 40"),
            ("category.title".to_string(), REQUIRED.to_string())
        );
        assert_eq!(
            rejection_detail("user: data did not match any variant of untagged enum UserRef"),
            (
                "user".to_string(),
                "data did not match any variant of untagged enum UserRef".to_string()
            )
        );
        assert_eq!(
            rejection_detail("EOF while parsing a value at line 1 column 0"),
            (
                "non_field_errors".to_string(),
                "EOF while parsing a value at line 1 column 0".to_string()
            )
        );
    }

    #[test]
    fn permission_denied_carries_reason_extension() {
        let response = AppError::permission_denied("sem acesso").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let reason = response.extensions().get::<Forbidden>().cloned();
        assert_eq!(reason.map(|f| f.0), Some("sem acesso".to_string()));
    }
}
