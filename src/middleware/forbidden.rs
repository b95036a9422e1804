// src/middleware/forbidden.rs

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::common::error::Forbidden;

/// Frase da recusa de acordo com o verbo da requisição.
pub fn verb_message(method: &Method) -> Option<&'static str> {
    match *method {
        Method::POST => Some("Você não tem permissão para Adicionar."),
        Method::PUT | Method::PATCH => Some("Você não tem permissão para Editar."),
        Method::DELETE => Some("Você não tem permissão para Deletar."),
        _ => None,
    }
}

/// Reescreve o corpo das respostas 403 pelo verbo:
/// `{"message": <frase do verbo>, "detail": <motivo>}`.
/// Nos demais verbos o motivo continua em `message`.
pub async fn forbidden_by_method(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;

    if response.status() != StatusCode::FORBIDDEN {
        return response;
    }

    let (Some(message), Some(Forbidden(reason))) =
        (verb_message(&method), response.extensions().get::<Forbidden>().cloned())
    else {
        return response;
    };

    let mut rewritten = (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": message, "detail": reason })),
    )
        .into_response();
    rewritten.extensions_mut().insert(Forbidden(reason));
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_map_to_sentences() {
        assert_eq!(verb_message(&Method::POST), Some("Você não tem permissão para Adicionar."));
        assert_eq!(verb_message(&Method::PATCH), verb_message(&Method::PUT));
        assert_eq!(verb_message(&Method::DELETE), Some("Você não tem permissão para Deletar."));
        assert_eq!(verb_message(&Method::GET), None);
    }
}
