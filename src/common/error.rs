// src/common/error.rs

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Nosso tipo de erro de domínio. Os serviços só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação que não pertence a um campo específico (janela de horário, datas...)
    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    // Cadeira ocupada, nome de serviço repetido, corrida perdida na criação...
    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Estado inválido: {0}")]
    InvalidState(String),

    #[error("Acesso negado")]
    Forbidden,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que efetivamente sai pela API (já traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Chave de tradução e status HTTP de cada variante.
    fn key_and_status(&self) -> (&'static str, StatusCode) {
        match self {
            AppError::ValidationError(_) => ("validation", StatusCode::BAD_REQUEST),
            AppError::InvalidInput(_) => ("invalid_input", StatusCode::BAD_REQUEST),
            AppError::ResourceNotFound(_) => ("not_found", StatusCode::NOT_FOUND),
            AppError::Conflict(_) => ("conflict", StatusCode::CONFLICT),
            AppError::InvalidState(_) => ("invalid_state", StatusCode::CONFLICT),
            AppError::Forbidden => ("forbidden", StatusCode::FORBIDDEN),
            AppError::EmailAlreadyExists => ("email_exists", StatusCode::CONFLICT),
            AppError::InvalidCredentials => ("invalid_credentials", StatusCode::UNAUTHORIZED),
            AppError::InvalidToken => ("invalid_token", StatusCode::UNAUTHORIZED),
            AppError::UserNotFound => ("user_not_found", StatusCode::NOT_FOUND),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ("internal", StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (key, status) = self.key_and_status();
        let message = store.translate(&locale.0, key);

        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    error: message.to_string(),
                    details: Some(json!(details)),
                }
            }
            AppError::InvalidInput(detail)
            | AppError::ResourceNotFound(detail)
            | AppError::Conflict(detail)
            | AppError::InvalidState(detail) => ApiError {
                status,
                error: format!("{}: {}", message, detail),
                details: None,
            },
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // O detalhe fica só no log.
                tracing::error!("Erro Interno do Servidor: {}", e);
                ApiError { status, error: message.to_string(), details: None }
            }
            _ => ApiError { status, error: message.to_string(), details: None },
        }
    }
}

static DEFAULT_STORE: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

// Usado onde não temos o Locale nem o AppState à mão (ex.: middleware de auth).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let locale = Locale(I18nStore::DEFAULT_LANG.to_string());
        self.to_api_error(&locale, &DEFAULT_STORE).into_response()
    }
}
