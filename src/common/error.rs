// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // Regras do motor de estoque / dívida
    #[error("Estoque insuficiente de '{product}'. Saldo: {available}")]
    InsufficientStock { product: String, available: i32 },

    #[error("Pagamento ({amount}) maior que a dívida do cliente ({debt})")]
    PaymentExceedsDebt { amount: Decimal, debt: Decimal },

    #[error("Estoque ficaria negativo: {0}")]
    NegativeStock(String),

    #[error("Conflito: {0}")]
    UniqueConstraintViolation(String),

    #[error("Registro em uso: {0}")]
    ReferencedRecord(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Arquivo CSV inválido: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Falha ao gerar documento: {0}")]
    DocumentError(String),
}

impl AppError {
    /// Converte erros de constraint do Postgres em erros de negócio.
    pub fn from_db(e: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::UniqueConstraintViolation(context.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::ReferencedRecord(context.to_string());
            }
        }
        e.into()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InsufficientStock { .. }
            | AppError::PaymentExceedsDebt { .. }
            | AppError::NegativeStock(_)
            | AppError::CsvError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_) | AppError::ReferencedRecord(_) => {
                StatusCode::CONFLICT
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::DocumentError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// O corpo JSON devolvido ao cliente
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = err.status_code();

        match err {
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
                    error: "Um ou mais campos são inválidos.".into(),
                    details: Some(details),
                }
            }
            // Erros 500 são logados com detalhe, mas mascarados na resposta.
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = ?e, "Erro Interno do Servidor: {}", e);
                ApiError {
                    status,
                    error: "Ocorreu um erro inesperado.".into(),
                    details: None,
                }
            }
            e => ApiError {
                status,
                error: e.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn business_rule_errors_are_bad_requests() {
        let err = AppError::InsufficientStock { product: "Eshik".into(), available: 2 };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Estoque insuficiente de 'Eshik'. Saldo: 2");

        let err = AppError::PaymentExceedsDebt { amount: dec("150.00"), debt: dec("100.00") };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("150.00"));
    }

    #[test]
    fn internal_errors_are_masked() {
        let api: ApiError = AppError::DocumentError("fonte ausente".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
    }

    #[test]
    fn not_found_keeps_entity_name() {
        let api: ApiError = AppError::NotFound("Produto").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Produto não encontrado");
    }
}
