use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures a request can end in. The `Display` text of each variant is the
/// user-facing `errorMessage`; underlying driver errors are logged where they
/// are mapped and never reach the response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Descrição já existe! Altere para outra.")]
    DuplicateDescription,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Internal(&'static str),
    #[error("Token é necessário para verificação.")]
    MissingToken,
    #[error("Token expirado/inválido.")]
    InvalidOrExpiredToken,
    #[error("Falha ao fazer seeder.")]
    SeedFailure,
    #[error("Usuário não encontrado.")]
    UserNotFound,
    #[error("Credenciais inválidas.")]
    InvalidCredentials,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateDescription
            | AppError::MissingToken
            | AppError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            AppError::NotFound(_)
            | AppError::SeedFailure
            | AppError::UserNotFound
            | AppError::InvalidCredentials => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
