/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 認証エラー (AuthError) を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    // The credential check itself could not be carried out (misconfigured
    // key, crypto backend failure). Not a client problem.
    #[error("authentication error")]
    AuthUnavailable,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.to_string())
            }
            AppError::AuthUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_ERROR",
                "Authentication error".to_string(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingHeader => AppError::Unauthorized {
                code: "AUTH_HEADER_MISSING",
                message: "Authorization header missing or invalid",
            },
            AuthError::MissingToken => AppError::Unauthorized {
                code: "TOKEN_MISSING",
                message: "Token missing",
            },
            AuthError::InvalidToken(_) => AppError::Unauthorized {
                code: "TOKEN_INVALID",
                message: "Invalid token",
            },
            AuthError::Verification(_) => AppError::AuthUnavailable,
        }
    }
}
