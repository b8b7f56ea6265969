use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::configuration::runtime_environment;
use crate::repository::RepositoryError;
use crate::schemas::GenericResponse;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error("User already exists")]
    DuplicateUser,
    #[error("Invalid or expired token")]
    InvalidResetToken,
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => AuthError::DuplicateUser,
            RepositoryError::Unexpected(error) => {
                AuthError::DatabaseError("Database request failed".to_string(), error)
            }
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateUser => StatusCode::BAD_REQUEST,
            AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AuthError::DatabaseError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        let inner_error_msg = match self {
            AuthError::InvalidCredentials(_)
            | AuthError::DuplicateUser
            | AuthError::InvalidResetToken => self.to_string(),
            AuthError::DatabaseError(message, _) => message.to_string(),
            AuthError::UnexpectedError(_) => "Internal Server Error".to_string(),
        };
        let mut response = GenericResponse::<()>::error(&inner_error_msg, status_code_str, None);
        if status_code.is_server_error() && !runtime_environment().is_production() {
            response = response.with_error_detail(format!("{:?}", self));
        }

        HttpResponse::build(status_code).json(response)
    }
}
