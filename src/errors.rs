use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use validator::ValidationErrors;

use crate::configuration::runtime_environment;
use crate::schemas::GenericResponse;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum CustomJWTTokenError {
    #[error("Token expired")]
    Expired,
    #[error("{0}")]
    Invalid(String),
}

impl std::fmt::Debug for CustomJWTTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[allow(clippy::enum_variant_names)]
#[derive(thiserror::Error)]
pub enum GenericError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Validation failed")]
    FieldValidationError(ValidationErrors),
    #[error("{0}")]
    InvalidJWT(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    DuplicateError(String),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
    #[error("{0}")]
    ExternalServiceError(String, anyhow::Error),
    #[error("{0}")]
    UnexpectedCustomError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for GenericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Request bodies are camelCase; report field errors under the same keys.
fn camel_case(field: &str) -> String {
    let mut output = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = !output.is_empty();
        } else if upper_next {
            output.extend(c.to_uppercase());
            upper_next = false;
        } else {
            output.push(c);
        }
    }
    output
}

fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            (camel_case(&field), messages)
        })
        .collect()
}

impl ResponseError for GenericError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenericError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GenericError::FieldValidationError(_) => StatusCode::BAD_REQUEST,
            GenericError::InvalidJWT(_) => StatusCode::UNAUTHORIZED,
            GenericError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GenericError::NotFound(_) => StatusCode::NOT_FOUND,
            GenericError::DuplicateError(_) => StatusCode::BAD_REQUEST,
            GenericError::DatabaseError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::ExternalServiceError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::UnexpectedCustomError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        if let GenericError::FieldValidationError(errors) = self {
            return HttpResponse::build(status_code).json(GenericResponse::error(
                "Validation failed",
                status_code_str,
                Some(field_errors(errors)),
            ));
        }

        let inner_error_msg = match self {
            GenericError::ValidationError(message)
            | GenericError::InvalidJWT(message)
            | GenericError::Unauthorized(message)
            | GenericError::NotFound(message)
            | GenericError::DuplicateError(message)
            | GenericError::DatabaseError(message, _)
            | GenericError::ExternalServiceError(message, _)
            | GenericError::UnexpectedCustomError(message) => message.to_string(),
            GenericError::UnexpectedError(_) => "Internal Server Error".to_string(),
            GenericError::FieldValidationError(_) => "Validation failed".to_string(),
        };
        let mut response = GenericResponse::<()>::error(&inner_error_msg, status_code_str, None);
        if status_code.is_server_error() && !runtime_environment().is_production() {
            response = response.with_error_detail(format!("{:?}", self));
        }

        HttpResponse::build(status_code).json(response)
    }
}
