use crate::errors::GenericError;
use crate::repository::RepositoryError;
use crate::utils::error_chain_fmt;

#[allow(clippy::enum_variant_names)]
#[derive(thiserror::Error)]
pub enum PaymentOrderError {
    #[error("Failed to create payment request")]
    GatewayError(#[source] anyhow::Error),
    #[error("Transaction not found")]
    NotFoundError,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
}

impl std::fmt::Debug for PaymentOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<RepositoryError> for PaymentOrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(entity) => PaymentOrderError::DatabaseError(
                "Failed to store order".to_string(),
                anyhow::anyhow!("{} already exists", entity),
            ),
            RepositoryError::Unexpected(error) => {
                PaymentOrderError::DatabaseError("Database request failed".to_string(), error)
            }
        }
    }
}

impl From<PaymentOrderError> for GenericError {
    fn from(err: PaymentOrderError) -> GenericError {
        match err {
            PaymentOrderError::GatewayError(error) => GenericError::ExternalServiceError(
                "Failed to create payment request".to_string(),
                error,
            ),
            PaymentOrderError::NotFoundError => {
                GenericError::NotFound("Transaction not found".to_string())
            }
            PaymentOrderError::UnexpectedError(error) => GenericError::UnexpectedError(error),
            PaymentOrderError::DatabaseError(message, error) => {
                GenericError::DatabaseError(message, error)
            }
        }
    }
}
