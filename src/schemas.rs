use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// JSON body extractor that reports malformed and invalid payloads as `GenericError`.
macro_rules! impl_json_request {
    ($struct_name:ident) => {
        impl actix_web::FromRequest for $struct_name {
            type Error = $crate::errors::GenericError;
            type Future =
                futures_util::future::LocalBoxFuture<'static, Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                payload: &mut actix_http::Payload,
            ) -> Self::Future {
                let fut = <actix_web::web::Json<Self> as actix_web::FromRequest>::from_request(
                    req, payload,
                );

                Box::pin(async move {
                    let body = match fut.await {
                        Ok(json) => json.into_inner(),
                        Err(e) => {
                            return Err($crate::errors::GenericError::ValidationError(
                                e.to_string(),
                            ))
                        }
                    };
                    validator::Validate::validate(&body)
                        .map_err($crate::errors::GenericError::FieldValidationError)?;
                    Ok(body)
                })
            }
        }
    };
}
pub(crate) use impl_json_request;

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct GenericResponse<D> {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<D> GenericResponse<D> {
    pub fn success(message: &str, data: Option<D>) -> Self {
        Self {
            success: true,
            message: String::from(message),
            code: String::from("200"),
            data,
            error: None,
        }
    }

    pub fn error(message: &str, code: &str, data: Option<D>) -> Self {
        Self {
            success: false,
            message: String::from(message),
            code: String::from(code),
            data,
            error: None,
        }
    }

    pub fn with_error_detail(mut self, detail: String) -> Self {
        self.error = Some(detail);
        self
    }
}

/// Documentation shape of a response without a payload.
#[derive(Serialize, Debug, ToSchema)]
pub struct EmptyGenericResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JWTClaims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps externally supplied values: page >= 1, 1 <= limit <= MAX_PAGE_LIMIT.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);
        Self { page, limit }
    }

    /// Saturates for page numbers past the addressable range; such pages are simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page_request: PageRequest) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + page_request.limit - 1) / page_request.limit
        };
        Self {
            total,
            page: page_request.page,
            limit: page_request.limit,
            pages,
        }
    }
}
