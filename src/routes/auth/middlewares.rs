use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;

use super::schemas::UserAccount;
use crate::configuration::JWTSettings;
use crate::errors::GenericError;
use crate::repository::Repository;
use crate::utils::{decode_token, get_bearer_token};

pub struct AuthMiddleware<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<actix_web::body::BoxBody>, Error = Error>
        + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match get_bearer_token(&req) {
            Some(token) => token,
            None => {
                let (request, _pl) = req.into_parts();
                let json_error =
                    GenericError::Unauthorized("Authorization token is missing".to_string());
                return Box::pin(async { Ok(ServiceResponse::from_err(json_error, request)) });
            }
        };

        let user_id = match req.app_data::<web::Data<JWTSettings>>() {
            Some(jwt) => decode_token(token, &jwt.secret),
            None => {
                let (request, _pl) = req.into_parts();
                let json_error =
                    GenericError::UnexpectedCustomError("JWT settings are missing".to_string());
                return Box::pin(async { Ok(ServiceResponse::from_err(json_error, request)) });
            }
        };
        let user_id = match user_id {
            Ok(id) => id,
            Err(e) => {
                let (request, _pl) = req.into_parts();
                let json_error = GenericError::InvalidJWT(e.to_string());
                return Box::pin(async { Ok(ServiceResponse::from_err(json_error, request)) });
            }
        };

        let srv = Rc::clone(&self.service);
        Box::pin(async move {
            let repository = req
                .app_data::<web::Data<dyn Repository>>()
                .ok_or_else(|| {
                    GenericError::UnexpectedCustomError("Repository is missing".to_string())
                })?
                .clone();
            let user = repository
                .find_user_by_id(user_id)
                .await
                .map_err(GenericError::from)?;
            let user = match user {
                Some(user) => user,
                None => {
                    let (request, _pl) = req.into_parts();
                    let json_error =
                        GenericError::Unauthorized("User account not found".to_string());
                    return Ok(ServiceResponse::from_err(json_error, request));
                }
            };

            req.extensions_mut().insert::<UserAccount>(UserAccount::from(user));

            let res = srv.call(req).await?;
            Ok(res)
        })
    }
}

/// Middleware factory for requiring authentication.
pub struct RequireAuth;

impl<S> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<actix_web::body::BoxBody>, Error = Error>
        + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

impl FromRequest for UserAccount {
    type Error = GenericError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let value = req.extensions().get::<UserAccount>().cloned();
        let result = match value {
            Some(user) => Ok(user),
            None => Err(GenericError::Unauthorized(
                "Authorization token is missing".to_string(),
            )),
        };
        ready(result)
    }
}
