use actix_web::web;

use super::errors::AuthError;
use super::schemas::{
    AuthData, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UserAccount,
};
use super::utils::{
    authenticate_user, get_auth_data, register_user, request_password_reset, reset_password,
    send_welcome_email,
};
use crate::configuration::{ApplicationSettings, JWTSettings};
use crate::email_client::GenericEmailService;
use crate::repository::Repository;
use crate::schemas::{EmptyGenericResponse, GenericResponse};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body(content = RegisterRequest, description = "Request Body"),
    responses(
        (status=200, description= "Account created successfully", body= GenericResponse<AuthData>),
        (status=400, description= "Validation failed or user already exists", body= EmptyGenericResponse),
    )
)]
#[tracing::instrument(
    err,
    name = "User Account Registration API",
    skip(repository, email_client, jwt, body),
    fields(user_id)
)]
pub async fn register(
    body: RegisterRequest,
    repository: web::Data<dyn Repository>,
    email_client: web::Data<dyn GenericEmailService>,
    jwt: web::Data<JWTSettings>,
) -> Result<web::Json<GenericResponse<AuthData>>, AuthError> {
    let user = register_user(repository.get_ref(), body).await?;
    tracing::Span::current().record("user_id", tracing::field::display(&user.id));

    let welcome_user = user.clone();
    actix_web::rt::spawn(async move {
        send_welcome_email(email_client.get_ref(), &welcome_user).await;
    });

    let auth_data = get_auth_data(user, &jwt)?;
    Ok(web::Json(GenericResponse::success(
        "User registered successfully",
        Some(auth_data),
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body(content = LoginRequest, description = "Request Body"),
    responses(
        (status=200, description= "Authenticated", body= GenericResponse<AuthData>),
        (status=401, description= "Invalid credentials", body= EmptyGenericResponse),
    )
)]
#[tracing::instrument(err, name = "Authenticate User", skip(repository, jwt, body))]
pub async fn login(
    body: LoginRequest,
    repository: web::Data<dyn Repository>,
    jwt: web::Data<JWTSettings>,
) -> Result<web::Json<GenericResponse<AuthData>>, AuthError> {
    let user = authenticate_user(repository.get_ref(), body).await?;
    let auth_data = get_auth_data(user, &jwt)?;
    Ok(web::Json(GenericResponse::success(
        "Login successful",
        Some(auth_data),
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body(content = ForgotPasswordRequest, description = "Request Body"),
    responses(
        (status=200, description= "Reset instructions sent when the account exists", body= EmptyGenericResponse),
    )
)]
#[tracing::instrument(
    err,
    name = "Forgot Password API",
    skip(repository, email_client, application, body)
)]
pub async fn forgot_password(
    body: ForgotPasswordRequest,
    repository: web::Data<dyn Repository>,
    email_client: web::Data<dyn GenericEmailService>,
    application: web::Data<ApplicationSettings>,
) -> Result<web::Json<GenericResponse<()>>, AuthError> {
    request_password_reset(
        repository.get_ref(),
        email_client.get_ref(),
        &application.frontend_url,
        body,
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "If an account with that email exists, a password reset link has been sent",
        None,
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body(content = ResetPasswordRequest, description = "Request Body"),
    responses(
        (status=200, description= "Password updated", body= EmptyGenericResponse),
        (status=400, description= "Invalid or expired token", body= EmptyGenericResponse),
    )
)]
#[tracing::instrument(err, name = "Reset Password API", skip(repository, body))]
pub async fn reset_password_handler(
    body: ResetPasswordRequest,
    repository: web::Data<dyn Repository>,
) -> Result<web::Json<GenericResponse<()>>, AuthError> {
    reset_password(repository.get_ref(), body).await?;
    Ok(web::Json(GenericResponse::success(
        "Password has been reset successfully",
        None,
    )))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    responses(
        (status=200, description= "Current user", body= GenericResponse<UserAccount>),
        (status=401, description= "Missing or invalid token", body= EmptyGenericResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "Fetch Profile API", skip(user), fields(user_id = %user.id))]
pub async fn profile(user: UserAccount) -> web::Json<GenericResponse<UserAccount>> {
    web::Json(GenericResponse::success(
        "Profile fetched successfully",
        Some(user),
    ))
}
